pub mod frame;
pub mod request_params;
pub mod timeframe;
