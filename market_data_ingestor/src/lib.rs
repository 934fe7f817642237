//! Market data access: request vocabulary, provider-native frames, and providers.

pub mod models;
pub mod providers;
