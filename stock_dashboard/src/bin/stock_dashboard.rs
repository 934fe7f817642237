use std::io::Write;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use dotenvy::dotenv;
use market_data_ingestor::providers::{DataProvider, yahoo_chart::YahooChartProvider};
use stock_dashboard::{
    cli::{Cli, Command, InteractiveInput, OutputFormat, parse_interactive_line},
    config::DashboardConfig,
    refresh::{Dashboard, RefreshError},
    report,
    request::DashboardRequest,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::subscriber;
use tracing_subscriber::FmtSubscriber;

fn preprocess(cli: &Cli) -> Result<()> {
    dotenv().ok();
    let my_subscriber = FmtSubscriber::builder()
        .with_max_level(cli.log_level())
        .with_writer(std::io::stderr)
        .finish();
    subscriber::set_global_default(my_subscriber)?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    preprocess(&cli)?;

    let config = DashboardConfig::load(cli.config.as_deref()).context("loading config")?;
    let provider = YahooChartProvider::with_config(config.provider_config())?;
    let mut dashboard = Dashboard::new(provider, config.pipeline_options()?);

    match cli.command {
        Command::Show(args) => {
            let request = args.request()?;
            match refresh_once(&mut dashboard, &request, args.format).await? {
                Some(out) => print!("{out}"),
                None => print!("{}", report::render_no_data(request.ticker(), request.period)),
            }
        }
        Command::Interactive { format } => interactive(&mut dashboard, format).await?,
    }
    Ok(())
}

/// `Ok(None)` when the request was valid but matched no bars.
async fn refresh_once<P>(
    dashboard: &mut Dashboard<P>,
    request: &DashboardRequest,
    format: OutputFormat,
) -> Result<Option<String>>
where
    P: DataProvider + Send + Sync,
{
    let view = match dashboard.refresh(request, Utc::now()).await {
        Ok(view) => view,
        Err(e @ RefreshError::EmptyResult { .. }) => {
            tracing::debug!(error = %e, "empty window");
            return Ok(None);
        }
        Err(e) => return Err(e.into()),
    };
    let out = match format {
        OutputFormat::Text => report::render_text(&view),
        OutputFormat::Json => report::render_json(&view)? + "\n",
    };
    Ok(Some(out))
}

async fn interactive<P>(dashboard: &mut Dashboard<P>, format: OutputFormat) -> Result<()>
where
    P: DataProvider + Send + Sync,
{
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let request = match parse_interactive_line(&line) {
            Ok(InteractiveInput::Blank) => continue,
            Ok(InteractiveInput::Quit) => break,
            Ok(InteractiveInput::Refresh(request)) => request,
            Err(e) => {
                println!("error: {e}");
                continue;
            }
        };
        match refresh_once(dashboard, &request, format).await {
            Ok(Some(out)) => print!("{out}"),
            Ok(None) => print!("{}", report::render_no_data(request.ticker(), request.period)),
            Err(e) => println!("error: {e:#}"),
        }
    }
    Ok(())
}
