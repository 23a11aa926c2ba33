use std::sync::Arc;

use clap::Parser;
use color_eyre::Result;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::duration::Duration;
use crate::model::{SelectedService, SelectorOption};
use crate::scope::{SharedDuration, SharedScope};
use crate::search::Matcher;
use crate::store::SelectorStore;
use crate::transport::{HttpTransport, QueryOutcome};

mod cli;
mod config;
mod duration;
mod model;
mod query;
mod scope;
mod search;
mod store;
mod transport;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let _guard = initialize_logging()?;
    info!("Starting apmlens");

    let args = cli::Args::parse();

    let mut config = config::load()?;
    if let Some(url) = args.url {
        config.backend.url = url;
    }

    let transport = Arc::new(HttpTransport::new(&config.backend)?);
    let scope = Arc::new(SharedScope::new());
    let duration = Arc::new(SharedDuration::new(Duration::last_minutes(args.minutes)));
    let store = SelectorStore::new(transport, scope.clone(), duration);

    let (envelope, options) = match args.command {
        cli::Command::Services { layer } => {
            let envelope = store.refresh_services(&layer).await?;
            (envelope, store.services())
        }
        cli::Command::Instances { service, fallback } => {
            if let Some(id) = service {
                scope.select(SelectedService::new(id.clone(), id));
            }
            let envelope = store.refresh_instances(&fallback).await?;
            (envelope, store.instances())
        }
    };

    match envelope.outcome() {
        QueryOutcome::Errors(errors) => {
            for error in errors {
                eprintln!("error: {}", error.message);
            }
            std::process::exit(1);
        }
        QueryOutcome::Data(_) => print_options(&options, args.filter.as_deref()),
    }

    Ok(())
}

fn print_options(options: &[SelectorOption], filter: Option<&str>) {
    let options = filter.map_or_else(
        || options.to_vec(),
        |pattern| Matcher::new().filter(options, pattern),
    );
    for option in &options {
        println!("{:<24} {}", option.value, option.label);
    }
}

fn initialize_logging() -> Result<WorkerGuard> {
    let directory = dirs::data_local_dir().map_or_else(
        || std::path::PathBuf::from("logs"),
        |path| path.join("apmlens").join("logs"),
    );
    std::fs::create_dir_all(&directory)?;

    let file_appender = tracing_appender::rolling::daily(&directory, "apmlens.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_file(true)
                .with_line_number(true)
                .with_thread_ids(true),
        )
        .init();

    Ok(guard)
}
