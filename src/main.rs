use std::env;
use std::io;
use std::process::ExitCode;

use beet_checkout::config::{Config, ConfigError};
use beet_checkout::csv::{CsvError, read_catalog, read_requests, write_confirmations};
use beet_checkout::model::CatalogError;
use beet_checkout::{Catalog, MemoryStore, Storefront};
use thiserror::Error;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{Level, error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Error)]
enum StartupError {
    #[error("usage: beet-checkout <requests.csv>")]
    Usage,
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Csv(#[from] CsvError),
    #[error("invalid catalog: {0}")]
    Catalog(#[from] CatalogError),
}

fn load_catalog(config: &Config) -> Result<Catalog, StartupError> {
    let Some(path) = &config.catalog else {
        return Ok(Catalog::standard());
    };
    let variants = read_catalog(path)?.collect::<Result<Vec<_>, _>>()?;
    let catalog = Catalog::new(variants)?;
    info!(path = %path.display(), variants = catalog.len(), "catalog loaded");
    Ok(catalog)
}

async fn run() -> Result<(), StartupError> {
    let path = env::args().nth(1).ok_or(StartupError::Usage)?;

    if !path.ends_with(".csv") {
        warn!(path, "input file seems to not be a csv file");
    }

    let config = Config::from_env()?;
    let catalog = load_catalog(&config)?;
    let requests = read_requests(path)?;

    let storefront = Storefront::new(catalog, MemoryStore::new()).with_config(&config);
    let (request_sender, request_receiver) = tokio::sync::mpsc::channel(16);

    tokio::spawn(async move {
        for result in requests {
            match result {
                Ok(request) => {
                    if request_sender.send(request).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!("{e}");
                }
            }
        }
    });

    let summary = storefront
        .run(ReceiverStream::new(request_receiver))
        .await;
    info!(
        placed = summary.confirmations.len(),
        rejected = summary.rejected,
        "batch finished"
    );

    write_confirmations(io::stdout().lock(), &summary.confirmations)?;
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::WARN.into()))
        .with_writer(io::stderr)
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
