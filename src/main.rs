//! subconv entry point: flags → settings → wiring → serve.

use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use subconv::config::{Cli, Settings};
use subconv::http::HttpServer;
use subconv::lifecycle::{signals, Shutdown};
use subconv::observability::logging;
use subconv::resolver::{DnsResolver, LookupHost};
use subconv::subscription::{Converter, PipelineConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    logging::init_logging();

    let settings = match Settings::from_cli(cli) {
        Ok(settings) => settings,
        Err(errors) => {
            for error in &errors {
                tracing::error!(%error, "invalid configuration");
            }
            return Err("configuration validation failed".into());
        }
    };

    tracing::info!(
        listen = %settings.listen,
        resolve = settings.resolve,
        max_document_bytes = settings.max_document_bytes,
        "configuration loaded"
    );

    let client = reqwest::Client::builder()
        .timeout(settings.upstream_timeout)
        .build()?;
    let lookup: Option<Arc<dyn LookupHost>> = settings
        .resolve
        .then(|| Arc::new(DnsResolver::new(settings.dns_server)) as Arc<dyn LookupHost>);
    let converter = Arc::new(Converter::new(
        client,
        lookup,
        PipelineConfig {
            max_document_bytes: settings.max_document_bytes,
        },
    ));

    let listener = TcpListener::bind(&settings.listen).await?;
    tracing::info!(address = %listener.local_addr()?, "listening");

    let shutdown = Shutdown::new();
    signals::install(shutdown.clone())?;

    let server = HttpServer::new(converter, settings.request_timeout);
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("shutdown complete");
    Ok(())
}
