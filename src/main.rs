use std::process::ExitCode;
use std::sync::Arc;

use audify::cache::TtlCache;
use audify::client::AudifyClient;
use audify::config::ServiceConfig;
use audify::error::Result;
use audify::executor::CapturedResponse;
use audify::server::{self, SseOptions};
use audify::service::AudifyService;
use audify::telemetry;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("audify: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    let config = ServiceConfig::from_env()?;
    let _guard = telemetry::init_subscriber(config.telemetry.clone())?;
    tracing::info!(target: "audify::service", version = %config.version.binary, "starting");

    let cache = Arc::new(TtlCache::<CapturedResponse>::new(config.cache.clone()));
    let client = AudifyClient::from_config(&config.client, cache.clone())?;
    let service = Arc::new(
        AudifyService::new(client, config.version.clone())
            .with_search_timeout(config.search_timeout),
    );
    let shutdown = service.shutdown_signal().clone();

    let cleanup = cache.spawn_cleanup(shutdown.token());

    let ctrl_c = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!(target: "audify::service", "interrupt received");
            ctrl_c.trigger();
        }
    });

    let opts = if config.mask_errors {
        SseOptions::production()
    } else {
        SseOptions::development()
    };

    let listener = TcpListener::bind(config.listen_addr).await?;
    let served = server::serve(listener, service, opts).await;

    shutdown.trigger();
    let _ = cleanup.await;
    served
}
