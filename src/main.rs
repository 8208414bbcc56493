use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use versionwatch::{Args, KafkaApp, Settings};
use versionwatch_adapters::StopToken;

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let settings = Settings::load(&args).context("parse settings failed")?;

    // Build a tokio runtime
    let rt = tokio::runtime::Runtime::new()?;

    info!("app started");
    rt.block_on(async {
        let app = KafkaApp::build(&settings).await?;
        let stop = StopToken::new();
        stop_on_signal(stop.clone());
        app.run(&stop).await
    })
    .context("app failed")?;
    info!("app finished");

    Ok(())
}

/// Stop `stop` on the first SIGINT or SIGTERM.
fn stop_on_signal(stop: StopToken) {
    tokio::spawn(async move {
        tokio::select! {
            _ = wait_for_signal() => {
                info!("signal received => stopping");
                stop.stop();
            }
            _ = stop.stopped() => {}
        }
    });
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = match signal(SignalKind::terminate()) {
        Ok(terminate) => terminate,
        Err(e) => {
            warn!(error = %e, "install SIGTERM handler failed");
            let _ = tokio::signal::ctrl_c().await;
            return;
        }
    };

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = terminate.recv() => {}
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "install ctrl-c handler failed");
        std::future::pending::<()>().await;
    }
}
