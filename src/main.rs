// blobtail binary - tail decoded log batches to stdout as NDJSON
//
// Window selection comes from the environment (host wiring, not pipeline):
//   BLOBTAIL_START  - RFC 3339 timestamp; defaults to now (tail mode)
//   BLOBTAIL_FINISH - RFC 3339 timestamp; absent means tail until Ctrl-C

use std::pin::pin;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use futures::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::info;

use blobtail::{export_options, init, Exporter, RuntimeConfig, TimeWindow};

fn window_from_env() -> Result<TimeWindow> {
    let start = match std::env::var("BLOBTAIL_START") {
        Ok(raw) => DateTime::parse_from_rfc3339(&raw)
            .with_context(|| format!("Invalid BLOBTAIL_START: {}", raw))?
            .with_timezone(&Utc),
        Err(_) => Utc::now(),
    };

    match std::env::var("BLOBTAIL_FINISH") {
        Ok(raw) => {
            let finish = DateTime::parse_from_rfc3339(&raw)
                .with_context(|| format!("Invalid BLOBTAIL_FINISH: {}", raw))?
                .with_timezone(&Utc);
            Ok(TimeWindow::new(start, finish)?)
        }
        Err(_) => Ok(TimeWindow::tail(start)),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = RuntimeConfig::load()?;
    init::init_tracing(&config);

    let store = init::init_store(&config)?;
    let window = window_from_env()?;
    let exporter = Exporter::new(store).with_options(export_options(&config));

    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Ctrl-C received, finishing current bucket");
            signal_cancel.cancel();
        }
    });

    info!(
        start = %window.start(),
        finish = ?window.finish(),
        "starting export"
    );

    let mut batches = pin!(exporter.device_logs(window, cancel));
    while let Some(batch) = batches.next().await {
        let batch = batch?;
        if batch.value.is_empty() {
            continue;
        }
        println!("{}", serde_json::to_string(&batch)?);
    }

    info!("export complete");
    Ok(())
}
