//! `ccnet-monitor`: connects to a bill validator and logs every poll event.
//!
//! ```text
//! ccnet-monitor [config.toml]
//! ```
//!
//! # Architecture
//!
//! ```text
//! main()
//!  └─ load_config_or_default()      -- port and timing settings
//!  └─ spawn_blocking
//!       ├─ connect + power_up
//!       └─ start_polling            -- runs until stop()
//!  └─ Ctrl-C
//!       └─ stop → power_down → disconnect
//! ```
//!
//! The driver is blocking, so every driver call runs on Tokio's blocking pool.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use ccnet_driver::infrastructure::transport::serial::SerialTransport;
use ccnet_driver::{load_config_or_default, BillValidator, ValidatorEvents};

/// Logs every event at `info`.
struct LoggingEvents;

impl ValidatorEvents for LoggingEvents {
    fn on_cassette_initialize(&mut self) {
        info!("cassette initialised");
    }
    fn on_accept(&mut self) {
        info!("accepting note");
    }
    fn on_escrow_position(&mut self) {
        info!("note in escrow");
    }
    fn on_stack(&mut self) {
        info!("stacking note");
    }
    fn on_bill_stack(&mut self, note_code: u8) {
        info!("note stacked (type 0x{note_code:02X})");
    }
    fn on_return(&mut self) {
        info!("returning note");
    }
    fn on_bill_returned(&mut self) {
        info!("note returned");
    }
    fn on_reject(&mut self) {
        warn!("note rejected");
    }
    fn on_drop_cassette_out_of_position(&mut self) {
        warn!("drop cassette removed");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = std::env::args_os().nth(1).map(PathBuf::from);
    let config = load_config_or_default(config_path.as_deref()).context("loading configuration")?;

    // Level is overridden by `RUST_LOG`.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .init();

    info!("ccnet-monitor starting on {}", config.port.port_name);

    let validator = Arc::new(
        BillValidator::builder(SerialTransport::new())
            .protocol(&config.protocol)
            .build(),
    );

    // ── Bring-up ──────────────────────────────────────────────────────────────
    let setup = Arc::clone(&validator);
    let port = config.port.clone();
    let bring_up = tokio::task::spawn_blocking(move || {
        setup.connect(&port)?;
        setup.power_up()
    })
    .await?;
    if let Err(e) = bring_up {
        error!("bring-up failed: {e}");
        let last_error = validator.last_error();
        let teardown = Arc::clone(&validator);
        tokio::task::spawn_blocking(move || teardown.disconnect()).await??;
        return Err(e).with_context(|| format!("powering up validator (last error {last_error})"));
    }

    // ── Poll loop ─────────────────────────────────────────────────────────────
    let poller = Arc::clone(&validator);
    let mut poll_task =
        tokio::task::spawn_blocking(move || poller.start_polling(&mut LoggingEvents));
    info!("ccnet-monitor ready.  Press Ctrl-C to exit.");

    let finished = tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal.context("listening for Ctrl-C")?;
            None
        }
        result = &mut poll_task => Some(result),
    };

    let poll_result = match finished {
        Some(result) => result?,
        None => {
            info!("shutdown signal received");
            let stopper = Arc::clone(&validator);
            if let Err(e) = tokio::task::spawn_blocking(move || stopper.stop()).await? {
                warn!("validator did not acknowledge stop: {e}");
            }
            poll_task.await?
        }
    };
    if let Err(e) = &poll_result {
        error!("poll loop ended: {e}");
    }

    // ── Teardown ──────────────────────────────────────────────────────────────
    info!("stacked notes: {:02X?}", validator.inserted_banknotes());
    let teardown = Arc::clone(&validator);
    tokio::task::spawn_blocking(move || {
        teardown.power_down()?;
        teardown.disconnect()
    })
    .await??;

    info!("ccnet-monitor stopped");
    poll_result.context("polling validator")
}
