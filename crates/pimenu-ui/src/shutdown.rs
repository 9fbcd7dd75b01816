//! Process-level termination signals.
//!
//! The menu loop is synchronous, so SIGINT/SIGTERM are observed on a helper
//! thread driving a small current-thread runtime. The loop polls the returned
//! flag once per tick.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use anyhow::{Context, Result};
use tokio::runtime::Builder;
use tokio::signal::unix::{signal, SignalKind};
use tracing::info;

pub fn spawn_signal_watcher() -> Result<Arc<AtomicBool>> {
    let runtime = Builder::new_current_thread()
        .enable_io()
        .build()
        .context("building signal runtime")?;

    // Handlers are installed before returning so an early signal is not lost.
    let (mut sigterm, mut sigint) = {
        let _entered = runtime.enter();
        let sigterm = signal(SignalKind::terminate()).context("registering SIGTERM handler")?;
        let sigint = signal(SignalKind::interrupt()).context("registering SIGINT handler")?;
        (sigterm, sigint)
    };

    let stop = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&stop);
    thread::Builder::new()
        .name("pimenu-signals".into())
        .spawn(move || {
            runtime.block_on(async {
                tokio::select! {
                    _ = sigterm.recv() => {
                        info!("Received SIGTERM, stopping menu");
                    },
                    _ = sigint.recv() => {
                        info!("Received SIGINT, stopping menu");
                    },
                }
            });
            flag.store(true, Ordering::SeqCst);
        })
        .context("spawning signal thread")?;

    Ok(stop)
}
