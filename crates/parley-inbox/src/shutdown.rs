// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Signal handling and bounded shutdown for a running inbox.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::session::InboxSession;

/// Installs handlers for SIGTERM and SIGINT.
///
/// Returns a token that is cancelled when either signal arrives. Pass it to
/// [`InboxBuilder::shutdown_token`](crate::session::InboxBuilder::shutdown_token)
/// so the poll loops stop with the process.
pub fn install_signal_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let token_clone = token.clone();

    tokio::spawn(async move {
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        {
            use tokio::signal::unix::{SignalKind, signal};
            match signal(SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    tokio::select! {
                        _ = ctrl_c => info!("received SIGINT (Ctrl+C), shutting down"),
                        _ = sigterm.recv() => info!("received SIGTERM, shutting down"),
                    }
                }
                Err(e) => {
                    warn!(error = %e, "could not install SIGTERM handler, listening for Ctrl+C only");
                    let _ = ctrl_c.await;
                    info!("received SIGINT (Ctrl+C), shutting down");
                }
            }
        }

        #[cfg(not(unix))]
        {
            let _ = ctrl_c.await;
            info!("received Ctrl+C, shutting down");
        }

        token_clone.cancel();
        debug!("shutdown signal handler completed");
    });

    token
}

/// Stops the session, waiting at most `timeout` for in-flight work.
///
/// Returns `false` if fetches or escalation resolves were still running
/// when the timeout elapsed.
pub async fn shutdown_within(session: &InboxSession, timeout: Duration) -> bool {
    match tokio::time::timeout(timeout, session.shutdown()).await {
        Ok(()) => true,
        Err(_) => {
            warn!(?timeout, "timed out waiting for in-flight inbox work");
            false
        }
    }
}
