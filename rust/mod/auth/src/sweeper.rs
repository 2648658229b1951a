use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::service::AuthService;

/// One sweep: drop expired OTP records and expired sessions.
/// Returns (otps removed, sessions removed).
pub fn sweep_once(svc: &AuthService) -> (usize, usize) {
    let otps = match svc.purge_expired_otps() {
        Ok(n) => n,
        Err(e) => {
            error!("otp sweep error: {e}");
            0
        }
    };
    let sessions = match svc.purge_expired_sessions() {
        Ok(n) => n,
        Err(e) => {
            error!("session sweep error: {e}");
            0
        }
    };
    (otps, sessions)
}

/// Start the background sweeper.
///
/// Returns a CancellationToken that stops it when cancelled.
pub fn start(svc: Arc<AuthService>, interval: Duration) -> CancellationToken {
    let cancel = CancellationToken::new();
    let token = cancel.clone();

    tokio::spawn(async move {
        info!("sweeper started (interval={interval:?})");
        loop {
            tokio::select! {
                _ = token.cancelled() => {
                    info!("sweeper stopped");
                    break;
                }
                _ = tokio::time::sleep(interval) => {
                    debug!("sweeper scan");
                    match sweep_once(&svc) {
                        (0, 0) => {}
                        (otps, sessions) => info!("sweeper: removed {otps} otps, {sessions} sessions"),
                    }
                }
            }
        }
    });

    cancel
}
