//! Background task that periodically cancels stale reservation holds.
//!
//! Runs in a `tokio::spawn` loop, calling
//! [`ReservationService::expire_stale_holds`] every `check_interval` until the
//! shutdown signal fires.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio::time::{Duration, MissedTickBehavior};
use tracing::{info, warn};

use super::reservation::ReservationService;
use crate::shared::shutdown::ShutdownSignal;

pub fn start_hold_expiry_task(
    service: Arc<ReservationService>,
    shutdown: ShutdownSignal,
    check_interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(
            check_interval_ms = check_interval.as_millis() as u64,
            hold_timeout_min = service.settings().hold_timeout.num_minutes(),
            "Hold expiry task started"
        );

        let mut interval = tokio::time::interval(check_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let stop = shutdown.notified().wait();
        tokio::pin!(stop);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if let Err(e) = service.expire_stale_holds().await {
                        warn!(error = %e, "Hold expiry sweep failed");
                    }
                }
                _ = &mut stop => {
                    info!("Hold expiry task shutting down");
                    break;
                }
            }
        }

        info!("Hold expiry task stopped");
    })
}
