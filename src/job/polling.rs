use crate::job::client::Continuation;
use crate::job::types::JobHandle;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::debug;

/// Repeating status-check ticker bound to one job and one generation.
///
/// The ticker only emits `Tick` messages; the owning client decides whether a
/// tick turns into a request. Dropping the session aborts the ticker, so a
/// session can never outlive the client state that references it.
pub struct PollingSession {
    generation: u64,
    handle: JobHandle,
    ticker: JoinHandle<()>,
    in_flight: bool,
}

impl PollingSession {
    pub(crate) fn start(
        runtime: &Handle,
        generation: u64,
        handle: JobHandle,
        period: Duration,
        sender: UnboundedSender<Continuation>,
    ) -> Self {
        debug!(
            "Starting polling session {} for {} every {:?}",
            generation, handle, period
        );

        let ticker = runtime.spawn(async move {
            let mut ticks = interval_at(Instant::now() + period, period);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticks.tick().await;
                if sender.send(Continuation::Tick { generation }).is_err() {
                    break;
                }
            }
        });

        Self {
            generation,
            handle,
            ticker,
            in_flight: false,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn handle(&self) -> &JobHandle {
        &self.handle
    }

    /// Claim the current tick for a request. Returns false while a previous
    /// request is still outstanding.
    pub fn begin_poll(&mut self) -> bool {
        if self.in_flight {
            return false;
        }
        self.in_flight = true;
        true
    }

    pub fn finish_poll(&mut self) {
        self.in_flight = false;
    }
}

impl Drop for PollingSession {
    fn drop(&mut self) {
        debug!("Polling session {} for {} closed", self.generation, self.handle);
        self.ticker.abort();
    }
}
