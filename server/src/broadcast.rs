//! Periodic push of the authoritative world state to every client.

use crate::error::ServerError;
use crate::game::SharedStore;
use crate::network::GameMessage;
use log::{debug, info, warn};
use shared::{Packet, WorldState};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

/// Builds the packet for one broadcast tick, or None when nobody is playing.
pub fn build_update(state: &WorldState) -> Option<Packet> {
    if state.is_empty() {
        return None;
    }

    Some(Packet::ServerUpdate {
        snapshot: state.snapshot(),
    })
}

/// Timer task sampling the store every `period` and queueing a broadcast.
///
/// Sends are fire-and-forget: nothing is acknowledged or retried, and a late
/// tick simply replaces the payload the previous one would have carried.
pub struct BroadcastLoop {
    period: Duration,
    handle: Option<JoinHandle<()>>,
}

impl BroadcastLoop {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            handle: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }

    /// Spawns the timer task. Fails if a previous start is still running or
    /// the period is zero.
    pub fn start(
        &mut self,
        store: SharedStore,
        outbound: mpsc::UnboundedSender<GameMessage>,
    ) -> Result<(), ServerError> {
        if self.is_running() {
            return Err(ServerError::BroadcastAlreadyRunning);
        }
        if self.period.is_zero() {
            return Err(ServerError::ZeroBroadcastPeriod);
        }

        let period = self.period;
        info!("Broadcasting world state every {:?}", period);

        self.handle = Some(tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            // Skip the first tick since it fires immediately
            ticker.tick().await;

            loop {
                ticker.tick().await;

                let packet = {
                    let store = store.read().await;
                    build_update(store.state())
                };

                let Some(packet) = packet else {
                    debug!("No players, skipping broadcast");
                    continue;
                };

                let message = GameMessage::BroadcastPacket {
                    packet,
                    exclude: None,
                };
                if outbound.send(message).is_err() {
                    warn!("Outbound queue closed, stopping broadcast loop");
                    break;
                }
            }
        }));

        Ok(())
    }

    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

impl Drop for BroadcastLoop {
    fn drop(&mut self) {
        self.stop();
    }
}
