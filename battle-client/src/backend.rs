//! Backend HTTP bridge.
//!
//! The game loop runs inside the Bevy schedule, the network on a dedicated
//! Tokio runtime thread; the two sides talk over channels:
//!
//! ```text
//! Bevy system (pump_backend)
//!       │ request poll (at most one in flight)
//!       ▼
//! poll task ── GET /get_command ──► PollOutcome ──► PollFrame event
//!
//! core NotifyBackend events ──► notifier task ── POST (fire-and-forget)
//! game over ──► stats task ── GET /get_spell_stats ──► summary
//! ```
//!
//! A failed poll is logged and skipped; the next frame simply asks again:
//! backend-down degrades to "no gameplay this frame", never to an error.

use bevy::prelude::*;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use archmage_core::commands::{NotifyBackend, PollFrame};
use archmage_core::protocol::{
    CommandResponse, Notification, SpellStats, GET_COMMAND, GET_SPELL_STATS,
};
use archmage_core::session::GameSession;

/// Result of one poll round-trip
#[derive(Debug)]
pub enum PollOutcome {
    Frame(CommandResponse),
    /// Transport or decode failure; retried next frame, no backoff
    Down,
}

/// Channel ends owned by the ECS side
#[derive(Resource)]
pub struct BackendBridge {
    poll_request: mpsc::Sender<()>,
    poll_result: mpsc::Receiver<PollOutcome>,
    notify: mpsc::UnboundedSender<Notification>,
    stats_request: mpsc::Sender<()>,
    stats_result: mpsc::Receiver<SpellStats>,
    in_flight: bool,
}

impl BackendBridge {
    /// Ask for the end-of-match spell stats (once)
    pub fn request_stats(&self) {
        let _ = self.stats_request.try_send(());
    }

    pub fn try_take_stats(&mut self) -> Option<SpellStats> {
        self.stats_result.try_recv().ok()
    }
}

/// Start the bridge runtime thread and hand back the ECS-side channels
pub fn spawn(base_url: String) -> anyhow::Result<BackendBridge> {
    let (poll_request_tx, mut poll_request_rx) = mpsc::channel::<()>(1);
    let (poll_result_tx, poll_result_rx) = mpsc::channel::<PollOutcome>(4);
    let (notify_tx, mut notify_rx) = mpsc::unbounded_channel::<Notification>();
    let (stats_request_tx, mut stats_request_rx) = mpsc::channel::<()>(1);
    let (stats_result_tx, stats_result_rx) = mpsc::channel::<SpellStats>(1);

    let runtime = tokio::runtime::Runtime::new()?;

    std::thread::Builder::new()
        .name("backend-bridge".to_string())
        .spawn(move || {
            runtime.block_on(async move {
                let client = reqwest::Client::new();

                let poll_base = base_url.clone();
                let poll_client = client.clone();
                let poll = async move {
                    while poll_request_rx.recv().await.is_some() {
                        let outcome = match poll_client
                            .get(format!("{poll_base}{GET_COMMAND}"))
                            .send()
                            .await
                        {
                            Ok(response) => match response.json::<CommandResponse>().await {
                                Ok(frame) => PollOutcome::Frame(frame),
                                Err(error) => {
                                    debug!(%error, "undecodable poll response");
                                    PollOutcome::Down
                                }
                            },
                            Err(error) => {
                                debug!(%error, "backend unreachable");
                                PollOutcome::Down
                            }
                        };
                        if poll_result_tx.send(outcome).await.is_err() {
                            break;
                        }
                    }
                };

                let notify_base = base_url.clone();
                let notify_client = client.clone();
                let notify = async move {
                    while let Some(notification) = notify_rx.recv().await {
                        let url = format!("{notify_base}{}", notification.endpoint());
                        if let Err(error) = notify_client
                            .post(url)
                            .json(&notification.body())
                            .send()
                            .await
                        {
                            // Best-effort: drop it and move on
                            debug!(%error, ?notification, "notification dropped");
                        }
                    }
                };

                let stats = async move {
                    while stats_request_rx.recv().await.is_some() {
                        let stats = match client
                            .get(format!("{base_url}{GET_SPELL_STATS}"))
                            .send()
                            .await
                        {
                            Ok(response) => response.json::<SpellStats>().await.unwrap_or_default(),
                            Err(error) => {
                                debug!(%error, "spell stats unavailable");
                                SpellStats::default()
                            }
                        };
                        if stats_result_tx.send(stats).await.is_err() {
                            break;
                        }
                    }
                };

                tokio::join!(poll, notify, stats);
            });
        })?;

    Ok(BackendBridge {
        poll_request: poll_request_tx,
        poll_result: poll_result_rx,
        notify: notify_tx,
        stats_request: stats_request_tx,
        stats_result: stats_result_rx,
        in_flight: false,
    })
}

/// Drain poll results into `PollFrame` events and keep one request in
/// flight while the match runs
pub fn pump_backend(
    mut bridge: ResMut<BackendBridge>,
    session: Res<GameSession>,
    mut polls: EventWriter<PollFrame>,
) {
    loop {
        match bridge.poll_result.try_recv() {
            Ok(PollOutcome::Frame(frame)) => {
                bridge.in_flight = false;
                polls.send(PollFrame(frame));
            }
            Ok(PollOutcome::Down) => {
                bridge.in_flight = false;
            }
            Err(_) => break,
        }
    }

    if session.is_running() && !bridge.in_flight && bridge.poll_request.try_send(()).is_ok() {
        bridge.in_flight = true;
    }
}

/// Forward the core's fire-and-forget notifications to the bridge
pub fn forward_notifications(
    bridge: Res<BackendBridge>,
    mut notifications: EventReader<NotifyBackend>,
) {
    for NotifyBackend(notification) in notifications.read() {
        if bridge.notify.send(notification.clone()).is_err() {
            warn!("notifier task gone, dropping notification");
        }
    }
}
