//! Hand-frame feed.
//!
//! The vision pipeline (webcam + landmark model) lives outside this
//! process; it reaches the game as a channel of 21-landmark hand frames.
//! The bundled source is an NDJSON replay file, paced at capture rate,
//! one `{"landmarks": [{"x": ..., "y": ...}, ...]}` object per line.
//!
//! Each frame is classified; the backend is told about a gesture only when
//! it changes, and the wrist position becomes the projectile launch origin.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::time::Duration;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use archmage_core::commands::NotifyBackend;
use archmage_core::config::BattleConfig;
use archmage_core::gesture::{self, Gesture, Landmark, Ruleset};
use archmage_core::protocol::Notification;
use archmage_core::spell::HandPosition;

/// Mirrored webcam canvas width; landmark x is flipped across it
const CAPTURE_WIDTH: f32 = 600.0;
/// Replay pacing, roughly webcam capture rate
const REPLAY_FRAME: Duration = Duration::from_millis(33);

/// One captured hand
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandFrame {
    pub landmarks: Vec<Landmark>,
}

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("cannot open hand feed: {0}")]
    Io(#[from] std::io::Error),
    #[error("bad hand frame: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Parse one NDJSON feed line
pub fn parse_frame(line: &str) -> Result<HandFrame, FeedError> {
    Ok(serde_json::from_str(line)?)
}

/// Channel end the game reads hand frames from; absent when no vision
/// source is wired up
#[derive(Resource)]
pub struct HandFeed {
    receiver: Option<mpsc::Receiver<HandFrame>>,
}

impl HandFeed {
    pub fn new(receiver: Option<mpsc::Receiver<HandFrame>>) -> Self {
        Self { receiver }
    }
}

/// Dedup state for the gesture push
#[derive(Resource, Default)]
pub struct HandTracker {
    last_gesture: Gesture,
}

/// Replay an NDJSON landmark file as a live feed
pub fn spawn_replay(path: &Path) -> Result<mpsc::Receiver<HandFrame>, FeedError> {
    let file = File::open(path)?;
    let (tx, rx) = mpsc::channel::<HandFrame>(8);

    std::thread::Builder::new()
        .name("hand-feed".to_string())
        .spawn(move || {
            for line in BufReader::new(file).lines() {
                let line = match line {
                    Ok(line) => line,
                    Err(error) => {
                        warn!(%error, "hand feed read failed");
                        break;
                    }
                };
                if line.trim().is_empty() {
                    continue;
                }
                match parse_frame(&line) {
                    Ok(frame) => {
                        if tx.blocking_send(frame).is_err() {
                            break;
                        }
                    }
                    Err(error) => warn!(%error, "skipping hand frame"),
                }
                std::thread::sleep(REPLAY_FRAME);
            }
            debug!("hand feed replay finished");
        })
        .map_err(FeedError::Io)?;

    Ok(rx)
}

/// Classify the newest hand frame, track the wrist, notify on change
pub fn ingest_hand_frames(
    config: Res<BattleConfig>,
    mut feed: ResMut<HandFeed>,
    mut tracker: ResMut<HandTracker>,
    mut hand: ResMut<HandPosition>,
    mut notify: EventWriter<NotifyBackend>,
) {
    let Some(receiver) = feed.receiver.as_mut() else {
        return;
    };
    let mut latest = None;
    while let Ok(frame) = receiver.try_recv() {
        latest = Some(frame);
    }
    let Some(frame) = latest else {
        return;
    };

    match gesture::classify(&frame.landmarks, Ruleset::Battle) {
        Ok(classified) => {
            if let Some(wrist) = gesture::wrist(&frame.landmarks) {
                hand.0 = Some(Vec2::new(
                    (1.0 - wrist.x) * CAPTURE_WIDTH,
                    wrist.y * config.arena_height,
                ));
            }
            if classified != tracker.last_gesture {
                tracker.last_gesture = classified;
                debug!(gesture = classified.as_str(), "gesture changed");
                notify.send(NotifyBackend(Notification::Gesture(
                    classified.as_str().to_string(),
                )));
            }
        }
        Err(error) => warn!(%error, "unclassifiable hand frame"),
    }
}
