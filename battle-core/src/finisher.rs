//! Finisher sequencer.
//!
//! Dropping the boss to zero does not end the match: a short confirmation
//! window opens in which the player must land two finishing gestures.
//! Confirmation and timeout both funnel into the same terminal sequence
//! (blast, then the death animation); victory is reported exactly once,
//! from the death animation's completion. Player death while the window is
//! open aborts the sequence; defeat pre-empts the finisher.

use bevy::prelude::*;
use tracing::info;

use crate::boss::{BossAnimator, BossDeathFinished};
use crate::session::{GameOutcome, GameSession};

/// Finishing gestures required inside the window
pub const REQUIRED_CONFIRMATIONS: u8 = 2;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FinisherState {
    #[default]
    Inactive,
    /// Window open, counting confirmations against the deadline
    Awaiting,
    /// Terminal sequence playing; victory pending its completion
    Resolving,
    Done,
    Aborted,
}

/// The finisher window opened (display prompt)
#[derive(Event, Debug, Clone, Copy)]
pub struct FinisherPrompt;

/// A confirmation landed (display counter)
#[derive(Event, Debug, Clone, Copy)]
pub struct FinisherProgress {
    pub count: u8,
}

/// The terminal sequence started (confirmation or timeout)
#[derive(Event, Debug, Clone, Copy)]
pub struct FinisherUnleashed;

#[derive(Resource, Debug, Default)]
pub struct FinisherSequencer {
    state: FinisherState,
    confirm_count: u8,
    countdown: Timer,
}

impl FinisherSequencer {
    pub fn state(&self) -> FinisherState {
        self.state
    }

    pub fn confirm_count(&self) -> u8 {
        self.confirm_count
    }

    /// Window open and intercepting commands?
    pub fn is_active(&self) -> bool {
        self.state == FinisherState::Awaiting
    }

    /// Open the window. No-op unless the sequencer is untouched: re-entry
    /// while active (or after resolution) must not restart the countdown.
    pub fn begin(&mut self, time_limit: f32) -> bool {
        if self.state != FinisherState::Inactive {
            return false;
        }
        self.state = FinisherState::Awaiting;
        self.confirm_count = 0;
        self.countdown = Timer::from_seconds(time_limit, TimerMode::Once);
        true
    }

    /// Count one finishing gesture; returns the new count while awaiting
    pub fn confirm(&mut self) -> Option<u8> {
        if self.state != FinisherState::Awaiting {
            return None;
        }
        self.confirm_count += 1;
        Some(self.confirm_count)
    }

    /// Move into the terminal sequence, cancelling the countdown
    pub fn start_resolving(&mut self) -> bool {
        if self.state != FinisherState::Awaiting {
            return false;
        }
        self.state = FinisherState::Resolving;
        true
    }

    /// Terminal sequence finished
    pub fn mark_done(&mut self) {
        if self.state == FinisherState::Resolving {
            self.state = FinisherState::Done;
        }
    }

    /// Defeat pre-empts the finisher while the window is open
    pub fn abort(&mut self) -> bool {
        if self.state != FinisherState::Awaiting {
            return false;
        }
        self.state = FinisherState::Aborted;
        true
    }

    fn deadline_elapsed(&mut self, delta: std::time::Duration) -> bool {
        self.state == FinisherState::Awaiting && self.countdown.tick(delta).just_finished()
    }
}

/// Kick off the terminal sequence (shared by confirmation and timeout)
pub(crate) fn unleash(
    sequencer: &mut FinisherSequencer,
    animator: &mut BossAnimator,
    unleashed: &mut EventWriter<FinisherUnleashed>,
) {
    if !sequencer.start_resolving() {
        return;
    }
    animator.start_finisher_blast();
    unleashed.send(FinisherUnleashed);
}

/// Tick the countdown; the deadline force-completes with full ceremony
pub fn tick_countdown(
    time: Res<Time>,
    session: Res<GameSession>,
    mut sequencer: ResMut<FinisherSequencer>,
    mut animator: ResMut<BossAnimator>,
    mut unleashed: EventWriter<FinisherUnleashed>,
) {
    if !session.is_running() {
        return;
    }
    if sequencer.deadline_elapsed(time.delta()) {
        info!("finisher window elapsed, auto-finishing");
        unleash(&mut sequencer, &mut animator, &mut unleashed);
    }
}

/// The death animation completed: resolve the match as a victory, unless
/// defeat already claimed the outcome
pub fn resolve_death(
    mut death: EventReader<BossDeathFinished>,
    mut sequencer: ResMut<FinisherSequencer>,
    mut session: ResMut<GameSession>,
    mut outcome: EventWriter<GameOutcome>,
) {
    for _ in death.read() {
        sequencer.mark_done();
        if session.report_victory() {
            outcome.send(GameOutcome { victory: true });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn begin_is_one_shot() {
        let mut seq = FinisherSequencer::default();
        assert!(seq.begin(10.0));
        assert!(!seq.begin(10.0));
        assert!(seq.is_active());
    }

    #[test]
    fn two_confirmations_reach_the_threshold() {
        let mut seq = FinisherSequencer::default();
        seq.begin(10.0);
        assert_eq!(seq.confirm(), Some(1));
        assert_eq!(seq.confirm(), Some(2));
        assert!(seq.confirm_count() >= REQUIRED_CONFIRMATIONS);
    }

    #[test]
    fn resolving_blocks_further_confirmations_and_the_deadline() {
        let mut seq = FinisherSequencer::default();
        seq.begin(10.0);
        seq.confirm();
        seq.confirm();
        assert!(seq.start_resolving());
        assert!(!seq.start_resolving());
        assert_eq!(seq.confirm(), None);
        // The countdown can no longer fire
        assert!(!seq.deadline_elapsed(Duration::from_secs(11)));
    }

    #[test]
    fn deadline_fires_exactly_once() {
        let mut seq = FinisherSequencer::default();
        seq.begin(10.0);
        assert!(!seq.deadline_elapsed(Duration::from_secs(9)));
        assert!(seq.deadline_elapsed(Duration::from_secs(2)));
        // Once elapsed it is resolved by unleash; even untouched, the timer
        // does not fire again
        assert!(!seq.deadline_elapsed(Duration::from_secs(20)));
    }

    #[test]
    fn abort_only_from_the_open_window() {
        let mut seq = FinisherSequencer::default();
        assert!(!seq.abort());
        seq.begin(10.0);
        assert!(seq.abort());
        assert_eq!(seq.state(), FinisherState::Aborted);
        // Aborted is terminal
        assert!(!seq.begin(10.0));
        assert_eq!(seq.confirm(), None);
    }
}
