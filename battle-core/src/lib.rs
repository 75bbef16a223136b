//! Archmage Battle - Core Library
//!
//! Deterministic client-side game state for the gesture-controlled boss
//! fight:
//! - Session state (combatant vitals, mana, combo tracker, outcome)
//! - Boss phase controller (health-ratio step function, attack tables)
//! - Boss animation state machine (idle/hit/cleave/walk/death/finisher)
//! - Spell resolution (damage table, projectile flight, timed strikes)
//! - Collectible field (mana balls, heal orbs, collision + TTL)
//! - Finisher sequencer (2-of-2 confirmation window)
//! - Backend wire contract and gesture classification
//!
//! Everything time-driven runs inside one Bevy `Update` chain; the driver
//! feeds `PollFrame` events in and forwards `NotifyBackend` events out.

pub mod boss;
pub mod collectible;
pub mod commands;
pub mod config;
pub mod finisher;
pub mod gesture;
pub mod phase;
pub mod protocol;
pub mod session;
pub mod spell;

use bevy::prelude::*;

use boss::{BossAnimator, BossDeathFinished, BossSprite};
use collectible::{CollectibleField, CollectiblePicked, CollectibleSpawned};
use commands::{ActiveEvent, CooldownUpdate, NotifyBackend, PollFrame};
use config::BattleConfig;
use finisher::{FinisherPrompt, FinisherProgress, FinisherSequencer, FinisherUnleashed};
use phase::{BossPhase, PhaseChanged};
use session::{
    ComboChanged, DamageNumber, GameOutcome, GameSession, ManaChanged, SessionFx, VitalsChanged,
};
use spell::{ComboMessage, HandPosition};

/// The whole battle core: resources, events and the frame chain
#[derive(Default)]
pub struct BossBattlePlugin {
    pub config: BattleConfig,
}

impl BossBattlePlugin {
    pub fn new(config: BattleConfig) -> Self {
        Self { config }
    }
}

impl Plugin for BossBattlePlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(GameSession::new(&self.config))
            .insert_resource(BossAnimator::new(BossPhase::Normal))
            .insert_resource(FinisherSequencer::default())
            .insert_resource(CollectibleField::default())
            .insert_resource(HandPosition::default())
            .insert_resource(self.config.clone())
            .add_event::<PollFrame>()
            .add_event::<NotifyBackend>()
            .add_event::<CooldownUpdate>()
            .add_event::<ActiveEvent>()
            .add_event::<VitalsChanged>()
            .add_event::<ManaChanged>()
            .add_event::<ComboChanged>()
            .add_event::<DamageNumber>()
            .add_event::<GameOutcome>()
            .add_event::<SessionFx>()
            .add_event::<PhaseChanged>()
            .add_event::<BossSprite>()
            .add_event::<BossDeathFinished>()
            .add_event::<CollectibleSpawned>()
            .add_event::<CollectiblePicked>()
            .add_event::<ComboMessage>()
            .add_event::<FinisherPrompt>()
            .add_event::<FinisherProgress>()
            .add_event::<FinisherUnleashed>()
            .add_systems(
                Update,
                (
                    commands::apply_poll_frames,
                    spell::tick_delayed_launches,
                    spell::tick_projectiles,
                    spell::tick_strikes,
                    boss::tick_animator,
                    collectible::tick_field,
                    finisher::tick_countdown,
                    commands::resolve_session_effects,
                    finisher::resolve_death,
                    commands::tick_session,
                )
                    .chain(),
            );
    }
}
