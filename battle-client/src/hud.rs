//! Log-based HUD.
//!
//! The headless stand-in for the DOM layer: every display event the core
//! emits becomes a structured log line. Per-frame readouts (cooldown, the
//! event banner, the combo counter) only log on change.

use bevy::prelude::*;
use tracing::{debug, info, trace};

use archmage_core::boss::BossSprite;
use archmage_core::collectible::{CollectiblePicked, CollectibleSpawned};
use archmage_core::commands::{ActiveEvent, CooldownUpdate};
use archmage_core::finisher::{FinisherPrompt, FinisherProgress, FinisherUnleashed};
use archmage_core::phase::PhaseChanged;
use archmage_core::protocol::EventKind;
use archmage_core::session::{
    ComboChanged, Combatant, DamageNumber, GameOutcome, GameSession, ManaChanged, VitalsChanged,
};
use archmage_core::spell::ComboMessage;

use crate::backend::BackendBridge;

/// How long the summary waits for spell stats before giving up
const SUMMARY_TIMEOUT: f32 = 2.0;

/// Health bars, mana bar, combo and cooldown readouts
pub fn hud_vitals(
    mut vitals: EventReader<VitalsChanged>,
    mut mana: EventReader<ManaChanged>,
    mut combos: EventReader<ComboChanged>,
    mut cooldowns: EventReader<CooldownUpdate>,
    mut last_combo: Local<Option<u32>>,
    mut last_cooldown: Local<Option<bool>>,
) {
    for change in vitals.read() {
        let percent = (100.0 * change.current as f64 / change.max as f64).round();
        match change.target {
            Combatant::Player => {
                info!(health = change.current, max = change.max, percent, "player health")
            }
            Combatant::Boss => {
                info!(health = change.current, max = change.max, percent, "boss health")
            }
        }
    }
    for change in mana.read() {
        info!(mana = change.current, max = change.max, "mana");
    }
    for change in combos.read() {
        if *last_combo != Some(change.count) {
            *last_combo = Some(change.count);
            if change.count > 0 {
                info!(combo = change.count, highest = change.highest, "combo");
            }
        }
    }
    for update in cooldowns.read() {
        let ready = update.seconds <= 0.0;
        if *last_cooldown != Some(ready) {
            *last_cooldown = Some(ready);
            if ready {
                debug!("cooldown: ready");
            } else {
                debug!(seconds = update.seconds as f64, "cooldown");
            }
        }
    }
}

/// Event banner, phase transitions, combo messages, finisher ceremony
pub fn hud_banners(
    mut banners: EventReader<ActiveEvent>,
    mut messages: EventReader<ComboMessage>,
    mut phases: EventReader<PhaseChanged>,
    mut prompts: EventReader<FinisherPrompt>,
    mut progress: EventReader<FinisherProgress>,
    mut unleashed: EventReader<FinisherUnleashed>,
    mut last_event: Local<Option<EventKind>>,
) {
    for banner in banners.read() {
        if *last_event != Some(banner.event) {
            *last_event = Some(banner.event);
            info!(event = banner.event.banner(), "event banner");
        }
    }
    for message in messages.read() {
        info!(message = message.text, "banner");
    }
    for change in phases.read() {
        if let Some(text) = change.phase.banner() {
            info!(phase = change.phase.number(), banner = text, "boss phase");
        }
    }
    for _ in prompts.read() {
        info!("UNLEASH 2 OPEN PALMS!");
    }
    for step in progress.read() {
        info!(count = step.count, required = 2, "finisher counter");
    }
    for _ in unleashed.read() {
        info!("EPIC FINISHER!");
    }
}

/// Floating damage numbers and collectible traffic
pub fn hud_combat(
    mut numbers: EventReader<DamageNumber>,
    mut spawned: EventReader<CollectibleSpawned>,
    mut picked: EventReader<CollectiblePicked>,
) {
    for number in numbers.read() {
        info!(
            target = ?number.target,
            amount = number.amount,
            healing = number.healing,
            resisted = number.resisted,
            "damage number"
        );
    }
    for item in spawned.read() {
        debug!(kind = ?item.kind, x = item.x as f64, y = item.y as f64, "collectible spawned");
    }
    for item in picked.read() {
        info!(kind = ?item.kind, amount = item.amount, "collectible picked up");
    }
}

/// Sprite-frame advances, at trace level (very chatty)
pub fn hud_sprites(mut sprites: EventReader<BossSprite>) {
    for sprite in sprites.read() {
        trace!(state = ?sprite.state, frame = sprite.frame, "boss sprite frame");
    }
}

/// Game-over summary flow: wait for the outcome, fetch the spell stats
/// once, print the summary and exit
#[derive(Resource, Default)]
pub struct SummaryState {
    outcome: Option<bool>,
    wait: Timer,
    done: bool,
}

pub fn game_over_summary(
    time: Res<Time>,
    session: Res<GameSession>,
    mut outcomes: EventReader<GameOutcome>,
    mut summary: ResMut<SummaryState>,
    mut bridge: ResMut<BackendBridge>,
    mut exit: EventWriter<AppExit>,
) {
    for outcome in outcomes.read() {
        if summary.outcome.is_none() {
            summary.outcome = Some(outcome.victory);
            summary.wait = Timer::from_seconds(SUMMARY_TIMEOUT, TimerMode::Once);
            bridge.request_stats();
            if outcome.victory {
                info!("VICTORY! The boss has fallen.");
            } else {
                info!("DEFEAT! The boss wins.");
            }
        }
    }

    let Some(victory) = summary.outcome else {
        return;
    };
    if summary.done {
        return;
    }

    let stats = bridge.try_take_stats();
    let timed_out = summary.wait.tick(time.delta()).just_finished();
    if stats.is_none() && !timed_out {
        return;
    }

    summary.done = true;
    let stats = stats.unwrap_or_default();
    let favorite = if stats.favorite_spell_display.is_empty() {
        "None".to_string()
    } else {
        stats.favorite_spell_display
    };
    info!(
        victory,
        favorite_spell = %favorite,
        favorite_count = stats.favorite_spell_count,
        highest_combo = session.combo.highest(),
        battle_secs = session.duration().round() as i64,
        "battle summary"
    );
    exit.send(AppExit::Success);
}
