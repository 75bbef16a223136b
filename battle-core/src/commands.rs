//! Per-frame command application.
//!
//! The driver turns each successful backend poll into one `PollFrame`
//! event; this module applies it: server bookkeeping (combo/mana/cooldown),
//! collectible spawn checks, dispatch to exactly one spell handler (with
//! finisher interception), and the autonomous boss-attack roll. Session
//! side effects ripple through `SessionFx` and are resolved at the end of
//! the frame chain.

use bevy::ecs::system::SystemParam;
use bevy::prelude::*;
use rand::Rng;
use tracing::{debug, info};

use crate::boss::BossAnimator;
use crate::collectible::{CollectibleField, CollectibleSpawned};
use crate::config::BattleConfig;
use crate::finisher::{
    unleash, FinisherPrompt, FinisherProgress, FinisherSequencer, FinisherUnleashed,
    REQUIRED_CONFIRMATIONS,
};
use crate::phase::PhaseChanged;
use crate::protocol::{CommandKind, CommandResponse, EventKind, Notification};
use crate::session::{
    write_boss_health, write_player_health, ComboChanged, Combatant, DamageNumber, GameOutcome,
    GameSession, ManaChanged, Outcome, SessionEffect, SessionFx, VitalsChanged,
};
use crate::spell::{
    ComboMessage, DelayedLaunch, HandPosition, Projectile, Strike, CHALLENGE_REWARD_DAMAGE,
    EXPLOSION_COMBO_DAMAGE, EXPLOSION_FOLLOWUP_DELAY, EXPLOSION_WEAKFIRE_BONUS, FIREBALL_DAMAGE,
    HEALING_LIGHT_DAMAGE, HEALING_LIGHT_HEAL, ICE_SHARD_DAMAGE, LIGHTNING_FLASH_DURATION,
    LIGHTNING_STRIKE_COMBO_DAMAGE, LIGHTNING_STRIKE_DELAY, WEAKFIRE_BONUS,
};

/// Boss autonomous attack damage band (before type multipliers)
const BOSS_DAMAGE_MIN: i32 = 15;
const BOSS_DAMAGE_MAX: i32 = 25;

/// One successful backend poll, delivered by the driver
#[derive(Event, Debug, Clone)]
pub struct PollFrame(pub CommandResponse);

/// Best-effort backend notification, forwarded by the driver
#[derive(Event, Debug, Clone)]
pub struct NotifyBackend(pub Notification);

/// Cooldown readout changed (display)
#[derive(Event, Debug, Clone, Copy)]
pub struct CooldownUpdate {
    pub seconds: f32,
}

/// Active battle event changed (display banner)
#[derive(Event, Debug, Clone, Copy)]
pub struct ActiveEvent {
    pub event: EventKind,
}

/// Display-side writers used while applying a poll frame
#[derive(SystemParam)]
pub struct DisplayWriters<'w> {
    pub combo: EventWriter<'w, ComboChanged>,
    pub mana: EventWriter<'w, ManaChanged>,
    pub cooldown: EventWriter<'w, CooldownUpdate>,
    pub banner: EventWriter<'w, ActiveEvent>,
    pub spawned: EventWriter<'w, CollectibleSpawned>,
    pub message: EventWriter<'w, ComboMessage>,
    pub numbers: EventWriter<'w, DamageNumber>,
}

/// Gameplay-side writers used while applying a poll frame
#[derive(SystemParam)]
pub struct GameplayWriters<'w> {
    pub fx: EventWriter<'w, SessionFx>,
    pub vitals: EventWriter<'w, VitalsChanged>,
    pub progress: EventWriter<'w, FinisherProgress>,
    pub unleashed: EventWriter<'w, FinisherUnleashed>,
}

/// Apply every poll frame delivered since the last run
#[allow(clippy::too_many_arguments)]
pub fn apply_poll_frames(
    mut polls: EventReader<PollFrame>,
    mut commands: Commands,
    config: Res<BattleConfig>,
    hand: Res<HandPosition>,
    mut session: ResMut<GameSession>,
    mut animator: ResMut<BossAnimator>,
    mut sequencer: ResMut<FinisherSequencer>,
    mut field: ResMut<CollectibleField>,
    mut display: DisplayWriters,
    mut gameplay: GameplayWriters,
) {
    for PollFrame(response) in polls.read() {
        if !session.is_running() {
            continue;
        }
        debug!(command = ?response.command, event = ?response.event, "poll frame");

        // Server bookkeeping, subject to the one-cycle combo override
        session.combo.sync_from_server(response.combo);
        display.combo.send(ComboChanged {
            count: session.combo.count(),
            highest: session.combo.highest(),
        });
        if let (Some(mana), Some(max_mana)) = (response.mana, response.max_mana) {
            session.mana.sync(mana, max_mana);
            display.mana.send(ManaChanged {
                current: session.mana.current(),
                max: session.mana.max(),
            });
        }
        display.cooldown.send(CooldownUpdate {
            seconds: response.cooldown,
        });
        display.banner.send(ActiveEvent {
            event: response.event,
        });

        // Collectible spawn checks only run on successful polls
        let spawned = field.run_spawn_checks(&config, session.rng_mut());
        for item in spawned {
            display.spawned.send(CollectibleSpawned {
                kind: item.kind,
                x: item.x,
                y: item.y,
            });
        }

        // Dispatch: the finisher window intercepts its confirmation command
        // and suppresses normal spell resolution entirely
        if sequencer.is_active() {
            if response.command == CommandKind::IceShard {
                if let Some(count) = sequencer.confirm() {
                    info!(count, required = REQUIRED_CONFIRMATIONS, "finisher progress");
                    gameplay.progress.send(FinisherProgress { count });
                    if count >= REQUIRED_CONFIRMATIONS {
                        unleash(&mut sequencer, &mut animator, &mut gameplay.unleashed);
                    }
                }
            }
        } else {
            dispatch_command(
                response.command,
                response.event,
                &mut commands,
                &config,
                &hand,
                &mut session,
                &mut animator,
                &mut display,
                &mut gameplay,
            );
        }

        // Autonomous boss attack, time-gated and phase-weighted
        if !sequencer.is_active()
            && session.is_running()
            && session.attack_check_due(config.attack_check_interval)
        {
            let phase = session.phase();
            let roll: f32 = session.rng_mut().gen();
            if roll < phase.attack_chance() {
                let damage = session.rng_mut().gen_range(BOSS_DAMAGE_MIN..=BOSS_DAMAGE_MAX);
                let attack = phase.roll_attack(session.rng_mut());
                info!(?attack, damage, phase = phase.number(), "boss attacks");
                animator.try_attack(attack, damage, phase);
            }
        }
    }
}

/// Route one command to its handler per the damage table
#[allow(clippy::too_many_arguments)]
fn dispatch_command(
    command: CommandKind,
    event: EventKind,
    commands: &mut Commands,
    config: &BattleConfig,
    hand: &HandPosition,
    session: &mut GameSession,
    animator: &mut BossAnimator,
    display: &mut DisplayWriters,
    gameplay: &mut GameplayWriters,
) {
    let mut spell_resolved = true;
    match command {
        CommandKind::Fireball => {
            let mut damage = FIREBALL_DAMAGE;
            if event == EventKind::Weakfire {
                info!("weak point hit, fireball empowered");
                damage += WEAKFIRE_BONUS;
            }
            commands.spawn(Projectile::fireball(damage, hand.0, config));
        }
        CommandKind::IceShard => {
            commands.spawn(Projectile::ice_shard(ICE_SHARD_DAMAGE, hand.0, config));
        }
        CommandKind::Lightning => {
            commands.spawn(Strike::lightning());
        }
        CommandKind::ExplosionCombo => {
            let mut damage = EXPLOSION_COMBO_DAMAGE;
            if event == EventKind::Weakfire {
                damage += EXPLOSION_WEAKFIRE_BONUS;
            }
            display.message.send(ComboMessage {
                text: "EXPLOSION COMBO!",
            });
            commands.spawn(Projectile::fireball(damage, hand.0, config));
            commands.spawn(DelayedLaunch::ice_shard(
                ICE_SHARD_DAMAGE,
                EXPLOSION_FOLLOWUP_DELAY,
            ));
        }
        CommandKind::HealingLightCombo => {
            display.message.send(ComboMessage {
                text: "HEALING LIGHT!",
            });
            commands.spawn(Strike::flash(0, LIGHTNING_FLASH_DURATION));
            display.numbers.send(DamageNumber {
                target: Combatant::Boss,
                amount: HEALING_LIGHT_DAMAGE,
                healing: false,
                resisted: false,
            });
            display.numbers.send(DamageNumber {
                target: Combatant::Player,
                amount: HEALING_LIGHT_HEAL,
                healing: true,
                resisted: false,
            });
            let boss_value = session.boss.current() - HEALING_LIGHT_DAMAGE;
            write_boss_health(session, boss_value, &mut gameplay.fx, &mut gameplay.vitals);
            let player_value = session.player.current() + HEALING_LIGHT_HEAL;
            write_player_health(session, player_value, &mut gameplay.fx, &mut gameplay.vitals);
        }
        CommandKind::LightningStrikeCombo => {
            display.message.send(ComboMessage {
                text: "LIGHTNING STRIKE!",
            });
            commands.spawn(Strike::flash(
                LIGHTNING_STRIKE_COMBO_DAMAGE,
                LIGHTNING_STRIKE_DELAY,
            ));
        }
        CommandKind::ChallengeSuccess => {
            info!("challenge complete, bonus damage");
            display.message.send(ComboMessage {
                text: "CHALLENGE COMPLETE!",
            });
            animator.try_hit(CHALLENGE_REWARD_DAMAGE);
            spell_resolved = false;
        }
        CommandKind::InsufficientMana => {
            debug!("not enough mana");
            spell_resolved = false;
        }
        CommandKind::Cooldown | CommandKind::None | CommandKind::Unknown => {
            spell_resolved = false;
        }
    }

    // Optimistic combo bump; the next server sync remains authoritative
    if spell_resolved {
        session.combo.increment();
        display.combo.send(ComboChanged {
            count: session.combo.count(),
            highest: session.combo.highest(),
        });
    }
}

/// Resolve the session effects queued by this frame's health writes
pub fn resolve_session_effects(
    mut fx: EventReader<SessionFx>,
    config: Res<BattleConfig>,
    session: Res<GameSession>,
    mut animator: ResMut<BossAnimator>,
    mut sequencer: ResMut<FinisherSequencer>,
    mut notify: EventWriter<NotifyBackend>,
    mut combo: EventWriter<ComboChanged>,
    mut phase_changed: EventWriter<PhaseChanged>,
    mut prompt: EventWriter<FinisherPrompt>,
) {
    for SessionFx(effect) in fx.read() {
        match effect {
            SessionEffect::ComboReset => {
                debug!("player took damage, combo reset");
                notify.send(NotifyBackend(Notification::ResetCombo));
                combo.send(ComboChanged {
                    count: 0,
                    highest: session.combo.highest(),
                });
            }
            SessionEffect::PhaseShift(phase) => {
                info!(phase = phase.number(), "boss phase transition");
                animator.restart_idle(*phase);
                phase_changed.send(PhaseChanged { phase: *phase });
            }
            SessionEffect::BossDown => {
                if sequencer.begin(config.finisher_time_limit) {
                    info!(
                        "boss is down, finisher window opens ({}s)",
                        config.finisher_time_limit
                    );
                    prompt.send(FinisherPrompt);
                }
            }
            SessionEffect::PlayerDown => {
                if sequencer.abort() {
                    info!("player fell during the finisher window, defeat takes precedence");
                }
            }
        }
    }
}

/// Advance the battle clock and fire the delayed defeat report
pub fn tick_session(
    time: Res<Time>,
    mut session: ResMut<GameSession>,
    mut outcome: EventWriter<GameOutcome>,
) {
    if let Some(Outcome::Defeat) = session.tick(time.delta()) {
        outcome.send(GameOutcome { victory: false });
    }
}
