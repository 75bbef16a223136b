//! Boss entity: animation machine and its frame-driven system.

pub mod animation;

use bevy::prelude::*;
use tracing::debug;

pub use animation::{AnimEffect, BossAnimation, BossAnimator, HitResponse};

use crate::session::{
    write_boss_health, write_player_health, Combatant, DamageNumber, GameSession, SessionFx,
    VitalsChanged,
};

/// Sprite frame advanced (display only)
#[derive(Event, Debug, Clone, Copy)]
pub struct BossSprite {
    pub state: BossAnimation,
    pub frame: u32,
}

/// The death sequence fully played out
#[derive(Event, Debug, Clone, Copy)]
pub struct BossDeathFinished;

/// Tick the animator and apply its completion effects to the session
pub fn tick_animator(
    time: Res<Time>,
    mut session: ResMut<GameSession>,
    mut animator: ResMut<BossAnimator>,
    mut sprites: EventWriter<BossSprite>,
    mut numbers: EventWriter<DamageNumber>,
    mut death: EventWriter<BossDeathFinished>,
    mut fx: EventWriter<SessionFx>,
    mut vitals: EventWriter<VitalsChanged>,
) {
    if !session.is_running() {
        return;
    }
    let mut effects = Vec::new();
    let phase = session.phase();
    animator.tick(time.delta(), phase, &mut effects);

    for effect in effects {
        match effect {
            AnimEffect::Sprite { state, frame } => {
                sprites.send(BossSprite { state, frame });
            }
            AnimEffect::BossDamage { amount, resisted } => {
                debug!(amount, resisted, "boss damage lands");
                numbers.send(DamageNumber {
                    target: Combatant::Boss,
                    amount,
                    healing: false,
                    resisted,
                });
                let value = session.boss.current() - amount;
                write_boss_health(&mut session, value, &mut fx, &mut vitals);
            }
            AnimEffect::PlayerDamage { amount } => {
                debug!(amount, "boss attack lands on the player");
                numbers.send(DamageNumber {
                    target: Combatant::Player,
                    amount,
                    healing: false,
                    resisted: false,
                });
                let value = session.player.current() - amount;
                write_player_health(&mut session, value, &mut fx, &mut vitals);
            }
            AnimEffect::DeathFinished => {
                death.send(BossDeathFinished);
            }
        }
    }
}
