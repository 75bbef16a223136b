//! Spell resolution: the damage table, projectile flight and timed strikes.
//!
//! Projectiles (fireball, ice shard) fly across the arena, growing as they
//! go, testing one collectible collision per tick; reaching the boss side
//! triggers the hit animation with the carried damage. Lightning-style
//! spells are stationary strikes that trigger the hit animation when their
//! flash sequence ends.

use bevy::prelude::*;
use tracing::{debug, info};

use crate::boss::{BossAnimator, HitResponse};
use crate::collectible::{
    CollectibleField, CollectibleKind, CollectiblePicked, HEAL_ORB_REWARD, MANA_BALL_REWARD,
};
use crate::commands::NotifyBackend;
use crate::config::BattleConfig;
use crate::protocol::Notification;
use crate::session::{
    write_player_health, GameSession, ManaChanged, SessionFx, VitalsChanged,
};

// Damage table
pub const FIREBALL_DAMAGE: i32 = 10;
pub const WEAKFIRE_BONUS: i32 = 10;
pub const ICE_SHARD_DAMAGE: i32 = 8;
pub const LIGHTNING_DAMAGE: i32 = 12;
pub const EXPLOSION_COMBO_DAMAGE: i32 = 25;
pub const EXPLOSION_WEAKFIRE_BONUS: i32 = 15;
pub const HEALING_LIGHT_DAMAGE: i32 = 20;
pub const HEALING_LIGHT_HEAL: i32 = 15;
pub const LIGHTNING_STRIKE_COMBO_DAMAGE: i32 = 35;
pub const CHALLENGE_REWARD_DAMAGE: i32 = 30;

// Flight tuning (pixels and seconds)
const FIREBALL_SPEED: f32 = 1000.0;
const FIREBALL_GROWTH: f32 = 100.0;
const FIREBALL_SIZE: f32 = 100.0;
const FIREBALL_START_X: f32 = 300.0;
const ICE_SHARD_SPEED: f32 = 1066.0;
const ICE_SHARD_GROWTH: f32 = 83.0;
const ICE_SHARD_SIZE: f32 = 120.0;
const ICE_SHARD_START_X: f32 = 200.0;
/// Projectiles detonate this far short of the arena's right edge
const TARGET_MARGIN: f32 = 300.0;
const DEFAULT_LAUNCH_Y: f32 = 350.0;
/// Lightning: 4 frames at 40ms, 3 flashes
pub const LIGHTNING_FLASH_DURATION: f32 = 0.48;
/// The follow-up ice shard of the explosion combo launches after this long
pub const EXPLOSION_FOLLOWUP_DELAY: f32 = 0.2;
/// The lightning-strike combo lands its hit after this long
pub const LIGHTNING_STRIKE_DELAY: f32 = 0.5;

/// Visual family of an in-flight spell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpellKind {
    Fireball,
    IceShard,
    Lightning,
}

/// Most recent classified hand position in arena space, if any; projectiles
/// launch from the caster's hand when one has been seen
#[derive(Resource, Debug, Default, Clone, Copy)]
pub struct HandPosition(pub Option<Vec2>);

/// An in-flight projectile
#[derive(Component, Debug)]
pub struct Projectile {
    pub spell: SpellKind,
    pub x: f32,
    pub y: f32,
    pub size: f32,
    speed: f32,
    growth: f32,
    target_x: f32,
    pub damage: i32,
}

impl Projectile {
    pub fn fireball(damage: i32, origin: Option<Vec2>, config: &BattleConfig) -> Self {
        let (x, y) = launch_point(origin, FIREBALL_START_X);
        Self {
            spell: SpellKind::Fireball,
            x,
            y,
            size: FIREBALL_SIZE,
            speed: FIREBALL_SPEED,
            growth: FIREBALL_GROWTH,
            target_x: config.arena_width - TARGET_MARGIN,
            damage,
        }
    }

    pub fn ice_shard(damage: i32, origin: Option<Vec2>, config: &BattleConfig) -> Self {
        let (x, y) = launch_point(origin, ICE_SHARD_START_X);
        Self {
            spell: SpellKind::IceShard,
            x,
            y,
            size: ICE_SHARD_SIZE,
            speed: ICE_SHARD_SPEED,
            growth: ICE_SHARD_GROWTH,
            target_x: config.arena_width - TARGET_MARGIN,
            damage,
        }
    }
}

fn launch_point(origin: Option<Vec2>, default_x: f32) -> (f32, f32) {
    match origin {
        Some(hand) => (hand.x, hand.y),
        None => (default_x, DEFAULT_LAUNCH_Y),
    }
}

/// A stationary strike that lands after its flash sequence
#[derive(Component, Debug)]
pub struct Strike {
    pub spell: SpellKind,
    pub damage: i32,
    timer: Timer,
}

impl Strike {
    /// The plain lightning spell, damage built in
    pub fn lightning() -> Self {
        Self::flash(LIGHTNING_DAMAGE, LIGHTNING_FLASH_DURATION)
    }

    /// A lightning flash that lands custom damage after `delay`
    pub fn flash(damage: i32, delay: f32) -> Self {
        Self {
            spell: SpellKind::Lightning,
            damage,
            timer: Timer::from_seconds(delay, TimerMode::Once),
        }
    }
}

/// A spell whose launch is delayed (explosion combo's second shard)
#[derive(Component, Debug)]
pub struct DelayedLaunch {
    pub spell: SpellKind,
    pub damage: i32,
    timer: Timer,
}

impl DelayedLaunch {
    pub fn ice_shard(damage: i32, delay: f32) -> Self {
        Self {
            spell: SpellKind::IceShard,
            damage,
            timer: Timer::from_seconds(delay, TimerMode::Once),
        }
    }
}

/// Combo/banner message (display)
#[derive(Event, Debug, Clone)]
pub struct ComboMessage {
    pub text: &'static str,
}

/// Move projectiles, test collectibles, detonate on arrival
pub fn tick_projectiles(
    time: Res<Time>,
    mut commands: Commands,
    mut session: ResMut<GameSession>,
    mut animator: ResMut<BossAnimator>,
    mut field: ResMut<CollectibleField>,
    mut projectiles: Query<(Entity, &mut Projectile)>,
    mut picked: EventWriter<CollectiblePicked>,
    mut mana: EventWriter<ManaChanged>,
    mut notify: EventWriter<NotifyBackend>,
    mut fx: EventWriter<SessionFx>,
    mut vitals: EventWriter<VitalsChanged>,
) {
    if !session.is_running() {
        return;
    }
    let dt = time.delta_secs();
    for (entity, mut projectile) in &mut projectiles {
        projectile.x += projectile.speed * dt;
        projectile.size += projectile.growth * dt;

        // One collectible pickup at most per tick, first match wins
        if let Some(hit) = field.test_collision(projectile.x, projectile.y, projectile.size / 2.0) {
            match hit.kind {
                CollectibleKind::ManaBall => {
                    session.mana.gain(MANA_BALL_REWARD);
                    mana.send(ManaChanged {
                        current: session.mana.current(),
                        max: session.mana.max(),
                    });
                    notify.send(NotifyBackend(Notification::AddMana(MANA_BALL_REWARD)));
                    picked.send(CollectiblePicked {
                        kind: hit.kind,
                        amount: MANA_BALL_REWARD,
                        x: hit.x,
                        y: hit.y,
                    });
                }
                CollectibleKind::HealOrb => {
                    let value = session.player.current() + HEAL_ORB_REWARD;
                    write_player_health(&mut session, value, &mut fx, &mut vitals);
                    picked.send(CollectiblePicked {
                        kind: hit.kind,
                        amount: HEAL_ORB_REWARD,
                        x: hit.x,
                        y: hit.y,
                    });
                }
            }
        }

        if projectile.x > projectile.target_x {
            if let HitResponse::Resisted(halved) = animator.try_hit(projectile.damage) {
                debug!(spell = ?projectile.spell, halved, "boss resisted a mid-attack hit");
            }
            commands.entity(entity).despawn();
        }
    }
}

/// Land strikes whose flash has finished
pub fn tick_strikes(
    time: Res<Time>,
    mut commands: Commands,
    session: Res<GameSession>,
    mut animator: ResMut<BossAnimator>,
    mut strikes: Query<(Entity, &mut Strike)>,
) {
    if !session.is_running() {
        return;
    }
    for (entity, mut strike) in &mut strikes {
        if strike.timer.tick(time.delta()).just_finished() {
            // Zero-damage strikes are pure visuals (combo flashes)
            if strike.damage > 0 {
                if let HitResponse::Resisted(halved) = animator.try_hit(strike.damage) {
                    debug!(spell = ?strike.spell, halved, "boss resisted a mid-attack strike");
                }
            }
            commands.entity(entity).despawn();
        }
    }
}

/// Launch spells whose delay has elapsed
pub fn tick_delayed_launches(
    time: Res<Time>,
    mut commands: Commands,
    session: Res<GameSession>,
    config: Res<BattleConfig>,
    hand: Res<HandPosition>,
    mut launches: Query<(Entity, &mut DelayedLaunch)>,
) {
    if !session.is_running() {
        return;
    }
    for (entity, mut launch) in &mut launches {
        if launch.timer.tick(time.delta()).just_finished() {
            info!(spell = ?launch.spell, damage = launch.damage, "follow-up spell launches");
            match launch.spell {
                SpellKind::IceShard => {
                    commands.spawn(Projectile::ice_shard(launch.damage, hand.0, &config));
                }
                SpellKind::Fireball => {
                    commands.spawn(Projectile::fireball(launch.damage, hand.0, &config));
                }
                SpellKind::Lightning => {
                    commands.spawn(Strike::flash(launch.damage, LIGHTNING_FLASH_DURATION));
                }
            }
            commands.entity(entity).despawn();
        }
    }
}
