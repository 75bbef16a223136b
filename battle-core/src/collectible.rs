//! Transient pickups: mana balls and heal orbs.
//!
//! The field owns every live collectible. Spawn checks run on successful
//! poll frames; TTL expiry runs every frame. Collision testing is plain
//! circle-vs-circle against a projectile's current center, first match
//! wins, and a collected orb is removed before the caller sees it: one
//! collection per collectible, at most one per projectile tick.

use bevy::prelude::*;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::BattleConfig;

/// Mana granted per mana ball
pub const MANA_BALL_REWARD: i32 = 20;
/// Health restored per heal orb
pub const HEAL_ORB_REWARD: i32 = 25;

const MANA_BALL_RADIUS: f32 = 20.0;
const HEAL_ORB_RADIUS: f32 = 22.5;
const MANA_BALL_TTL: f32 = 10.0;
const HEAL_ORB_TTL: f32 = 12.0;
/// Mana balls respawn after a randomized 4-8s gap
const MANA_BALL_SPAWN_MIN: f32 = 4.0;
const MANA_BALL_SPAWN_MAX: f32 = 8.0;
const HEAL_ORB_SPAWN_INTERVAL: f32 = 6.0;
/// Vertical margin kept clear at the arena's top and bottom
const SPAWN_MARGIN_Y: f32 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CollectibleKind {
    ManaBall,
    HealOrb,
}

impl CollectibleKind {
    pub fn radius(&self) -> f32 {
        match self {
            CollectibleKind::ManaBall => MANA_BALL_RADIUS,
            CollectibleKind::HealOrb => HEAL_ORB_RADIUS,
        }
    }

    pub fn ttl(&self) -> f32 {
        match self {
            CollectibleKind::ManaBall => MANA_BALL_TTL,
            CollectibleKind::HealOrb => HEAL_ORB_TTL,
        }
    }

    /// Horizontal spawn band as fractions of the arena width; mana balls
    /// bias toward the boss side, heal orbs toward the center
    fn x_band(&self) -> (f32, f32) {
        match self {
            CollectibleKind::ManaBall => (0.6, 0.9),
            CollectibleKind::HealOrb => (0.3, 0.7),
        }
    }
}

/// One live pickup
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Collectible {
    pub id: u64,
    pub kind: CollectibleKind,
    pub x: f32,
    pub y: f32,
    pub radius: f32,
    ttl: f32,
}

/// Spawned on a successful spawn check (display)
#[derive(Event, Debug, Clone, Copy)]
pub struct CollectibleSpawned {
    pub kind: CollectibleKind,
    pub x: f32,
    pub y: f32,
}

/// A projectile intersected a pickup and the reward applied (display)
#[derive(Event, Debug, Clone, Copy)]
pub struct CollectiblePicked {
    pub kind: CollectibleKind,
    pub amount: i32,
    pub x: f32,
    pub y: f32,
}

/// Owner of all live collectibles and their spawn clocks
#[derive(Resource, Debug)]
pub struct CollectibleField {
    items: Vec<Collectible>,
    next_id: u64,
    since_mana_spawn: f32,
    next_mana_interval: f32,
    since_heal_spawn: f32,
}

impl Default for CollectibleField {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            next_id: 0,
            since_mana_spawn: 0.0,
            next_mana_interval: MANA_BALL_SPAWN_MIN,
            since_heal_spawn: 0.0,
        }
    }
}

impl CollectibleField {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Collectible> {
        self.items.iter()
    }

    /// Place a new collectible inside its kind's spawn region
    pub fn spawn(
        &mut self,
        kind: CollectibleKind,
        config: &BattleConfig,
        rng: &mut impl Rng,
    ) -> Collectible {
        let (lo, hi) = kind.x_band();
        let x = rng.gen_range(config.arena_width * lo..config.arena_width * hi);
        let y = rng.gen_range(SPAWN_MARGIN_Y..config.arena_height - SPAWN_MARGIN_Y);
        let item = Collectible {
            id: self.next_id,
            kind,
            x,
            y,
            radius: kind.radius(),
            ttl: kind.ttl(),
        };
        self.next_id += 1;
        self.items.push(item);
        item
    }

    /// Periodic spawn check, run once per successful poll frame
    pub fn run_spawn_checks(
        &mut self,
        config: &BattleConfig,
        rng: &mut impl Rng,
    ) -> Vec<Collectible> {
        let mut spawned = Vec::new();
        if self.since_mana_spawn >= self.next_mana_interval {
            self.since_mana_spawn = 0.0;
            self.next_mana_interval = rng.gen_range(MANA_BALL_SPAWN_MIN..MANA_BALL_SPAWN_MAX);
            spawned.push(self.spawn(CollectibleKind::ManaBall, config, rng));
        }
        if self.since_heal_spawn >= HEAL_ORB_SPAWN_INTERVAL {
            self.since_heal_spawn = 0.0;
            spawned.push(self.spawn(CollectibleKind::HealOrb, config, rng));
        }
        spawned
    }

    /// Advance spawn clocks and expire stale collectibles
    pub fn tick(&mut self, delta: f32) -> Vec<Collectible> {
        self.since_mana_spawn += delta;
        self.since_heal_spawn += delta;
        let mut expired = Vec::new();
        self.items.retain_mut(|item| {
            item.ttl -= delta;
            if item.ttl <= 0.0 {
                expired.push(*item);
                false
            } else {
                true
            }
        });
        expired
    }

    /// First live collectible overlapping the given circle, removed on hit
    pub fn test_collision(&mut self, x: f32, y: f32, radius: f32) -> Option<Collectible> {
        let hit = self.items.iter().position(|item| {
            let distance = (x - item.x).hypot(y - item.y);
            distance < radius + item.radius
        })?;
        Some(self.items.remove(hit))
    }
}

/// Expire stale collectibles every frame
pub fn tick_field(
    time: Res<Time>,
    session: Res<crate::session::GameSession>,
    mut field: ResMut<CollectibleField>,
) {
    if !session.is_running() {
        return;
    }
    for expired in field.tick(time.delta_secs()) {
        tracing::trace!(kind = ?expired.kind, id = expired.id, "collectible expired");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256PlusPlus;

    fn rng() -> Xoshiro256PlusPlus {
        Xoshiro256PlusPlus::seed_from_u64(42)
    }

    #[test]
    fn spawns_land_inside_their_kind_region() {
        let config = BattleConfig::default();
        let mut field = CollectibleField::default();
        let mut rng = rng();
        for _ in 0..50 {
            let ball = field.spawn(CollectibleKind::ManaBall, &config, &mut rng);
            assert!(ball.x >= config.arena_width * 0.6 && ball.x < config.arena_width * 0.9);
            assert!(ball.y >= 100.0 && ball.y < config.arena_height - 100.0);
            let orb = field.spawn(CollectibleKind::HealOrb, &config, &mut rng);
            assert!(orb.x >= config.arena_width * 0.3 && orb.x < config.arena_width * 0.7);
        }
    }

    #[test]
    fn collision_is_strict_sum_of_radii() {
        let config = BattleConfig::default();
        let mut field = CollectibleField::default();
        let mut rng = rng();
        let ball = field.spawn(CollectibleKind::ManaBall, &config, &mut rng);
        // Exactly touching: not a hit (< not <=)
        let miss = field.test_collision(ball.x + ball.radius + 10.0, ball.y, 10.0);
        assert!(miss.is_none());
        let hit = field.test_collision(ball.x + ball.radius + 9.9, ball.y, 10.0);
        assert_eq!(hit.map(|c| c.id), Some(ball.id));
    }

    #[test]
    fn collected_collectibles_cannot_be_hit_twice() {
        let config = BattleConfig::default();
        let mut field = CollectibleField::default();
        let mut rng = rng();
        let ball = field.spawn(CollectibleKind::ManaBall, &config, &mut rng);
        assert!(field.test_collision(ball.x, ball.y, 50.0).is_some());
        assert!(field.test_collision(ball.x, ball.y, 50.0).is_none());
        assert!(field.is_empty());
    }

    #[test]
    fn first_match_wins_across_kinds() {
        let mut field = CollectibleField::default();
        field.items.push(Collectible {
            id: 0,
            kind: CollectibleKind::ManaBall,
            x: 100.0,
            y: 100.0,
            radius: 20.0,
            ttl: 10.0,
        });
        field.items.push(Collectible {
            id: 1,
            kind: CollectibleKind::HealOrb,
            x: 110.0,
            y: 100.0,
            radius: 22.5,
            ttl: 12.0,
        });
        let hit = field.test_collision(105.0, 100.0, 30.0).unwrap();
        assert_eq!(hit.id, 0);
        assert_eq!(field.len(), 1);
    }

    #[test]
    fn reset_clears_the_field_and_its_clocks() {
        let config = BattleConfig::default();
        let mut field = CollectibleField::default();
        let mut rng = rng();
        field.tick(30.0);
        field.run_spawn_checks(&config, &mut rng);
        assert!(!field.is_empty());
        field.reset();
        assert!(field.is_empty());
        assert_eq!(field.iter().count(), 0);
        // Spawn clocks start over
        assert!(field.run_spawn_checks(&config, &mut rng).is_empty());
    }

    #[test]
    fn ttl_expiry_removes_exactly_the_stale_ones() {
        let config = BattleConfig::default();
        let mut field = CollectibleField::default();
        let mut rng = rng();
        field.spawn(CollectibleKind::ManaBall, &config, &mut rng); // ttl 10
        field.spawn(CollectibleKind::HealOrb, &config, &mut rng); // ttl 12
        assert!(field.tick(9.9).is_empty());
        let expired = field.tick(0.2);
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].kind, CollectibleKind::ManaBall);
        let expired = field.tick(2.0);
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].kind, CollectibleKind::HealOrb);
        assert!(field.is_empty());
    }

    #[test]
    fn spawn_checks_honor_their_intervals() {
        let config = BattleConfig::default();
        let mut field = CollectibleField::default();
        let mut rng = rng();
        // Nothing before the first interval elapses
        field.tick(3.0);
        assert!(field.run_spawn_checks(&config, &mut rng).is_empty());
        // Mana ball due some time within the 4-8s band; heal orb at 6s
        field.tick(5.0);
        let spawned = field.run_spawn_checks(&config, &mut rng);
        assert!(spawned.iter().any(|c| c.kind == CollectibleKind::ManaBall));
        field.tick(6.0);
        let spawned = field.run_spawn_checks(&config, &mut rng);
        assert!(spawned.iter().any(|c| c.kind == CollectibleKind::HealOrb));
    }

    proptest! {
        #[test]
        fn collision_never_returns_a_non_overlapping_item(
            px in 0.0f32..1200.0,
            py in 0.0f32..700.0,
            radius in 1.0f32..80.0,
        ) {
            let config = BattleConfig::default();
            let mut field = CollectibleField::default();
            let mut rng = rng();
            for _ in 0..8 {
                field.spawn(CollectibleKind::ManaBall, &config, &mut rng);
                field.spawn(CollectibleKind::HealOrb, &config, &mut rng);
            }
            if let Some(hit) = field.test_collision(px, py, radius) {
                let distance = (px - hit.x).hypot(py - hit.y);
                prop_assert!(distance < radius + hit.radius);
            }
        }
    }
}
