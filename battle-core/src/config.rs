//! Centralized battle tunables.
//!
//! Per-spell damage values live in `spell` and collectible rewards in
//! `collectible` as the single source of truth; this struct carries the
//! knobs a driver is expected to vary between sessions.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Configuration for one battle session
#[derive(Resource, Debug, Clone, Serialize, Deserialize)]
pub struct BattleConfig {
    /// Player health cap
    pub max_player_health: i32,
    /// Boss health cap
    pub max_boss_health: i32,
    /// Mana the session opens with
    pub starting_mana: i32,
    /// Mana cap used until the backend pushes its own
    pub max_mana: i32,
    /// Arena width in pixels (projectile flight + collectible placement)
    pub arena_width: f32,
    /// Arena height in pixels
    pub arena_height: f32,
    /// Seconds between autonomous boss-attack rolls
    pub attack_check_interval: f32,
    /// Seconds the player gets to confirm the finisher
    pub finisher_time_limit: f32,
    /// Seed for the session RNG (attack rolls, spawn positions)
    pub rng_seed: u64,
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self {
            max_player_health: 250,
            max_boss_health: 200,
            starting_mana: 100,
            max_mana: 100,
            arena_width: 1200.0,
            arena_height: 700.0,
            attack_check_interval: 1.5,
            finisher_time_limit: 10.0,
            rng_seed: 0xa2c4_7a6e,
        }
    }
}
