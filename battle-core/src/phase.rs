//! Boss phase controller.
//!
//! The phase is a pure step function of the boss health ratio, re-derived on
//! every boss-health write (heals included). Each phase carries the boss's
//! tuning: idle/attack animation cadences and the autonomous attack table.

use bevy::prelude::*;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Discrete boss difficulty tier
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum BossPhase {
    /// Above 66% health
    #[default]
    Normal,
    /// (33%, 66%]
    Enraged,
    /// 33% and below
    FinalForm,
}

/// Autonomous attack kinds rolled from the phase table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BossAttack {
    Cleave,
    Walk,
    /// Two sequential cleaves at reduced damage each
    Double,
}

/// Fired exactly once per phase boundary crossing
#[derive(Event, Debug, Clone, Copy)]
pub struct PhaseChanged {
    pub phase: BossPhase,
}

impl BossPhase {
    /// Derive the phase from `health / max_health`
    pub fn for_ratio(ratio: f32) -> Self {
        if ratio > 0.66 {
            BossPhase::Normal
        } else if ratio > 0.33 {
            BossPhase::Enraged
        } else {
            BossPhase::FinalForm
        }
    }

    pub fn number(&self) -> u8 {
        match self {
            BossPhase::Normal => 1,
            BossPhase::Enraged => 2,
            BossPhase::FinalForm => 3,
        }
    }

    /// Seconds between idle sprite frames; later phases idle faster
    pub fn idle_frame_interval(&self) -> f32 {
        match self {
            BossPhase::Normal => 0.150,
            _ => 0.120,
        }
    }

    /// Seconds between cleave sprite frames
    pub fn cleave_frame_interval(&self) -> f32 {
        match self {
            BossPhase::Normal => 0.080,
            _ => 0.065,
        }
    }

    /// Seconds between walk-attack sprite frames
    pub fn walk_frame_interval(&self) -> f32 {
        match self {
            BossPhase::FinalForm => 0.050,
            _ => 0.070,
        }
    }

    /// Probability that an autonomous attack fires per 1.5s check
    pub fn attack_chance(&self) -> f32 {
        match self {
            BossPhase::Normal => 0.50,
            BossPhase::Enraged => 0.65,
            BossPhase::FinalForm => 0.75,
        }
    }

    /// Roll the attack type from this phase's pattern table
    pub fn roll_attack(&self, rng: &mut impl Rng) -> BossAttack {
        match self {
            BossPhase::Normal => BossAttack::Cleave,
            BossPhase::Enraged => {
                if rng.gen::<f32>() < 0.70 {
                    BossAttack::Cleave
                } else {
                    BossAttack::Walk
                }
            }
            BossPhase::FinalForm => {
                let roll = rng.gen::<f32>();
                if roll < 0.60 {
                    BossAttack::Cleave
                } else if roll < 0.85 {
                    BossAttack::Walk
                } else {
                    BossAttack::Double
                }
            }
        }
    }

    /// Transition banner text, if this phase announces itself
    pub fn banner(&self) -> Option<&'static str> {
        match self {
            BossPhase::Normal => None,
            BossPhase::Enraged => Some("ENRAGED"),
            BossPhase::FinalForm => Some("FINAL FORM"),
        }
    }
}
