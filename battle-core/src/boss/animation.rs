//! Boss sprite-animation state machine.
//!
//! Exactly one animation owns the boss at a time. The machine is the sole
//! authority for when damage lands: a hit's boss damage applies on hit
//! completion, an attack's player damage on cleave/walk completion. A hit
//! arriving mid-attack does not interrupt; its damage is halved and applied
//! after a fixed delay approximating the attack's remaining duration.
//!
//! Expressed as plain state + `try_*` transitions returning what happened,
//! driven by `tick` with the frame clock; no timer mechanism leaks out.

use bevy::prelude::*;
use std::time::Duration;

use crate::phase::{BossAttack, BossPhase};

pub const IDLE_FRAMES: u32 = 6;
pub const HIT_FRAMES: u32 = 5;
pub const HIT_FRAME_INTERVAL: f32 = 0.100;
pub const CLEAVE_FRAMES: u32 = 15;
pub const WALK_FRAMES: u32 = 12;
/// The walk attack loops its sheet twice
pub const WALK_LOOPS: u32 = 2;
pub const DEATH_FRAMES: u32 = 22;
pub const DEATH_FRAME_INTERVAL: f32 = 0.100;
/// Hold + final fade/shrink after the last death frame, before completion
pub const DEATH_TAIL: f32 = 0.7;
/// Delay before a resisted (mid-attack) hit lands, roughly the cleave length
pub const RESIST_DELAY: f32 = 1.2;
/// Mid-attack hits land at half strength
pub const RESIST_FACTOR: f32 = 0.5;
/// Each cleave of a double attack carries this fraction of the rolled damage
pub const DOUBLE_FACTOR: f32 = 0.6;
/// Finisher blast length before the death sequence begins
pub const FINISHER_BLAST_DURATION: f32 = 0.96;

/// Active boss animation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum BossAnimation {
    #[default]
    Idle,
    Hit,
    Cleave,
    Walk,
    Death,
    /// Finisher blast; terminal, chains into `Death`
    Finisher,
}

/// What a `try_hit` call did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitResponse {
    /// Hit animation started; damage lands on completion
    Started,
    /// Boss was mid-attack: halved damage queued for delayed application
    Resisted(i32),
    /// Dropped (already hitting, or dying)
    Ignored,
}

/// Effects emitted by `tick`, applied by the driving system
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimEffect {
    /// Sprite frame advanced (display only)
    Sprite { state: BossAnimation, frame: u32 },
    /// Boss damage is due (hit completion or resisted-hit delay elapsing)
    BossDamage { amount: i32, resisted: bool },
    /// Player damage is due (cleave/walk completion)
    PlayerDamage { amount: i32 },
    /// Death sequence fully played out; the match may resolve
    DeathFinished,
}

#[derive(Debug, Clone, Copy)]
struct DeferredHit {
    remaining: f32,
    amount: i32,
}

/// The boss entity's animation state
#[derive(Resource, Debug)]
pub struct BossAnimator {
    state: BossAnimation,
    frame: u32,
    total_frames: u32,
    frame_timer: Timer,
    pending_boss_damage: i32,
    pending_player_damage: i32,
    /// Second cleave of a double attack, started when the first completes
    queued_cleave: Option<i32>,
    deferred: Vec<DeferredHit>,
    idle_frame: u32,
    idle_timer: Timer,
    death_tail: Option<Timer>,
    death_reported: bool,
}

impl BossAnimator {
    pub fn new(phase: BossPhase) -> Self {
        Self {
            state: BossAnimation::Idle,
            frame: 0,
            total_frames: 0,
            frame_timer: Timer::from_seconds(HIT_FRAME_INTERVAL, TimerMode::Repeating),
            pending_boss_damage: 0,
            pending_player_damage: 0,
            queued_cleave: None,
            deferred: Vec::new(),
            idle_frame: 0,
            idle_timer: Timer::from_seconds(phase.idle_frame_interval(), TimerMode::Repeating),
            death_tail: None,
            death_reported: false,
        }
    }

    pub fn state(&self) -> BossAnimation {
        self.state
    }

    /// Incoming spell damage. Never interrupts an attack or the death
    /// sequence; re-entry while already hitting is silently dropped.
    pub fn try_hit(&mut self, damage: i32) -> HitResponse {
        match self.state {
            BossAnimation::Death | BossAnimation::Finisher => HitResponse::Ignored,
            BossAnimation::Hit => HitResponse::Ignored,
            BossAnimation::Cleave | BossAnimation::Walk => {
                let halved = (damage as f32 * RESIST_FACTOR).floor() as i32;
                self.deferred.push(DeferredHit {
                    remaining: RESIST_DELAY,
                    amount: halved,
                });
                HitResponse::Resisted(halved)
            }
            BossAnimation::Idle => {
                self.state = BossAnimation::Hit;
                self.frame = 0;
                self.total_frames = HIT_FRAMES;
                self.frame_timer = Timer::from_seconds(HIT_FRAME_INTERVAL, TimerMode::Repeating);
                self.pending_boss_damage = damage;
                HitResponse::Started
            }
        }
    }

    /// Boss-initiated attack. Dropped while an attack or the death sequence
    /// is active; entering cancels an in-flight hit (its damage is lost).
    pub fn try_attack(&mut self, attack: BossAttack, damage: i32, phase: BossPhase) -> bool {
        match self.state {
            BossAnimation::Death | BossAnimation::Finisher => false,
            BossAnimation::Cleave | BossAnimation::Walk => false,
            BossAnimation::Idle | BossAnimation::Hit => {
                self.pending_boss_damage = 0;
                match attack {
                    BossAttack::Cleave => self.begin_cleave(damage, phase),
                    BossAttack::Walk => {
                        self.state = BossAnimation::Walk;
                        self.frame = 0;
                        self.total_frames = WALK_FRAMES * WALK_LOOPS;
                        self.frame_timer =
                            Timer::from_seconds(phase.walk_frame_interval(), TimerMode::Repeating);
                        self.pending_player_damage = damage;
                    }
                    BossAttack::Double => {
                        let part = (damage as f32 * DOUBLE_FACTOR).floor() as i32;
                        self.begin_cleave(part, phase);
                        self.queued_cleave = Some(part);
                    }
                }
                true
            }
        }
    }

    fn begin_cleave(&mut self, damage: i32, phase: BossPhase) {
        self.state = BossAnimation::Cleave;
        self.frame = 0;
        self.total_frames = CLEAVE_FRAMES;
        self.frame_timer = Timer::from_seconds(phase.cleave_frame_interval(), TimerMode::Repeating);
        self.pending_player_damage = damage;
    }

    /// Enter the finisher blast; chains into the death sequence on its own
    pub fn start_finisher_blast(&mut self) -> bool {
        if matches!(self.state, BossAnimation::Death | BossAnimation::Finisher) {
            return false;
        }
        self.clear_combat_timers();
        self.state = BossAnimation::Finisher;
        self.frame_timer = Timer::from_seconds(FINISHER_BLAST_DURATION, TimerMode::Once);
        true
    }

    /// Terminal death sequence; stops every other timer
    pub fn start_death(&mut self) -> bool {
        if self.state == BossAnimation::Death {
            return false;
        }
        self.clear_combat_timers();
        self.state = BossAnimation::Death;
        self.frame = 0;
        self.total_frames = DEATH_FRAMES;
        self.frame_timer = Timer::from_seconds(DEATH_FRAME_INTERVAL, TimerMode::Repeating);
        self.death_tail = None;
        true
    }

    fn clear_combat_timers(&mut self) {
        self.pending_boss_damage = 0;
        self.pending_player_damage = 0;
        self.queued_cleave = None;
        self.deferred.clear();
        self.idle_timer.pause();
    }

    /// Restart the idle cadence at the phase's speed (phase transitions)
    pub fn restart_idle(&mut self, phase: BossPhase) {
        if matches!(self.state, BossAnimation::Death | BossAnimation::Finisher) {
            return;
        }
        self.idle_frame = 0;
        self.idle_timer = Timer::from_seconds(phase.idle_frame_interval(), TimerMode::Repeating);
    }

    /// Advance all animation clocks by `delta`
    pub fn tick(&mut self, delta: Duration, phase: BossPhase, effects: &mut Vec<AnimEffect>) {
        // Resisted hits land on their own clock, independent of the state
        let dt = delta.as_secs_f32();
        let mut landed = Vec::new();
        self.deferred.retain_mut(|hit| {
            hit.remaining -= dt;
            if hit.remaining <= 0.0 {
                landed.push(hit.amount);
                false
            } else {
                true
            }
        });
        for amount in landed {
            effects.push(AnimEffect::BossDamage {
                amount,
                resisted: true,
            });
        }

        match self.state {
            BossAnimation::Idle => {
                let ticks = self.idle_timer.tick(delta).times_finished_this_tick();
                for _ in 0..ticks {
                    self.idle_frame = (self.idle_frame + 1) % IDLE_FRAMES;
                    effects.push(AnimEffect::Sprite {
                        state: BossAnimation::Idle,
                        frame: self.idle_frame,
                    });
                }
            }
            BossAnimation::Hit => {
                if self.advance_sequence(delta, effects) {
                    let amount = std::mem::take(&mut self.pending_boss_damage);
                    self.state = BossAnimation::Idle;
                    if amount > 0 {
                        effects.push(AnimEffect::BossDamage {
                            amount,
                            resisted: false,
                        });
                    }
                }
            }
            BossAnimation::Cleave | BossAnimation::Walk => {
                let was_cleave = self.state == BossAnimation::Cleave;
                if self.advance_sequence(delta, effects) {
                    let amount = std::mem::take(&mut self.pending_player_damage);
                    self.state = BossAnimation::Idle;
                    if amount > 0 {
                        effects.push(AnimEffect::PlayerDamage { amount });
                    }
                    if was_cleave {
                        if let Some(queued) = self.queued_cleave.take() {
                            self.begin_cleave(queued, phase);
                        }
                    }
                }
            }
            BossAnimation::Finisher => {
                if self.frame_timer.tick(delta).just_finished() {
                    self.start_death();
                }
            }
            BossAnimation::Death => match self.death_tail.as_mut() {
                None => {
                    if self.advance_sequence(delta, effects) {
                        self.death_tail = Some(Timer::from_seconds(DEATH_TAIL, TimerMode::Once));
                    }
                }
                Some(tail) => {
                    if tail.tick(delta).just_finished() && !self.death_reported {
                        self.death_reported = true;
                        effects.push(AnimEffect::DeathFinished);
                    }
                }
            },
        }
    }

    /// Step the active frame sequence; true when the last frame has played
    fn advance_sequence(&mut self, delta: Duration, effects: &mut Vec<AnimEffect>) -> bool {
        let ticks = self.frame_timer.tick(delta).times_finished_this_tick();
        for _ in 0..ticks {
            self.frame += 1;
            if self.frame >= self.total_frames {
                return true;
            }
            effects.push(AnimEffect::Sprite {
                state: self.state,
                frame: self.frame,
            });
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(animator: &mut BossAnimator, seconds: f32, phase: BossPhase) -> Vec<AnimEffect> {
        let mut effects = Vec::new();
        let mut remaining = seconds;
        while remaining > 0.0 {
            animator.tick(Duration::from_millis(16), phase, &mut effects);
            remaining -= 0.016;
        }
        effects
    }

    fn boss_damage_total(effects: &[AnimEffect]) -> i32 {
        effects
            .iter()
            .filter_map(|e| match e {
                AnimEffect::BossDamage { amount, .. } => Some(*amount),
                _ => None,
            })
            .sum()
    }

    fn player_damage_total(effects: &[AnimEffect]) -> i32 {
        effects
            .iter()
            .filter_map(|e| match e {
                AnimEffect::PlayerDamage { amount } => Some(*amount),
                _ => None,
            })
            .sum()
    }

    #[test]
    fn hit_applies_damage_only_on_completion() {
        let mut animator = BossAnimator::new(BossPhase::Normal);
        assert_eq!(animator.try_hit(10), HitResponse::Started);
        let effects = drain(&mut animator, 0.3, BossPhase::Normal);
        assert_eq!(boss_damage_total(&effects), 0);
        let effects = drain(&mut animator, 0.4, BossPhase::Normal);
        assert_eq!(boss_damage_total(&effects), 10);
        assert_eq!(animator.state(), BossAnimation::Idle);
    }

    #[test]
    fn hit_while_hitting_is_dropped() {
        let mut animator = BossAnimator::new(BossPhase::Normal);
        animator.try_hit(10);
        assert_eq!(animator.try_hit(99), HitResponse::Ignored);
        let effects = drain(&mut animator, 1.0, BossPhase::Normal);
        assert_eq!(boss_damage_total(&effects), 10);
    }

    #[test]
    fn hit_during_cleave_is_halved_and_deferred() {
        let mut animator = BossAnimator::new(BossPhase::Normal);
        assert!(animator.try_attack(BossAttack::Cleave, 20, BossPhase::Normal));
        assert_eq!(animator.try_hit(15), HitResponse::Resisted(7));
        // The state never leaves cleave because of the hit
        assert_eq!(animator.state(), BossAnimation::Cleave);
        // Cleave runs 1.2s at phase-1 cadence; the deferred hit lands at 1.2s
        let effects = drain(&mut animator, 1.3, BossPhase::Normal);
        assert_eq!(player_damage_total(&effects), 20);
        assert!(effects.contains(&AnimEffect::BossDamage {
            amount: 7,
            resisted: true
        }));
    }

    #[test]
    fn attack_entry_cancels_pending_hit_damage() {
        let mut animator = BossAnimator::new(BossPhase::Normal);
        animator.try_hit(10);
        assert!(animator.try_attack(BossAttack::Cleave, 20, BossPhase::Normal));
        let effects = drain(&mut animator, 2.0, BossPhase::Normal);
        // The interrupted hit never lands; the cleave does
        assert_eq!(boss_damage_total(&effects), 0);
        assert_eq!(player_damage_total(&effects), 20);
    }

    #[test]
    fn attacks_do_not_queue_or_interrupt_each_other() {
        let mut animator = BossAnimator::new(BossPhase::Normal);
        assert!(animator.try_attack(BossAttack::Cleave, 20, BossPhase::Normal));
        assert!(!animator.try_attack(BossAttack::Walk, 25, BossPhase::Normal));
        assert!(!animator.try_attack(BossAttack::Cleave, 25, BossPhase::Normal));
        let effects = drain(&mut animator, 2.5, BossPhase::Normal);
        assert_eq!(player_damage_total(&effects), 20);
    }

    #[test]
    fn walk_applies_damage_after_two_loops() {
        let mut animator = BossAnimator::new(BossPhase::Enraged);
        assert!(animator.try_attack(BossAttack::Walk, 18, BossPhase::Enraged));
        // 24 steps at 70ms: not done at 1.5s, done by 1.8s
        let effects = drain(&mut animator, 1.5, BossPhase::Enraged);
        assert_eq!(player_damage_total(&effects), 0);
        let effects = drain(&mut animator, 0.3, BossPhase::Enraged);
        assert_eq!(player_damage_total(&effects), 18);
    }

    #[test]
    fn double_attack_plays_two_sequential_cleaves() {
        let mut animator = BossAnimator::new(BossPhase::FinalForm);
        assert!(animator.try_attack(BossAttack::Double, 20, BossPhase::FinalForm));
        // First cleave: 15 frames at 65ms = 0.975s
        let effects = drain(&mut animator, 1.0, BossPhase::FinalForm);
        assert_eq!(player_damage_total(&effects), 12);
        assert_eq!(animator.state(), BossAnimation::Cleave);
        let effects = drain(&mut animator, 1.1, BossPhase::FinalForm);
        assert_eq!(player_damage_total(&effects), 12);
        assert_eq!(animator.state(), BossAnimation::Idle);
    }

    #[test]
    fn death_ignores_everything_and_reports_once() {
        let mut animator = BossAnimator::new(BossPhase::FinalForm);
        assert!(animator.start_death());
        assert!(!animator.start_death());
        assert_eq!(animator.try_hit(50), HitResponse::Ignored);
        assert!(!animator.try_attack(BossAttack::Cleave, 20, BossPhase::FinalForm));
        // 22 frames at 100ms + 0.7s tail
        let effects = drain(&mut animator, 3.2, BossPhase::FinalForm);
        let reports = effects
            .iter()
            .filter(|e| **e == AnimEffect::DeathFinished)
            .count();
        assert_eq!(reports, 1);
        // No further reports on later ticks
        let effects = drain(&mut animator, 1.0, BossPhase::FinalForm);
        assert!(!effects.contains(&AnimEffect::DeathFinished));
    }

    #[test]
    fn death_drops_deferred_and_queued_damage() {
        let mut animator = BossAnimator::new(BossPhase::Normal);
        animator.try_attack(BossAttack::Cleave, 20, BossPhase::Normal);
        animator.try_hit(10);
        animator.start_death();
        let effects = drain(&mut animator, 4.0, BossPhase::Normal);
        assert_eq!(boss_damage_total(&effects), 0);
        assert_eq!(player_damage_total(&effects), 0);
    }

    #[test]
    fn finisher_blast_chains_into_death() {
        let mut animator = BossAnimator::new(BossPhase::FinalForm);
        assert!(animator.start_finisher_blast());
        assert!(!animator.start_finisher_blast());
        let effects = drain(&mut animator, 1.0, BossPhase::FinalForm);
        assert!(effects.is_empty());
        assert_eq!(animator.state(), BossAnimation::Death);
        let effects = drain(&mut animator, 3.0, BossPhase::FinalForm);
        assert!(effects.contains(&AnimEffect::DeathFinished));
    }

    #[test]
    fn idle_frames_loop_at_the_phase_cadence() {
        let mut animator = BossAnimator::new(BossPhase::Normal);
        let effects = drain(&mut animator, 0.9, BossPhase::Normal);
        let idle_frames = effects
            .iter()
            .filter(|e| matches!(e, AnimEffect::Sprite { state, .. } if *state == BossAnimation::Idle))
            .count();
        // 0.9s at 150ms per frame
        assert_eq!(idle_frames, 6);
    }
}
