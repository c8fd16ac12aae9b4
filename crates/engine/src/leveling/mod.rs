//! Threshold math, progress, grants, and level-up detection
//!
//! All functions here are pure; experience and level are mutated by the
//! engine operations, never by the detector.

use classquest_core::{GrantOutcome, LevelUpEvent, Progress};

use crate::config::EngineConfig;

/// Experience required to clear `level`
///
/// Deterministic and strictly increasing in `level` (the increment is
/// validated non-zero where configs enter the engine).
pub fn required_exp(level: u32, config: &EngineConfig) -> u32 {
    config
        .base_exp
        .saturating_add(level.saturating_mul(config.exp_increment))
}

/// Progress toward clearing `level`, clamped to `[0.0, 1.0]`
pub fn progress(experience: u32, level: u32, config: &EngineConfig) -> Progress {
    let required = required_exp(level, config);
    if required == 0 {
        return Progress::new(1.0);
    }
    Progress::new(f64::from(experience) / f64::from(required))
}

/// Apply an experience grant with the level-up rollover policy
///
/// Reaching the threshold increments the level and resets experience to
/// exactly 0 — no partial carry-over. One grant advances at most one level.
pub fn apply_grant(
    experience: u32,
    level: u32,
    amount: u32,
    config: &EngineConfig,
) -> GrantOutcome {
    let total = experience.saturating_add(amount);
    if total >= required_exp(level, config) {
        GrantOutcome {
            experience: 0,
            level: level.saturating_add(1),
            leveled_up: true,
        }
    } else {
        GrantOutcome {
            experience: total,
            level,
            leveled_up: false,
        }
    }
}

/// Detects level-ups across observed snapshots of one student
///
/// Signals when the observed level strictly increases over the previous
/// observation. The first observation only primes the detector.
#[derive(Debug, Default)]
pub struct LevelUpDetector {
    last_level: Option<u32>,
}

impl LevelUpDetector {
    pub fn new() -> Self {
        Self { last_level: None }
    }

    /// Prime with a known current snapshot so the next observation only
    /// fires on a genuine increase
    pub fn primed(level: u32) -> Self {
        Self {
            last_level: Some(level),
        }
    }

    /// Feed one observed `(experience, level)` snapshot
    pub fn observe(&mut self, _experience: u32, level: u32) -> Option<LevelUpEvent> {
        let fired = match self.last_level {
            Some(previous) if level > previous => Some(LevelUpEvent { new_level: level }),
            _ => None,
        };
        self.last_level = Some(level);
        fired
    }
}

/// Snapshot-only level-up signal for callers with no prior state
///
/// Holds only because grants reset experience to exactly 0 on level-up; a
/// partial carry-over would break it. Prefer `LevelUpDetector` wherever
/// the previous snapshot is available.
pub fn rollover_signaled(experience: u32, level: u32) -> bool {
    experience == 0 && level > 0
}
