use serde::Serialize;

use crate::config::ProgressionConfig;

/// Mapping between cumulative experience and level. The per-level cost
/// grows linearly, so the cumulative cost grows quadratically.
#[derive(Clone, Copy, Debug)]
pub struct LevelCurve {
    base: i64,
    scale: i64,
}

impl LevelCurve {
    pub fn new(base: i64, scale: i64) -> Self {
        Self { base, scale }
    }

    pub fn from_config(config: &ProgressionConfig) -> Self {
        Self::new(config.level_base, config.level_scale)
    }

    /// Cumulative XP required to reach `level`. Level 1 is free.
    pub fn xp_for_level(&self, level: i64) -> i64 {
        if level <= 1 {
            return 0;
        }
        (self.base + self.scale * (level - 1)) * (level - 1)
    }

    /// Greatest level whose cumulative cost does not exceed `xp`.
    /// Monotonicity of `xp_for_level` makes the upward scan exact.
    pub fn level_for_xp(&self, xp: i64) -> i64 {
        let mut level = 1;
        while self.xp_for_level(level + 1) <= xp {
            level += 1;
        }
        level
    }

    /// Fraction of the way from the current level to the next, rounded to
    /// two decimals for display.
    pub fn progress_fraction(&self, xp: i64) -> f64 {
        let level = self.level_for_xp(xp);
        let floor = self.xp_for_level(level);
        let ceil = self.xp_for_level(level + 1);
        let fraction = (xp - floor) as f64 / (ceil - floor) as f64;
        (fraction * 100.0).round() / 100.0
    }

    pub fn missing_xp(&self, xp: i64) -> i64 {
        let level = self.level_for_xp(xp);
        self.xp_for_level(level + 1) - xp
    }

    pub fn snapshot(&self, xp: i64) -> LevelSnapshot {
        LevelSnapshot {
            level: self.level_for_xp(xp),
            exp: xp,
            progress: self.progress_fraction(xp),
            missing_xp: self.missing_xp(xp),
        }
    }
}

impl Default for LevelCurve {
    fn default() -> Self {
        Self::from_config(&ProgressionConfig::default())
    }
}

/// Read model of a user's position on the curve.
#[derive(Debug, Clone, Serialize)]
pub struct LevelSnapshot {
    pub level: i64,
    pub exp: i64,
    pub progress: f64,
    pub missing_xp: i64,
}
