use std::env;

use chrono::FixedOffset;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    /// Offset of the service's calendar timezone from UTC, in hours.
    /// "Today" for workout date checks is computed in this timezone.
    pub tz_offset_hours: i32,
    pub progression: ProgressionConfig,
}

/// Tunables for the experience and leveling engine. These are injected
/// everywhere they are needed rather than living as process-wide constants.
#[derive(Clone, Copy, Debug)]
pub struct ProgressionConfig {
    /// Base XP cost of the second level.
    pub level_base: i64,
    /// Linear growth of the per-level cost.
    pub level_scale: i64,
    /// Raw volume points per granted XP.
    pub xp_divisor: f64,
    /// Bodyweight assumed for users with no recorded weight history.
    pub default_bodyweight: f64,
    /// An in-progress workout older than this is force-finished by the sweep.
    pub stale_after_hours: i64,
}

impl Default for ProgressionConfig {
    fn default() -> Self {
        Self {
            level_base: 100,
            level_scale: 10,
            xp_divisor: 50.0,
            default_bodyweight: 40.0,
            stale_after_hours: 2,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, env::VarError> {
        let defaults = ProgressionConfig::default();
        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite:repquest.db?mode=rwc".to_string()),
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .unwrap_or(3000),
            tz_offset_hours: env::var("TZ_OFFSET_HOURS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(0),
            progression: ProgressionConfig {
                level_base: env_or("LEVEL_BASE_XP", defaults.level_base),
                level_scale: env_or("LEVEL_SCALE_XP", defaults.level_scale),
                xp_divisor: env_or("XP_DIVISOR", defaults.xp_divisor),
                default_bodyweight: env_or("DEFAULT_BODYWEIGHT", defaults.default_bodyweight),
                stale_after_hours: env_or("STALE_WORKOUT_HOURS", defaults.stale_after_hours),
            },
        })
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn timezone(&self) -> FixedOffset {
        FixedOffset::east_opt(self.tz_offset_hours * 3600)
            .unwrap_or_else(|| FixedOffset::east_opt(0).unwrap())
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
