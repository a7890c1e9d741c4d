pub mod achievements;
pub mod grants;
pub mod leveling;
pub mod multiplier;

pub use grants::GrantCalculator;
pub use leveling::{LevelCurve, LevelSnapshot};
