pub mod achievements;
pub mod exercises;
pub mod health;
pub mod progression;
pub mod workouts;
