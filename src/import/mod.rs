pub mod config;
pub mod goals;
pub mod habits;
pub mod streaks;
pub mod warn;
