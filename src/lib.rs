//! Referee for a territorial-conquest game backed by Postgres.
//!
//! Players join with a nation, raise armies, move them between neighboring
//! territories and attack each other's holdings. [`Referee::process`] checks
//! each [`Action`] against the rules and applies it atomically.

pub mod action;
pub mod combat;
pub mod config;
pub mod db;
pub mod error;
mod referee;

pub use action::{Action, ActionKind, ActionResult};
pub use combat::{FixedRoll, RandomSource, RngSource};
pub use config::{ConfigError, GameConfig, Territory};
pub use error::ActionError;
pub use referee::Referee;
