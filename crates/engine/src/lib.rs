pub mod audit;
pub mod clock;
pub mod cooldown;
pub mod directory;
pub mod dispatch;
mod engine;
pub mod inbox;
pub mod rules;

pub use engine::{EngineConfig, RuleEngine, RuleOutcome, RuleStatus};
