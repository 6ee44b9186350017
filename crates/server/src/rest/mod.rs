mod health;
mod metrics;
mod notifiers;
mod router;
mod rules;
mod vulns;

pub use router::{router, AppState};
