pub mod bot;
pub mod policy;

pub use bot::{AdvisorSettings, DrawOutcome, RevealTracker};
pub use policy::{Action, AdvisorPolicy, HeuristicPolicy, HeuristicStyle, Policy, PolicyContext};
