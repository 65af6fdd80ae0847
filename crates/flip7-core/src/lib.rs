#![deny(warnings)]
pub mod model;
pub mod odds;
pub mod strategy;

pub use model::observation::Observation;
pub use strategy::{Advisor, ProbabilityModel, Recommendation, StrategyConfig, StrategyResult, advise};
