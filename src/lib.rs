pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod import;
pub mod logging;

pub use application::BudgetSession;
pub use config::{Config, ImportConfig};
pub use domain::*;
