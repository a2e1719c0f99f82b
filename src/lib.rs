pub mod config;
pub mod documents;
pub mod error;
pub mod generation;
pub mod meals;
pub mod normalize;
pub mod ollama;
pub mod pipeline;
pub mod prices;
pub mod prompts;
pub mod selection;
pub mod similarity;

pub use error::{BudgetError, Result};
