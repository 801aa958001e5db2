//! Client for the external generative-analysis service.

mod client;
mod config;
mod prompts;

pub use client::{AnalysisClient, AnalysisError};
pub use config::LlmConfig;
