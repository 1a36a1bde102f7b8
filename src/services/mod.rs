//! Service layer: the emissions calculator and the Gemini-backed recommender.

pub mod calculator;
pub mod gemini;
pub mod recommender;

pub use calculator::Calculator;
pub use gemini::{GeminiClient, GeminiConfig};
pub use recommender::Recommender;
