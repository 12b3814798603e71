//! Hosted text-generation providers.

mod gemini;

pub use gemini::{GeminiClient, GeminiClientBuilder};
