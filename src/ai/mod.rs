mod claude;

use std::future::Future;

pub use claude::ClaudeClient;

use crate::error::Result;

/// Sampling parameters for a single completion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            max_tokens: 300,
            temperature: 0.7,
        }
    }
}

/// Something that turns a prompt into free text.
pub trait TextGenerator {
    fn complete(
        &self,
        prompt: &str,
        params: GenerationParams,
    ) -> impl Future<Output = Result<String>> + Send;

    /// Identifies the model in logs.
    fn model_version(&self) -> &str;
}
