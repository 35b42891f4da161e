//! The text model seam.

use crate::error::Result;

/// A generative model that turns a prompt into text.
///
/// Implementations are blocking; callers in async contexts should run them on
/// a blocking thread.
pub trait TextModel: Send + Sync {
    /// Sends `prompt` and returns the model's raw reply.
    fn generate(&self, prompt: &str) -> Result<String>;

    /// Short identifier used in logs.
    fn name(&self) -> &str;
}
