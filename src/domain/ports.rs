use crate::utils::error::Result;
use async_trait::async_trait;

/// A text-understanding service: maps an instruction plus user text to a reply text.
///
/// Replies are not trusted to follow the instruction; callers validate them.
#[async_trait]
pub trait TextService: Send + Sync {
    async fn complete(&self, instruction: &str, user_text: &str) -> Result<String>;
}
