use async_trait::async_trait;

use praefectus_types::Result;

/// The human at the console, asked whenever the bot can't proceed alone
/// (missing cookies, captcha, first-run settings, new villages).
#[async_trait]
pub trait Operator: Send + Sync {
    /// Asks for a line of text. An empty answer falls back to `default`.
    async fn ask_string(
        &self,
        question: &str,
        default: Option<&str>,
        example: Option<&str>,
    ) -> Result<String>;

    async fn ask_bool(&self, question: &str, default: bool) -> Result<bool>;

    /// Blocks until the operator confirms.
    async fn wait_for_enter(&self, message: &str) -> Result<()>;
}
