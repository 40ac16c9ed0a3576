//! The `CompletionClient` trait: the seam between plan generation and a
//! concrete text-generation service.

use anyhow::Result;
use async_trait::async_trait;

use super::types::{ChatCompletionRequest, ChatCompletionResponse};

/// Sends one chat completion request and returns the decoded response.
///
/// Implementations must not retry. A response with no usable content is
/// still `Ok`; interpreting it is the caller's job.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Short name for logs (e.g. "openai").
    fn name(&self) -> &str;

    async fn complete(&self, request: &ChatCompletionRequest) -> Result<ChatCompletionResponse>;
}

const _: () = {
    fn _assert_object_safe(_: &dyn CompletionClient) {}
};
