//! Study plan generation: prompt → completion call → rendered HTML.

use std::sync::Arc;

use chrono::{Local, NaiveDateTime};
use tracing::{info, warn};

use super::markdown::render_markdown;
use super::prompt::build_prompt;
use super::validate::ValidatedInput;
use crate::completion::{ChatCompletionRequest, ChatMessage, CompletionClient};

/// Model used for every generation.
pub const MODEL: &str = "gpt-4o-mini";
/// System message sent ahead of the prompt.
pub const SYSTEM_PROMPT: &str = "You are a helpful assistant.";
pub const MAX_TOKENS: u32 = 1000;
pub const TEMPERATURE: f32 = 0.7;

/// Result of one generation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanOutcome {
    /// Rendered, trimmed, non-empty HTML.
    Generated(String),
    /// The service produced nothing usable.
    Empty,
}

impl PlanOutcome {
    pub fn into_html(self) -> Option<String> {
        match self {
            Self::Generated(html) => Some(html),
            Self::Empty => None,
        }
    }
}

/// Turns validated input into a rendered study plan.
pub struct PlanGenerator {
    client: Arc<dyn CompletionClient>,
}

impl PlanGenerator {
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        Self { client }
    }

    /// Generate a plan, capturing the current local time for the prompt.
    pub async fn generate(&self, input: &ValidatedInput) -> PlanOutcome {
        self.generate_at(input, Local::now().naive_local()).await
    }

    /// Generate a plan with an explicit "now".
    ///
    /// Never fails: transport errors, missing choices, null content, and
    /// whitespace-only content all map to [`PlanOutcome::Empty`].
    pub async fn generate_at(&self, input: &ValidatedInput, now: NaiveDateTime) -> PlanOutcome {
        let request = build_request(&build_prompt(input, now));

        let response = match self.client.complete(&request).await {
            Ok(r) => r,
            Err(e) => {
                let error = format!("{e:#}");
                warn!(client = self.client.name(), %error, "completion call failed");
                return PlanOutcome::Empty;
            }
        };

        let Some(content) = response.first_content().map(str::trim).filter(|c| !c.is_empty())
        else {
            warn!(client = self.client.name(), "completion returned no content");
            return PlanOutcome::Empty;
        };

        let html = render_markdown(content);
        if html.is_empty() {
            warn!(client = self.client.name(), "rendered plan is empty");
            return PlanOutcome::Empty;
        }

        info!(
            client = self.client.name(),
            markdown_len = content.len(),
            html_len = html.len(),
            "study plan generated"
        );
        PlanOutcome::Generated(html)
    }
}

/// Wrap a prompt in the fixed request parameters.
pub fn build_request(prompt: &str) -> ChatCompletionRequest {
    ChatCompletionRequest {
        model: MODEL.to_string(),
        messages: vec![ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(prompt)],
        max_tokens: MAX_TOKENS,
        temperature: TEMPERATURE,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use anyhow::{Result, anyhow};
    use async_trait::async_trait;
    use chrono::NaiveDate;

    use super::*;
    use crate::completion::ChatCompletionResponse;
    use crate::plan::validate::validate_submission;

    /// Returns a canned response (or error) and records each request.
    struct CannedClient {
        response: Option<ChatCompletionResponse>,
        requests: Mutex<Vec<ChatCompletionRequest>>,
    }

    impl CannedClient {
        fn new(response: Option<ChatCompletionResponse>) -> Arc<Self> {
            Arc::new(Self {
                response,
                requests: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl CompletionClient for CannedClient {
        fn name(&self) -> &str {
            "canned"
        }

        async fn complete(&self, request: &ChatCompletionRequest) -> Result<ChatCompletionResponse> {
            self.requests.lock().unwrap().push(request.clone());
            self.response
                .clone()
                .ok_or_else(|| anyhow!("connection refused"))
        }
    }

    fn input() -> ValidatedInput {
        validate_submission(
            Some("Math, Physics, Chemistry"),
            Some("2025-05-01, 2025-05-15, 2025-06-01"),
            Some("5"),
        )
        .unwrap()
    }

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 24)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
    }

    #[tokio::test]
    async fn markdown_is_rendered_and_trimmed() {
        let client = CannedClient::new(Some(ChatCompletionResponse::with_content(
            "\n\n## Math\n\n- Algebra\n\n",
        )));
        let generator = PlanGenerator::new(client.clone());

        let outcome = generator.generate_at(&input(), now()).await;
        assert_eq!(
            outcome,
            PlanOutcome::Generated("<h2>Math</h2>\n<ul>\n<li>Algebra</li>\n</ul>".to_string())
        );
    }

    #[tokio::test]
    async fn request_uses_fixed_parameters() {
        let client = CannedClient::new(Some(ChatCompletionResponse::with_content("ok")));
        let generator = PlanGenerator::new(client.clone());
        generator.generate_at(&input(), now()).await;

        let requests = client.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        let req = &requests[0];
        assert_eq!(req.model, "gpt-4o-mini");
        assert_eq!(req.max_tokens, 1000);
        assert!((req.temperature - 0.7).abs() < f32::EPSILON);
        assert_eq!(req.messages.len(), 2);
        assert_eq!(req.messages[0], ChatMessage::system("You are a helpful assistant."));
        assert_eq!(req.messages[1].role, "user");
        assert!(req.messages[1].content.contains("2025-03-24 09:00:00"));
        assert!(req.messages[1].content.contains("Math, Physics, Chemistry"));
    }

    #[tokio::test]
    async fn identical_inputs_call_the_service_each_time() {
        let client = CannedClient::new(Some(ChatCompletionResponse::with_content("ok")));
        let generator = PlanGenerator::new(client.clone());
        generator.generate_at(&input(), now()).await;
        generator.generate_at(&input(), now()).await;
        assert_eq!(client.requests.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn whitespace_content_is_empty() {
        let client = CannedClient::new(Some(ChatCompletionResponse::with_content("  \n\t ")));
        let outcome = PlanGenerator::new(client).generate_at(&input(), now()).await;
        assert_eq!(outcome, PlanOutcome::Empty);
    }

    #[tokio::test]
    async fn content_that_renders_to_nothing_is_empty() {
        let client = CannedClient::new(Some(ChatCompletionResponse::with_content(
            "[a]: http://x",
        )));
        let outcome = PlanGenerator::new(client.clone()).generate_at(&input(), now()).await;
        assert_eq!(outcome, PlanOutcome::Empty);
        assert_eq!(client.requests.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn no_choices_is_empty() {
        let client = CannedClient::new(Some(ChatCompletionResponse::default()));
        let outcome = PlanGenerator::new(client).generate_at(&input(), now()).await;
        assert_eq!(outcome, PlanOutcome::Empty);
    }

    #[tokio::test]
    async fn client_error_is_empty() {
        let client = CannedClient::new(None);
        let outcome = PlanGenerator::new(client).generate_at(&input(), now()).await;
        assert_eq!(outcome, PlanOutcome::Empty);
        assert_eq!(outcome.into_html(), None);
    }
}
