//! Chat completion client interface and the OpenAI implementation.
//!
//! ```text
//! PlanGenerator --complete(request)--> &dyn CompletionClient
//!                                          |
//!                                          +-- OpenAiClient (reqwest)
//!                                          +-- test doubles
//! ```

pub mod openai;
pub mod trait_def;
pub mod types;

pub use openai::OpenAiClient;
pub use trait_def::CompletionClient;
pub use types::{ChatChoice, ChatCompletionRequest, ChatCompletionResponse, ChatMessage, ResponseMessage};
