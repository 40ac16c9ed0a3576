//! Domain logic for studyplan: input validation, prompt construction,
//! the chat-completion client seam, Markdown rendering, and the history
//! store abstraction.

pub mod completion;
pub mod history;
pub mod plan;
