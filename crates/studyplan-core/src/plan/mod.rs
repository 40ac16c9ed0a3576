//! Study plan pipeline: validation, prompt construction, generation, and
//! Markdown rendering.

pub mod generate;
pub mod markdown;
pub mod prompt;
pub mod validate;

pub use generate::{PlanGenerator, PlanOutcome, build_request};
pub use markdown::render_markdown;
pub use prompt::{build_prompt, describe_deadlines};
pub use validate::{ValidatedInput, ValidationError, canonicalize, parse_deadlines, validate_submission};
