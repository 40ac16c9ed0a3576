//! Markdown to HTML for generated study plans.

use pulldown_cmark::{Options, Parser, html};

/// Convert Markdown to HTML and trim surrounding whitespace.
///
/// Plain CommonMark: tables and other extensions stay disabled, so a pipe
/// table in the model output renders as a paragraph rather than a `<table>`.
pub fn render_markdown(markdown: &str) -> String {
    let parser = Parser::new_ext(markdown, Options::empty());
    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out.trim().to_string()
}
