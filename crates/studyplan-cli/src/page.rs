//! HTML rendering for the single study-planner page.

use maud::{DOCTYPE, Markup, PreEscaped, html};

use studyplan_db::models::HistoryEntry;

/// Heading shown above a freshly generated plan.
pub const PLAN_HEADING: &str = "Your Study Plan:";

/// Everything the page shows for one response.
#[derive(Debug, Default)]
pub struct PageView<'a> {
    /// Rendered plan HTML, embedded unescaped.
    pub study_plan: Option<&'a str>,
    pub error: Option<&'a str>,
    /// Values to re-populate the form with.
    pub form: FormValues<'a>,
    pub history: &'a [HistoryEntry],
}

#[derive(Debug, Default, Clone, Copy)]
pub struct FormValues<'a> {
    pub syllabus: &'a str,
    pub deadlines: &'a str,
    pub available_time: &'a str,
}

pub fn render_page(view: &PageView<'_>) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { "Study Planner" }
                style { (PreEscaped(CSS)) }
            }
            body {
                main.container {
                    h1 { "Study Planner" }
                    @if let Some(message) = view.error {
                        div.banner.error role="alert" { (message) }
                    }
                    (render_form(&view.form))
                    @if let Some(plan) = view.study_plan {
                        section.plan id="study-plan" {
                            h2 { (PLAN_HEADING) }
                            div.plan-body { (PreEscaped(plan)) }
                        }
                    }
                    (render_history(view.history))
                }
            }
        }
    }
}

fn render_form(form: &FormValues<'_>) -> Markup {
    html! {
        form.plan-form method="post" action="/" {
            label for="syllabus" { "Syllabus (subjects or topics)" }
            textarea #syllabus name="syllabus" rows="4" { (form.syllabus) }

            label for="deadlines" { "Deadlines (YYYY-MM-DD, comma separated)" }
            input #deadlines type="text" name="deadlines"
                placeholder="2025-05-01, 2025-05-15" value=(form.deadlines);

            label for="available_time" { "Available hours per day" }
            input #available_time type="number" name="available_time" min="1"
                value=(form.available_time);

            button type="submit" { "Generate Study Plan" }
        }
    }
}

fn render_history(entries: &[HistoryEntry]) -> Markup {
    html! {
        section.history #history {
            details open {
                summary { "History (" (entries.len()) ")" }
                @if entries.is_empty() {
                    p.empty-state { "No study plans yet." }
                } @else {
                    @for entry in entries {
                        (render_entry(entry))
                    }
                }
            }
        }
    }
}

fn render_entry(entry: &HistoryEntry) -> Markup {
    html! {
        article.entry data-entry-id=(entry.id) {
            header {
                time datetime=(entry.created_at.to_rfc3339()) {
                    (entry.created_at.format("%Y-%m-%d %H:%M:%S UTC").to_string())
                }
            }
            dl {
                dt { "Syllabus" }
                dd { (entry.syllabus) }
                dt { "Deadlines" }
                dd { (entry.deadlines) }
                dt { "Hours per day" }
                dd { (entry.available_time) }
            }
            details {
                summary { "Study plan" }
                div.plan-body { (PreEscaped(&entry.study_plan)) }
            }
        }
    }
}

const CSS: &str = r#"
* { box-sizing: border-box; }
body { font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, sans-serif; background: #f5f6f8; color: #222; margin: 0; }
.container { max-width: 760px; margin: 0 auto; padding: 24px 16px; }
h1 { margin-top: 0; }
.banner { padding: 12px 16px; border-radius: 6px; margin-bottom: 16px; }
.banner.error { background: #fdecea; color: #8a1c12; border: 1px solid #f5c2bd; }
.plan-form { display: flex; flex-direction: column; gap: 8px; background: #fff; padding: 16px; border-radius: 8px; }
.plan-form textarea, .plan-form input { font: inherit; padding: 8px; border: 1px solid #ccd; border-radius: 4px; }
.plan-form button { align-self: flex-start; padding: 8px 16px; border: 0; border-radius: 4px; background: #2d6cdf; color: #fff; cursor: pointer; }
.plan, .history { background: #fff; padding: 16px; border-radius: 8px; margin-top: 16px; }
.history summary { font-weight: 600; cursor: pointer; }
.entry { border-top: 1px solid #eee; padding: 12px 0; }
.entry dl { display: grid; grid-template-columns: max-content 1fr; gap: 4px 12px; margin: 8px 0; }
.entry dt { color: #666; }
.entry dd { margin: 0; }
.empty-state { color: #888; }
"#;
