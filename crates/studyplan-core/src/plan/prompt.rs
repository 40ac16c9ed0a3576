//! Prompt construction for study plan generation.

use chrono::{NaiveDate, NaiveDateTime};

use super::validate::ValidatedInput;

/// Format of the "today" line in the prompt.
pub const NOW_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Render deadlines for a human reader, e.g. `Thursday, May 1, 2025`.
pub fn describe_deadlines(deadlines: &[NaiveDate]) -> String {
    deadlines
        .iter()
        .map(|d| d.format("%A, %B %-d, %Y").to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Build the user prompt for one submission.
///
/// `now` is the moment of the generation call, not of the HTTP request.
pub fn build_prompt(input: &ValidatedInput, now: NaiveDateTime) -> String {
    format!(
        "I am a student. I need to create a personalized study plan.\n\
         My syllabus includes the following subjects: {syllabus}.\n\
         I have the following deadlines: {deadlines}.\n\
         I can study for {hours} hours per day.\n\
         Today's date and time is: {today}.\n\
         Please format the response using Markdown for easy readability.\n\
         Do not generate tables in your response.\n\
         Please generate a study plan that helps me prepare for my exams based on these details.\n",
        syllabus = input.syllabus,
        deadlines = describe_deadlines(&input.deadlines),
        hours = input.available_time,
        today = now.format(NOW_FORMAT),
    )
}
