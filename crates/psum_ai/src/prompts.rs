use std::path::Path;

use crate::retrieve::RetrievalResult;

pub const EXAMPLES_BEGIN: &str = "=== BEGIN REFERENCE EXAMPLES (reference only, do not summarize these) ===";
pub const EXAMPLES_END: &str = "=== END REFERENCE EXAMPLES ===";
pub const INPUT_BEGIN: &str = "=== BEGIN RAW SUMMARY (the actual input) ===";
pub const INPUT_END: &str = "=== END RAW SUMMARY ===";

pub fn summary_schema_instructions() -> String {
    r#"Return a single JSON object with exactly these fields (no other fields):
{
  "title": string,                       // episode title or a descriptive title
  "tldr": string,                        // two or three sentence overview
  "actionable_takeaways": [string],      // at least one entry
  "script": [                            // at least one section, in transcript order
    {
      "title": string,
      "start_timestamp": {"hours": int, "minutes": int, "seconds": int},
      "end_timestamp":   {"hours": int, "minutes": int, "seconds": int},
      "text": string,                    // what happens in this section
      "important_points": [string]
    }
  ],
  "appendix": [string]                   // optional extra context, may be empty
}
minutes and seconds are 0-59. end_timestamp must not be earlier than start_timestamp."#
        .to_string()
}

/// Render retrieved examples with their labels and reviewer comments, fenced so the model
/// treats them as style references and never as content to summarize.
pub fn examples_block(result: &RetrievalResult<'_>) -> String {
    if result.is_empty() {
        return format!("{EXAMPLES_BEGIN}\n(no reference examples available)\n{EXAMPLES_END}");
    }

    let blocks = result
        .hits
        .iter()
        .map(|hit| {
            let comments = if hit.example.comments.is_empty() {
                "- (none)".to_string()
            } else {
                hit.example
                    .comments
                    .iter()
                    .map(|c| format!("- {c}"))
                    .collect::<Vec<_>>()
                    .join("\n")
            };
            format!(
                "Example {rank} | Label: {label} | source={source}\nSummary:\n{content}\nReviewer comments:\n{comments}",
                rank = hit.rank,
                label = hit.example.label.as_str(),
                source = hit.example.source,
                content = hit.example.content,
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n------\n\n");

    format!("{EXAMPLES_BEGIN}\n{blocks}\n{EXAMPLES_END}")
}

pub fn summarizer_system_prompt(schema: &str, examples: &str) -> String {
    format!(
        r#"You are an expert podcast summarizer. You are excellent at capturing and condensing the important points in podcasts, conversations and lectures.

Your task: analyze the podcast transcript and produce a detailed summary, actionable takeaways and the important points of each part of the conversation.

Summary schema (non-negotiable):
{schema}

Formatting directives:
1) Create at least one section per logical topic in the transcript.
2) Scale the number of important points with the number of key concepts in that section.
3) Use emojis and clear structural markers so the summary is engaging and easy to scan.
4) If no timestamps can be inferred from the transcript, set every timestamp value to 0 and still split the text into logical topic sections.
5) The appendix is optional; use it for extra information or context the reader may find useful.

Tool protocol:
1) Call read_document with the transcript path to get the transcript text.
2) Write the summary as JSON matching the schema above.
3) Call format_as_html with that JSON as raw_text.
4) Call write_output with the returned HTML and the output path.
5) Reply with exactly the HTML that was written, and nothing else.
If a tool returns an ERROR, fix the problem it describes and call the tool again.

The labeled examples below show summaries a reviewer rated Good or Bad, with comments. They are reference only: do NOT summarize them and do NOT copy their facts. Imitate the Good traits and avoid every Bad trait.

{examples}
"#
    )
}

/// The human task. Kept apart from the system instructions so examples never read as input.
pub fn task_message(document_path: &Path, output_path: &Path) -> String {
    format!(
        "Summarize the podcast transcript in the file below. Then format the summary as an easy to read HTML file and write it to the output file. Return everything written to the output file as a string.\n\ntranscript_path: {}\noutput_path: {}",
        document_path.display(),
        output_path.display()
    )
}

pub fn format_html_prompt(examples: &str, raw_summary: &str, style_hint: &str) -> String {
    format!(
        r#"You are an expert notes formatter. Format the podcast summary below into a readable, self-contained HTML document while keeping the structure of the raw summary.

Rules (non-negotiable):
1) Copy all facts verbatim. Do not change, drop or condense any information.
2) Use emojis, the podcast sections and their timestamps to make the notes engaging and easy to read.
3) Apply the requested design: "{style_hint}".
4) Return only the HTML document, starting with <html> or <!DOCTYPE html>. No markdown fences, no commentary.

Below are examples of Good and Bad formatted summaries with reviewer comments. They are reference only: do not format or summarize them. Keep every Good trait; the result must contain none of the Bad traits.

{examples}

{INPUT_BEGIN}
{raw_summary}
{INPUT_END}
"#
    )
}
