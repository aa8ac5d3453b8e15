mod common;

use std::path::Path;

use common::{write_two_entry_corpus, CountEmbedder};
use psum_ai::corpus::build_example_index;
use psum_ai::prompts::{
    examples_block, format_html_prompt, summarizer_system_prompt, summary_schema_instructions,
    task_message, EXAMPLES_BEGIN, EXAMPLES_END, INPUT_BEGIN, INPUT_END,
};
use psum_ai::retrieve::{retrieve, RetrievalResult};

#[test]
fn examples_block_carries_labels_comments_and_reference_markers() {
    let dir = tempfile::tempdir().expect("tempdir");
    let manifest = write_two_entry_corpus(dir.path());
    let embedder = CountEmbedder::new();
    let index = build_example_index(&manifest, &embedder, "mock").expect("index");
    let hits = retrieve(&index, &embedder, "aaa", 2).expect("retrieve");

    let block = examples_block(&hits);
    assert!(block.starts_with(EXAMPLES_BEGIN));
    assert!(block.ends_with(EXAMPLES_END));
    assert!(block.contains("reference only"));
    assert!(block.contains("Example 1 | Label: Good | source=a.txt"));
    assert!(block.contains("Example 2 | Label: Bad | source=b.txt"));
    assert!(block.contains("- clear"));
    assert!(block.contains("- rambling"));
    assert!(block.find("aaaa alpha").expect("a") < block.find("bbbb bubbly").expect("b"));
}

#[test]
fn empty_retrieval_still_renders_markers() {
    let block = examples_block(&RetrievalResult::default());
    assert!(block.contains("no reference examples"));
    assert!(block.starts_with(EXAMPLES_BEGIN));
}

#[test]
fn system_prompt_embeds_schema_and_examples() {
    let schema = summary_schema_instructions();
    let system = summarizer_system_prompt(&schema, "EXAMPLES-HERE");
    assert!(system.contains("actionable_takeaways"));
    assert!(system.contains("EXAMPLES-HERE"));
    assert!(system.contains("format_as_html"));
    assert!(system.contains("do NOT summarize them"));
}

#[test]
fn task_message_names_both_paths_only() {
    let task = task_message(Path::new("in/episode.pdf"), Path::new("out/notes.html"));
    assert!(task.contains("transcript_path: in/episode.pdf"));
    assert!(task.contains("output_path: out/notes.html"));
    assert!(!task.contains(EXAMPLES_BEGIN));
}

#[test]
fn format_prompt_fences_the_raw_summary_after_the_examples() {
    let prompt = format_html_prompt("EXAMPLES", "{\"title\":\"t\"}", "Fun Notes");
    let examples_at = prompt.find("EXAMPLES").expect("examples");
    let input_at = prompt.find(INPUT_BEGIN).expect("input begin");
    assert!(examples_at < input_at);
    assert!(prompt.contains("{\"title\":\"t\"}"));
    assert!(prompt.contains(INPUT_END));
    assert!(prompt.contains("\"Fun Notes\""));
}
