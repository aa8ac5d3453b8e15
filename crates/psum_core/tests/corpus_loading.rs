use std::fs;

use pretty_assertions::assert_eq;
use psum_core::corpus::{load_labeled_examples, load_manifest, ExampleCorpusManifest};
use psum_core::domain::Label;

fn write_manifest(dir: &std::path::Path, json: &str) -> std::path::PathBuf {
    let path = dir.join("examples.json");
    fs::write(&path, json).expect("write manifest");
    path
}

#[test]
fn missing_entries_are_skipped_without_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(dir.path().join("a.txt"), "  good summary text \n").expect("write a");
    let path = write_manifest(
        dir.path(),
        r#"{
            "Good": [
                {"formatted_file_path": "a.txt", "comments": ["clear"]},
                {"formatted_file_path": "missing.txt", "comments": ["gone"]}
            ]
        }"#,
    );

    let loaded = load_manifest(&path).expect("manifest");
    let examples = load_labeled_examples(&loaded.manifest, &loaded.base_dir);

    assert_eq!(examples.examples.len(), 1);
    assert_eq!(examples.examples[0].content, "good summary text");
    assert_eq!(examples.examples[0].label, Label::Good);
    assert_eq!(examples.examples[0].comments, vec!["clear".to_string()]);
    assert_eq!(examples.skipped, vec!["missing.txt".to_string()]);
}

#[test]
fn good_entries_load_before_bad_entries_in_file_order() {
    let dir = tempfile::tempdir().expect("tempdir");
    for name in ["g1.txt", "g2.txt", "b1.txt"] {
        fs::write(dir.path().join(name), format!("content of {name}")).expect("write");
    }
    let path = write_manifest(
        dir.path(),
        r#"{
            "Bad": [{"formatted_file_path": "b1.txt", "comments": ["rambling"]}],
            "Good": [
                {"formatted_file_path": "g1.txt"},
                {"formatted_file_path": "g2.txt", "comments": []}
            ]
        }"#,
    );

    let loaded = load_manifest(&path).expect("manifest");
    let examples = load_labeled_examples(&loaded.manifest, &loaded.base_dir);
    let sources: Vec<&str> = examples.examples.iter().map(|e| e.source.as_str()).collect();
    assert_eq!(sources, vec!["g1.txt", "g2.txt", "b1.txt"]);
    assert!(examples.examples[0].comments.is_empty());
    assert_eq!(examples.examples[2].label, Label::Bad);
}

#[test]
fn blank_example_files_are_skipped() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(dir.path().join("blank.txt"), "   \n\t").expect("write");
    let path = write_manifest(
        dir.path(),
        r#"{"Bad": [{"formatted_file_path": "blank.txt", "comments": []}]}"#,
    );

    let loaded = load_manifest(&path).expect("manifest");
    let examples = load_labeled_examples(&loaded.manifest, &loaded.base_dir);
    assert!(examples.examples.is_empty());
    assert_eq!(examples.skipped, vec!["blank.txt".to_string()]);
}

#[test]
fn missing_manifest_fails_fast() {
    let dir = tempfile::tempdir().expect("tempdir");
    let err = load_manifest(&dir.path().join("nope.json")).expect_err("should error");
    assert_eq!(err.code, "CORPUS_MANIFEST_INVALID");
    assert!(!err.retryable);
}

#[test]
fn malformed_manifest_fails_fast() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_manifest(dir.path(), r#"{"Good": [{"path": "a.txt"}]}"#);
    let err = load_manifest(&path).expect_err("should error");
    assert_eq!(err.code, "CORPUS_MANIFEST_INVALID");

    let path = write_manifest(dir.path(), r#"{"Meh": []}"#);
    let err = load_manifest(&path).expect_err("unknown label should error");
    assert_eq!(err.code, "CORPUS_MANIFEST_INVALID");

    let path = write_manifest(dir.path(), "not json");
    assert!(load_manifest(&path).is_err());
}

#[test]
fn fingerprint_tracks_manifest_bytes() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_manifest(dir.path(), r#"{"Good": []}"#);
    let first = load_manifest(&path).expect("manifest");
    let again = load_manifest(&path).expect("manifest");
    assert_eq!(first.sha256, again.sha256);
    assert_eq!(first.sha256.len(), 64);
    assert_eq!(first.manifest, ExampleCorpusManifest::default());

    let path = write_manifest(dir.path(), r#"{"Bad": []}"#);
    let changed = load_manifest(&path).expect("manifest");
    assert_ne!(first.sha256, changed.sha256);
}
