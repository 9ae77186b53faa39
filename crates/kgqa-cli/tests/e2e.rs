//! End-to-end tests for the KGQA CLI.
//!
//! Tests invoke the `kgqa` binary as a subprocess against the demo graph
//! and verify its JSON output.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use tempfile::TempDir;

fn kgqa() -> Command {
    Command::new(env!("CARGO_BIN_EXE_kgqa"))
}

fn kgqa_in(dir: &Path) -> Command {
    let mut cmd = kgqa();
    cmd.current_dir(dir).env_remove("RUST_LOG");
    cmd
}

fn demos() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../demos")
}

/// A temp dir holding the demo inputs, already ingested into `kg.db` and
/// `kg_schema.json`.
fn ingested() -> TempDir {
    let dir = TempDir::new().unwrap();
    for file in ["relations.txt", "attributes.txt", "question_templates.csv"] {
        std::fs::copy(demos().join(file), dir.path().join(file)).unwrap();
    }
    let output = ingest(dir.path());
    assert!(
        output.status.success(),
        "ingest failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    dir
}

fn ingest(dir: &Path) -> Output {
    kgqa_in(dir)
        .args([
            "ingest",
            "--relations",
            "relations.txt",
            "--attributes",
            "attributes.txt",
        ])
        .output()
        .unwrap()
}

fn ask(dir: &Path, question: &str) -> serde_json::Value {
    let output = kgqa_in(dir).args(["ask", question]).output().unwrap();
    assert!(
        output.status.success(),
        "ask failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).unwrap()
}

// === Ingest ===

#[test]
fn e2e_ingest_builds_database_and_schema() {
    let dir = TempDir::new().unwrap();
    for file in ["relations.txt", "attributes.txt"] {
        std::fs::copy(demos().join(file), dir.path().join(file)).unwrap();
    }

    let output = ingest(dir.path());
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["report"]["entities"], 8);
    assert_eq!(json["report"]["relations"], 8);
    assert_eq!(json["report"]["labels"], 3);
    assert_eq!(json["report"]["attributes"], 13);

    assert!(dir.path().join("kg.db").exists());
    let schema: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(dir.path().join("kg_schema.json")).unwrap())
            .unwrap();
    let entities: Vec<&str> = schema["entities"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|v| v.as_str())
        .collect();
    assert!(entities.contains(&"发如雪"));
    assert!(!entities.iter().any(|e| e.contains('（')));
    assert_eq!(schema["labels"], serde_json::json!(["歌曲", "电影"]));
    assert!(schema["generated_at"].is_string());
}

#[test]
fn e2e_ingest_rejects_malformed_triples() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("relations.txt"), "周杰伦\t妻子\n").unwrap();
    std::fs::write(dir.path().join("attributes.txt"), "").unwrap();

    let output = ingest(dir.path());
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("expected 3 tab-separated fields"));
}

// === Ask ===

#[test]
fn e2e_ask_attribute() {
    let dir = ingested();
    let json = ask(dir.path(), "周杰伦的身高是什么");
    assert_eq!(json["answer"], "周杰伦的身高是175cm");
    assert_eq!(json["attempts"], 1);
    assert_eq!(json["score"], 1.0);
}

#[test]
fn e2e_ask_relation_between_two_entities() {
    let dir = ingested();
    let json = ask(dir.path(), "周杰伦和淡江中学是什么关系");
    assert_eq!(json["answer"], "周杰伦和淡江中学的关系是毕业院校");
    assert_eq!(json["template"], 4);
}

#[test]
fn e2e_ask_picks_the_closest_template() {
    let dir = ingested();
    let json = ask(dir.path(), "谁导演的不能说的秘密");
    assert_eq!(json["answer"], "不能说的秘密的导演是周杰伦");
    assert_eq!(json["matched_question"], "谁导演的不能说的秘密");
}

#[test]
fn e2e_ask_falls_back_when_best_candidate_is_empty() {
    let dir = ingested();
    let json = ask(dir.path(), "方文山的作词是谁");
    assert_eq!(json["answer"], "方文山是发如雪的作词");
    assert_eq!(json["attempts"], 2);
}

#[test]
fn e2e_ask_label() {
    let dir = ingested();
    let json = ask(dir.path(), "发如雪是歌曲吗");
    assert_eq!(json["answer"], "是的，发如雪是歌曲");
}

#[test]
fn e2e_ask_without_mentions_has_no_answer() {
    let dir = ingested();
    let json = ask(dir.path(), "今天天气怎么样");
    assert!(json["answer"].is_null());
    assert_eq!(json["question"], "今天天气怎么样");
}

#[test]
fn e2e_ask_plain_format_prints_only_the_answer() {
    let dir = ingested();
    let output = kgqa_in(dir.path())
        .args(["ask", "昆凌的身高是什么", "--format", "table"])
        .output()
        .unwrap();
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout), "昆凌的身高是168cm\n");
}

#[test]
fn e2e_ask_explain_lists_ranked_candidates() {
    let dir = ingested();
    let output = kgqa_in(dir.path())
        .args(["ask", "谁导演的不能说的秘密", "--explain", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["total"], 3);
    assert_eq!(json["rows"][0]["question"], "谁导演的不能说的秘密");
    assert_eq!(json["rows"][0]["score"], "1.0000");
}

#[test]
fn e2e_ask_without_database_fails() {
    let dir = TempDir::new().unwrap();
    std::fs::copy(
        demos().join("question_templates.csv"),
        dir.path().join("question_templates.csv"),
    )
    .unwrap();
    std::fs::write(
        dir.path().join("kg_schema.json"),
        r#"{"entities":["周杰伦"],"relations":[],"labels":[],"attributes":["身高"]}"#,
    )
    .unwrap();

    let output = kgqa_in(dir.path())
        .args(["ask", "周杰伦的身高是什么", "--db", "missing.db"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("error: failed to open graph database"), "stderr: {stderr}");
}

// === Config ===

#[test]
fn e2e_config_file_paths_are_relative_to_it() {
    let dir = ingested();
    let sub = dir.path().join("elsewhere");
    std::fs::create_dir(&sub).unwrap();
    std::fs::write(
        dir.path().join("custom.toml"),
        "schema_path = 'kg_schema.json'\ntemplates_path = 'question_templates.csv'\ndatabase_path = 'kg.db'\n",
    )
    .unwrap();

    let output = kgqa_in(&sub)
        .args(["--config", "../custom.toml", "ask", "周杰伦的血型是什么"])
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "ask failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["answer"], "周杰伦的血型是O型");
}

#[test]
fn e2e_unknown_config_key_fails() {
    let dir = ingested();
    std::fs::write(dir.path().join("kgqa.toml"), "databse_path = 'kg.db'\n").unwrap();
    let output = kgqa_in(dir.path()).args(["ask", "x"]).output().unwrap();
    assert!(!output.status.success());
}

// === Templates ===

#[test]
fn e2e_templates_lists_catalog() {
    let dir = ingested();
    let output = kgqa_in(dir.path())
        .args(["templates", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["total"], 6);
    assert_eq!(json["rows"][4]["slots"], "ENT:2");
}

#[test]
fn e2e_templates_reports_bad_row() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("question_templates.csv"),
        "question,query,slots,answer\n%ENT%,q,\"{\"\"%FOO%\"\": 1}\",a\n",
    )
    .unwrap();
    let output = kgqa_in(dir.path()).arg("templates").output().unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("row 1"), "stderr: {stderr}");
}

// === Repl ===

#[test]
fn e2e_repl_answers_each_line() {
    let dir = ingested();
    let mut child = kgqa_in(dir.path())
        .arg("repl")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    child
        .stdin
        .take()
        .unwrap()
        .write_all("周杰伦的妻子是谁\n\n今天天气怎么样\n发如雪的谱曲是谁\n".as_bytes())
        .unwrap();
    let output = child.wait_with_output().unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(
        lines,
        vec!["周杰伦的妻子是昆凌", "(no answer)", "发如雪的谱曲是周杰伦"]
    );
}

// === Completions ===

#[test]
fn e2e_completions_bash() {
    let output = kgqa().args(["completions", "bash"]).output().unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("kgqa"));
}
