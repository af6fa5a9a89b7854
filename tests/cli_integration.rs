//! Integration tests for the `mdb` CLI.
//!
//! Each test points `mdb` at a temp config file and board store, runs it as a
//! subprocess, and checks stdout and the resulting board.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;

struct Env {
    dir: TempDir,
}

impl Env {
    fn new() -> Self {
        Env {
            dir: TempDir::new().unwrap(),
        }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn command(&self, args: &[&str]) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_mdb"));
        cmd.arg("--config")
            .arg(self.path("config.toml"))
            .arg("--store")
            .arg(self.path("boards.json"))
            .args(args)
            .current_dir(self.dir.path())
            .env_remove("RUST_LOG")
            .env_remove("VISUAL")
            .env_remove("EDITOR");
        cmd
    }

    /// Run `mdb`, returning (stdout, stderr, success)
    fn run(&self, args: &[&str]) -> (String, String, bool) {
        let output = self.command(args).output().expect("failed to run mdb");
        (
            String::from_utf8_lossy(&output.stdout).to_string(),
            String::from_utf8_lossy(&output.stderr).to_string(),
            output.status.success(),
        )
    }

    /// Run `mdb` expecting success, return stdout
    fn run_ok(&self, args: &[&str]) -> String {
        let (stdout, stderr, success) = self.run(args);
        if !success {
            panic!(
                "mdb {:?} failed:\nstdout: {}\nstderr: {}",
                args, stdout, stderr
            );
        }
        stdout
    }

    /// Create the "Sprint" board with one list holding one card
    fn with_board(self) -> Self {
        self.run_ok(&["init", "Sprint"]);
        let doc = self.run_ok(&["render"]);
        self.write("edit.md", &format!("{}\n## Todo\n- [ ] Write docs\n", doc));
        self.run_ok(&["apply", "edit.md"]);
        self
    }

    fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.path(name);
        fs::write(&path, content).unwrap();
        path
    }
}

fn line_starting<'a>(doc: &'a str, prefix: &str) -> &'a str {
    doc.lines()
        .find(|l| l.starts_with(prefix))
        .unwrap_or_else(|| panic!("no line starting with {:?} in:\n{}", prefix, doc))
}

// ---------------------------------------------------------------------------
// Board setup
// ---------------------------------------------------------------------------

#[test]
fn test_init_creates_and_selects_board() {
    let env = Env::new();
    let out = env.run_ok(&["init", "Sprint"]);
    assert_eq!(out, "Created board \"Sprint\" {000000000000000000000001}\n");

    let config = fs::read_to_string(env.path("config.toml")).unwrap();
    assert!(config.contains("board = \"000000000000000000000001\""));
    assert!(env.path("boards.json").exists());

    let boards = env.run_ok(&["boards"]);
    assert_eq!(boards, "* 000000000000000000000001  Sprint\n");
}

#[test]
fn test_boards_json() {
    let env = Env::new();
    env.run_ok(&["init", "Sprint"]);
    env.run_ok(&["init", "Backlog"]);
    let out = env.run_ok(&["boards", "--json"]);
    let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
    let boards = parsed.as_array().unwrap();
    assert_eq!(boards.len(), 2);
    assert_eq!(boards[0]["name"], "Sprint");
    assert_eq!(boards[0]["selected"], false);
    assert_eq!(boards[1]["name"], "Backlog");
    assert_eq!(boards[1]["selected"], true);
}

#[test]
fn test_render_without_board_fails() {
    let env = Env::new();
    let (_, stderr, success) = env.run(&["render"]);
    assert!(!success);
    assert!(stderr.contains("error: no board selected"));
}

// ---------------------------------------------------------------------------
// Render / plan / apply
// ---------------------------------------------------------------------------

#[test]
fn test_render_empty_board() {
    let env = Env::new();
    env.run_ok(&["init", "Sprint"]);
    let doc = env.run_ok(&["render"]);
    assert!(doc.starts_with("# Sprint {"));
    assert_eq!(doc.lines().count(), 1);
}

#[test]
fn test_apply_creates_list_and_card() {
    let env = Env::new();
    env.run_ok(&["init", "Sprint"]);
    let doc = env.run_ok(&["render"]);
    env.write("edit.md", &format!("{}\n## Todo\n- [ ] Write docs\n", doc));

    let out = env.run_ok(&["apply", "edit.md"]);
    assert_eq!(
        out,
        "Change: Created list \"Todo\" at position 0\n\
         Change: Created card \"Write docs\" in list \"Todo\" at position 0\n"
    );

    let doc = env.run_ok(&["render"]);
    assert!(line_starting(&doc, "## Todo {").ends_with('}'));
    assert!(line_starting(&doc, "- [ ] Write docs {").ends_with('}'));
}

#[test]
fn test_plan_does_not_apply() {
    let env = Env::new().with_board();
    let doc = env.run_ok(&["render"]);
    env.write("edit.md", &doc.replace("- [ ] Write docs", "- [x] Write docs"));

    let out = env.run_ok(&["plan", "edit.md"]);
    assert_eq!(out, "  1. Marked card \"Write docs\" complete\n");

    let after = env.run_ok(&["render"]);
    assert_eq!(after, doc);
}

#[test]
fn test_plan_json() {
    let env = Env::new().with_board();
    let doc = env.run_ok(&["render"]);
    env.write("edit.md", &format!("{}\n## Done\n", doc));

    let out = env.run_ok(&["plan", "edit.md", "--json"]);
    let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
    let actions = parsed["actions"].as_array().unwrap();
    assert_eq!(actions.len(), 1);
    assert_eq!(actions[0]["action"], "create_list");
    assert_eq!(actions[0]["name"], "Done");
    assert_eq!(actions[0]["position"], 1);
    assert!(parsed["extended"].as_array().unwrap().is_empty());
}

#[test]
fn test_unchanged_document_is_no_op() {
    let env = Env::new().with_board();
    let doc = env.run_ok(&["render"]);
    env.write("edit.md", &doc);
    assert_eq!(env.run_ok(&["plan", "edit.md"]), "No changes.\n");
    assert_eq!(env.run_ok(&["apply", "edit.md"]), "No changes.\n");
}

#[test]
fn test_apply_move_and_delete() {
    let env = Env::new().with_board();
    let doc = env.run_ok(&["render"]);
    let card = line_starting(&doc, "- [ ] Write docs").to_string();
    let edited = format!(
        "{}\n## Done\n{}\n- [ ] Throwaway\n",
        doc.replace(&format!("{}\n", card), ""),
        card
    );
    env.write("edit.md", &edited);
    let out = env.run_ok(&["apply", "edit.md"]);
    assert!(out.contains("Change: Created list \"Done\" at position 1"));
    assert!(out.contains("Change: Moved card \"Write docs\" from list \"Todo\" to list \"Done\" at position 0"));
    assert!(out.contains("Change: Created card \"Throwaway\" in list \"Done\" at position 1"));

    let doc = env.run_ok(&["render"]);
    let todo = doc.find("## Todo").unwrap();
    let done = doc.find("## Done").unwrap();
    let card = doc.find("- [ ] Write docs").unwrap();
    assert!(todo < done && done < card);

    let without = doc
        .lines()
        .filter(|l| !l.starts_with("- [ ] Throwaway"))
        .collect::<Vec<_>>()
        .join("\n");
    env.write("edit.md", &without);
    let out = env.run_ok(&["apply", "edit.md"]);
    assert_eq!(out, "Change: Deleted card \"Throwaway\"\n");
}

#[test]
fn test_apply_parse_error() {
    let env = Env::new().with_board();
    env.write("edit.md", "## Orphan list\n");
    let (_, stderr, success) = env.run(&["apply", "edit.md"]);
    assert!(!success);
    assert!(stderr.starts_with("error: "));
}

#[test]
fn test_apply_unknown_label_fails_before_any_change() {
    let env = Env::new().with_board();
    let doc = env.run_ok(&["render"]);
    env.write(
        "edit.md",
        &doc.replace("## Todo", "## Doing")
            .replace("- [ ] Write docs", "- [ ] Write docs @missing"),
    );
    let (stdout, stderr, success) = env.run(&["apply", "edit.md"]);
    assert!(!success);
    assert!(stdout.is_empty());
    assert!(stderr.contains("missing"));
    assert!(env.run_ok(&["render"]).contains("## Todo"));
}

#[test]
fn test_missing_document_is_error() {
    let env = Env::new().with_board();
    let (_, stderr, success) = env.run(&["plan", "absent.md"]);
    assert!(!success);
    assert!(stderr.contains("cannot read"));
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[test]
fn test_config_date_format_changes_rendering() {
    let env = Env::new().with_board();
    let doc = env.run_ok(&["render"]);
    env.write(
        "edit.md",
        &doc.replace("- [ ] Write docs", "- [ ] Write docs due:2024-01-15"),
    );
    env.run_ok(&["apply", "edit.md"]);
    assert!(env.run_ok(&["render"]).contains("due:2024-01-15"));

    env.run_ok(&["config", "date-format", "eu"]);
    assert!(env.run_ok(&["render"]).contains("due:15-01-2024"));

    let out = env.run_ok(&["config", "show", "--json"]);
    let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(parsed["date_format"], "eu");
    assert_eq!(parsed["board"], "000000000000000000000001");
}

#[test]
fn test_board_flag_overrides_config() {
    let env = Env::new();
    env.run_ok(&["init", "Sprint"]);
    env.run_ok(&["init", "Backlog"]);
    let doc = env.run_ok(&["render", "-b", "000000000000000000000001"]);
    assert!(doc.starts_with("# Sprint {"));
    let doc = env.run_ok(&["render"]);
    assert!(doc.starts_with("# Backlog {"));
}

#[test]
fn test_config_preserves_comments() {
    let env = Env::new();
    env.write("config.toml", "# my settings\ndate_format = \"us\"  # american\n");
    env.run_ok(&["config", "board", "abc"]);
    let config = fs::read_to_string(env.path("config.toml")).unwrap();
    assert!(config.starts_with("# my settings\n"));
    assert!(config.contains("date_format = \"us\"  # american"));
    assert!(config.contains("board = \"abc\""));
}

// ---------------------------------------------------------------------------
// Edit (scripted editor)
// ---------------------------------------------------------------------------

#[cfg(unix)]
fn write_editor_script(env: &Env, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;
    let path = env.write("editor.sh", &format!("#!/bin/sh\nset -e\n{}\n", body));
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

#[cfg(unix)]
fn run_edit(env: &Env, editor: &Path) -> String {
    let output = env
        .command(&["edit"])
        .env("EDITOR", editor)
        .output()
        .expect("failed to run mdb");
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    assert!(
        output.status.success(),
        "mdb edit failed:\nstdout: {}\nstderr: {}",
        stdout,
        String::from_utf8_lossy(&output.stderr)
    );
    stdout
}

#[cfg(unix)]
#[test]
fn test_edit_applies_editor_changes() {
    let env = Env::new().with_board();
    let editor = write_editor_script(
        &env,
        "sed 's/- \\[ \\] Write docs/- [x] Write docs/' \"$1\" > \"$1.tmp\"\nmv \"$1.tmp\" \"$1\"",
    );
    let out = run_edit(&env, &editor);
    assert_eq!(out, "Change: Marked card \"Write docs\" complete\n");
    assert!(env.run_ok(&["render"]).contains("- [x] Write docs {"));
}

#[cfg(unix)]
#[test]
fn test_edit_without_changes() {
    let env = Env::new().with_board();
    let editor = write_editor_script(&env, "true");
    assert_eq!(run_edit(&env, &editor), "No changes.\n");
}

#[cfg(unix)]
#[test]
fn test_edit_runs_extended_round_for_flagged_list() {
    let env = Env::new().with_board();
    let editor = write_editor_script(
        &env,
        "sed -e 's/^\\(## Todo .*\\)$/\\1 !/' -e 's/^Subscribed: false/Subscribed: true/' \"$1\" > \"$1.tmp\"\nmv \"$1.tmp\" \"$1\"",
    );
    let out = run_edit(&env, &editor);
    assert_eq!(
        out,
        "Change: Updated list \"Todo\": Subscribed \"false\" -> \"true\"\n"
    );
}
