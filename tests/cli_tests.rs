mod common;

use dbforge::checkpoint::RunState;
use dbforge::geometry::LayoutDocument;
use regex::Regex;
use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output, Stdio};
use std::sync::{Mutex, MutexGuard};
use tempfile::TempDir;

// Spawning while another test writes an executable can hand the child the
// open write handle, and exec then fails with ETXTBSY.
static SPAWN: Mutex<()> = Mutex::new(());

fn spawn_lock() -> MutexGuard<'static, ()> {
    SPAWN.lock().unwrap_or_else(|e| e.into_inner())
}

struct TestContext {
    dir: TempDir,
    layout_path: PathBuf,
    table_path: PathBuf,
}

impl TestContext {
    fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let layout_path = dir.path().join("gate.json");
        let table_path = dir.path().join("xor.csv");

        LayoutDocument {
            name: Some("gate".into()),
            dots: common::fixture_dots(),
        }
        .save(&layout_path)
        .unwrap();
        fs::write(&table_path, "in0,in1,out0\n0,0,0\n0,1,1\n1,0,1\n1,1,0\n").unwrap();

        Self {
            dir,
            layout_path,
            table_path,
        }
    }

    fn run(&self, args: &[&str]) -> Output {
        let child = {
            let _guard = spawn_lock();
            Command::new(env!("CARGO_BIN_EXE_dbforge"))
                .current_dir(self.dir.path())
                .args(args)
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .spawn()
                .expect("Failed to execute binary")
        };
        child.wait_with_output().expect("Failed to wait for binary")
    }

    fn checkpoints(&self) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(self.dir.path().join("runs"))
            .map(|d| {
                d.filter_map(|e| e.ok())
                    .map(|e| e.file_name().to_string_lossy().to_string())
                    .collect()
            })
            .unwrap_or_default();
        names.sort();
        names
    }
}

#[test]
fn test_help_lists_subcommands() {
    let ctx = TestContext::new();
    let output = ctx.run(&["--help"]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    for sub in ["search", "resume", "validate"] {
        assert!(stdout.contains(sub), "'{}' missing from help:\n{}", sub, stdout);
    }
}

#[test]
fn test_missing_checkpoint_fails() {
    let ctx = TestContext::new();
    let output = ctx.run(&["resume", "does-not-exist.json"]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("does-not-exist.json"), "stderr: {}", stderr);
}

#[test]
fn test_invalid_options_rejected() {
    let ctx = TestContext::new();
    let output = ctx.run(&[
        "search",
        ctx.layout_path.to_str().unwrap(),
        "-t",
        ctx.table_path.to_str().unwrap(),
        "--population-size",
        "4",
        "--elitism-count",
        "5",
    ]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("elitism_count"));
    assert!(ctx.checkpoints().is_empty());
}

#[test]
fn test_skip_check_conflicts_with_repeats() {
    let ctx = TestContext::new();
    let output = ctx.run(&["validate", "run.json", "-n", "3", "--skip-check"]);
    assert!(!output.status.success());
}

#[cfg(unix)]
#[test]
fn test_search_then_resume_then_validate() {
    use std::os::unix::fs::PermissionsExt;

    let ctx = TestContext::new();
    // Never finds a valid distribution: every individual scores zero.
    let sim = ctx.dir.path().join("sim.sh");
    {
        let _guard = spawn_lock();
        fs::write(&sim, "#!/bin/sh\necho '{\"distributions\":[]}' > \"$2\"\n").unwrap();
        fs::set_permissions(&sim, fs::Permissions::from_mode(0o755)).unwrap();
    }

    let output = ctx.run(&[
        "search",
        ctx.layout_path.to_str().unwrap(),
        "-t",
        ctx.table_path.to_str().unwrap(),
        "-n",
        "2",
        "--prefix",
        "test",
        "-S",
        "cli",
        "--population-size",
        "4",
        "--elitism-count",
        "1",
        "--simulator",
        sim.to_str().unwrap(),
        "--work-dir",
        "work",
    ]);
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let re = Regex::new(r"^test_[0-9a-f]{16}\.json$").unwrap();
    let names = ctx.checkpoints();
    assert_eq!(names.len(), 1, "{:?}", names);
    assert!(re.is_match(&names[0]), "unexpected checkpoint name {}", names[0]);

    let checkpoint = ctx.dir.path().join("runs").join(&names[0]);
    let state = RunState::load(&checkpoint).unwrap();
    assert_eq!(state.random_seed, "cli");
    assert_eq!(state.generations.len(), 2);
    assert_eq!(state.options.config.search.population_size, 4);

    let output = ctx.run(&[
        "resume",
        checkpoint.to_str().unwrap(),
        "-n",
        "1",
        "--prefix",
        "again",
        "--simulator",
        sim.to_str().unwrap(),
        "--work-dir",
        "work",
    ]);
    assert!(output.status.success());
    assert_eq!(ctx.checkpoints().len(), 2);

    let output = ctx.run(&[
        "validate",
        checkpoint.to_str().unwrap(),
        "--skip-check",
    ]);
    assert!(output.status.success());
    let stem = names[0].trim_end_matches(".json");
    let dest = ctx.dir.path().join("results").join("gate").join(stem);
    assert!(dest.join("statistics.json").exists());
    assert!(dest.join("output.log").exists());

    // A second validation never overwrites the first.
    let output = ctx.run(&[
        "validate",
        checkpoint.to_str().unwrap(),
        "--skip-check",
    ]);
    assert!(output.status.success());
    assert!(ctx
        .dir
        .path()
        .join("results")
        .join("gate")
        .join(format!("{} (1)", stem))
        .exists());
}
