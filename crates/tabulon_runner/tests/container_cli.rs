//! Runs DockerRunner against a stand-in container CLI script.
#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tabulon_runner::{ContainerRunner, DockerRunner, ExecutionError, RunRequest, RunnerConfig};

/// Write an executable script that echoes its arguments and exits with `code`.
fn fake_cli(dir: &Path, code: i32) -> PathBuf {
    let path = dir.join("fake-docker");
    let script = format!(
        "#!/bin/sh\necho \"args: $*\"\necho \"warning from container\" >&2\nexit {}\n",
        code
    );
    fs::write(&path, script).unwrap();
    let mut perms = fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).unwrap();
    path
}

fn runner(program: &Path) -> DockerRunner {
    DockerRunner::new(RunnerConfig {
        program: program.display().to_string(),
        ..RunnerConfig::default()
    })
}

#[test]
fn test_successful_run_returns_combined_logs() {
    let dir = tempfile::tempdir().unwrap();
    let cli = fake_cli(dir.path(), 0);
    let request = RunRequest::new("fit:1.0", dir.path()).with_env("ALGORITHM", "fit");

    let logs = runner(&cli).run(&request).unwrap();
    assert!(logs.contains("args: run --rm --volume"));
    assert!(logs.contains("--env ALGORITHM=fit fit:1.0"));
    assert!(logs.ends_with("warning from container"));
}

#[test]
fn test_non_zero_exit_carries_logs() {
    let dir = tempfile::tempdir().unwrap();
    let cli = fake_cli(dir.path(), 3);

    let err = runner(&cli)
        .run(&RunRequest::new("fit:1.0", dir.path()))
        .unwrap_err();

    match &err {
        ExecutionError::Failed { image, status, logs } => {
            assert_eq!(image, "fit:1.0");
            assert_eq!(*status, Some(3));
            assert!(logs.contains("warning from container"));
        }
        other => panic!("expected Failed, got {:?}", other),
    }
    assert!(err.to_string().contains("status 3"));
}
