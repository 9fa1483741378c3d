use std::{
    fs,
    path::{Path, PathBuf},
};

use tempfile::tempdir;

use smc_cli::{Args, run};

/// Collects all .sm files from a directory
fn collect_sm_files(dir: PathBuf) -> Vec<PathBuf> {
    let mut files = if let Ok(entries) = fs::read_dir(&dir) {
        entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("sm"))
            .collect()
    } else {
        Vec::new()
    };

    files.sort();
    files
}

/// Demos live at the workspace root, not in the crate
fn demos_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .join("demos")
}

fn args(input: &Path, output: PathBuf, no_optimize: bool) -> Args {
    Args {
        input: input.to_string_lossy().to_string(),
        output: Some(output.to_string_lossy().to_string()),
        config: None,
        log_level: "off".to_string(),
        no_optimize,
    }
}

#[test]
fn e2e_smoke_test_valid_demos() {
    let temp_dir = tempdir().expect("Failed to create temp directory");

    let valid_demos = collect_sm_files(demos_path());
    assert!(!valid_demos.is_empty(), "No valid demos found in demos/");

    let mut failed_demos = Vec::new();

    for demo_path in &valid_demos {
        let stem = demo_path.file_stem().unwrap().to_string_lossy().to_string();
        for no_optimize in [false, true] {
            let output_path = temp_dir.path().join(format!("{stem}_{no_optimize}.txt"));
            if let Err(e) = run(&args(demo_path, output_path, no_optimize)) {
                failed_demos.push((demo_path.clone(), e));
            }
        }
    }

    if !failed_demos.is_empty() {
        eprintln!("\nValid demos that failed:");
        for (path, err) in &failed_demos {
            eprintln!("  - {}: {}", path.display(), err);
        }
        panic!("{} valid demo run(s) failed unexpectedly", failed_demos.len());
    }

    println!("✅ All {} valid demos passed", valid_demos.len());
}

#[test]
fn e2e_smoke_test_error_demos() {
    let temp_dir = tempdir().expect("Failed to create temp directory");

    let error_demos = collect_sm_files(demos_path().join("errors"));
    assert!(!error_demos.is_empty(), "No error demos found in demos/errors/");

    let mut unexpectedly_succeeded = Vec::new();

    for demo_path in &error_demos {
        let output_filename = format!(
            "error_{}.txt",
            demo_path.file_stem().unwrap().to_string_lossy()
        );
        let output_path = temp_dir.path().join(output_filename);

        if run(&args(demo_path, output_path.clone(), false)).is_ok() {
            unexpectedly_succeeded.push(demo_path.clone());
        }
        assert!(!output_path.exists(), "no output for {}", demo_path.display());
    }

    if !unexpectedly_succeeded.is_empty() {
        eprintln!("\nError demos that unexpectedly succeeded:");
        for path in &unexpectedly_succeeded {
            eprintln!("  - {}", path.display());
        }
        panic!(
            "{} error demo(s) succeeded unexpectedly",
            unexpectedly_succeeded.len()
        );
    }

    println!("✅ All {} error demos failed as expected", error_demos.len());
}

#[test]
fn e2e_turnstile_output() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let input = demos_path().join("turnstile.sm");
    let output_path = temp_dir.path().join("turnstile.txt");

    run(&args(&input, output_path.clone(), false)).expect("turnstile compiles");

    let output = fs::read_to_string(&output_path).expect("output written");
    assert!(output.starts_with("Initial: Locked\nFsm: TwoCoinTurnstile\nActions:Turnstile\n{\n"));
    assert!(output.contains("  Locked {\n    Pass Alarming {alarmOn}\n    Coin FirstCoin {}\n    Reset Locked {lock}\n  }\n"));
    assert!(!output.contains("Base"));
}

#[test]
fn e2e_missing_input_is_io_error() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let input = temp_dir.path().join("missing.sm");

    let err = run(&args(&input, temp_dir.path().join("out.txt"), false)).expect_err("missing input");
    assert!(matches!(err, smc::SmcError::Io(_)));
}
