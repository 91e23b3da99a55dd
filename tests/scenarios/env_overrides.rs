//! Test: Environment overrides applied across all jobs

use crate::helpers::*;
use matrixci::core::env::apply_overrides;

const MATRIX: &str = r#"
name: glymur
env:
  PIP_DOWNLOAD_CACHE: /tmp/pip-cache
matrix:
  - name: py27
    tag: "27"
  - name: py27_opj15
    tag: "27"
    env:
      OPJ15: "1"
install:
  - name: openjpeg15
    run: ci/install_openjpeg15.sh
    when: OPJ15
script:
  - name: unit-tests
    run: python -m unittest discover
"#;

/// An override reaches every job's process environment
#[tokio::test]
async fn test_override_reaches_all_jobs() {
    let runner = FakeRunner::new();
    let mut matrix = matrix_from_yaml(MATRIX);

    for job in &mut matrix.jobs {
        apply_overrides(
            &mut job.env,
            &[("PIP_DOWNLOAD_CACHE".to_string(), "/var/cache".to_string())],
        );
    }

    run_sequential(runner.clone(), &mut matrix).await;

    for invocation in runner.invocations() {
        assert_eq!(
            invocation.env.get("PIP_DOWNLOAD_CACHE"),
            Some(&"/var/cache".to_string())
        );
    }
}

/// Overrides participate in condition evaluation
#[tokio::test]
async fn test_override_can_disable_flag() {
    let runner = FakeRunner::new();
    let mut matrix = matrix_from_yaml(MATRIX);

    for job in &mut matrix.jobs {
        apply_overrides(&mut job.env, &[("OPJ15".to_string(), "0".to_string())]);
    }

    let result = run_sequential(runner.clone(), &mut matrix).await;

    assert_run_passed(&result);
    // The flagged job's install is now disabled too
    assert_step_skipped(&result, "py27_opj15", "openjpeg15", "OPJ15");
    assert!(!runner
        .commands()
        .iter()
        .any(|c| c.contains("install_openjpeg15")));
}

/// Overrides can force a conditional step on
#[tokio::test]
async fn test_override_can_enable_flag() {
    let runner = FakeRunner::new();
    let mut matrix = matrix_from_yaml(MATRIX);

    for job in &mut matrix.jobs {
        apply_overrides(&mut job.env, &[("OPJ15".to_string(), "1".to_string())]);
    }

    let result = run_sequential(runner.clone(), &mut matrix).await;

    assert_run_passed(&result);
    assert_step_completed(&result, "py27", "openjpeg15");
    assert_step_completed(&result, "py27_opj15", "openjpeg15");

    let installs = runner
        .commands()
        .iter()
        .filter(|c| c.contains("install_openjpeg15"))
        .count();
    assert_eq!(installs, 2);
}
