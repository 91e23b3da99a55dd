//! Test: Conditional install steps gated by env flags

use crate::helpers::*;
use matrixci::core::StepState;

const MATRIX: &str = r#"
name: glymur
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
  - name: requirements
    run: pip install -r ci/requirements_{{ tag }}.txt
script:
  - name: unit-tests
    run: python -m unittest discover
"#;

/// The conditional install runs only for the flagged job
#[tokio::test]
async fn test_install_runs_only_when_flag_set() {
    let runner = FakeRunner::new();
    let mut matrix = matrix_from_yaml(MATRIX);

    let result = run_sequential(runner.clone(), &mut matrix).await;

    assert_run_passed(&result);

    assert_step_skipped(&result, "py27", "openjpeg15", "OPJ15");
    assert_step_completed(&result, "py27_opj15", "openjpeg15");

    // The install script was spawned exactly once, for the flagged job
    let installs: Vec<_> = runner
        .invocations()
        .into_iter()
        .filter(|i| i.command.contains("install_openjpeg15"))
        .collect();
    assert_eq!(installs.len(), 1);
    assert_eq!(
        installs[0].env.get("JOB_NAME"),
        Some(&"py27_opj15".to_string())
    );
}

/// A skipped install does not block the rest of the job
#[tokio::test]
async fn test_skipped_install_does_not_fail_job() {
    let runner = FakeRunner::new();
    let mut matrix = matrix_from_yaml(MATRIX);

    let result = run_sequential(runner, &mut matrix).await;

    assert_job_passed(&result, "py27");
    assert_step_completed(&result, "py27", "requirements");
    assert_step_completed(&result, "py27", "unit-tests");
}

/// A falsy flag value behaves like an unset flag
#[tokio::test]
async fn test_falsy_flag_skips_install() {
    let yaml = r#"
name: glymur
matrix:
  - name: py27_opj15_off
    tag: "27"
    env:
      OPJ15: "0"
install:
  - name: openjpeg15
    run: ci/install_openjpeg15.sh
    when: OPJ15
script:
  - name: unit-tests
    run: python -m unittest discover
"#;

    let runner = FakeRunner::new();
    let mut matrix = matrix_from_yaml(yaml);

    let result = run_sequential(runner.clone(), &mut matrix).await;

    assert_run_passed(&result);
    assert!(matches!(
        result.step_state("py27_opj15_off", "openjpeg15"),
        Some(StepState::Skipped { .. })
    ));
    assert!(!runner
        .commands()
        .iter()
        .any(|c| c.contains("install_openjpeg15")));
}

/// Negated conditions select the complementary jobs
#[tokio::test]
async fn test_negated_condition() {
    let yaml = r#"
name: glymur
matrix:
  - name: py27
    tag: "27"
  - name: py27_opj15
    tag: "27"
    env:
      OPJ15: "1"
install:
  - name: openjpeg2
    run: ci/install_openjpeg2.sh
    when: "!OPJ15"
script:
  - name: unit-tests
    run: python -m unittest discover
"#;

    let runner = FakeRunner::new();
    let mut matrix = matrix_from_yaml(yaml);

    let result = run_sequential(runner, &mut matrix).await;

    assert_step_completed(&result, "py27", "openjpeg2");
    assert_step_skipped(&result, "py27_opj15", "openjpeg2", "!OPJ15");
}
