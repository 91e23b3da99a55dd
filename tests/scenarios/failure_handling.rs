//! Test: Failure handling - non-zero exits fail the job, not the others

use crate::helpers::*;
use matrixci::core::StepState;

const MATRIX: &str = r#"
name: glymur
matrix:
  - name: py27
    tag: "27"
  - name: py33
    tag: "33"
install:
  - name: requirements
    run: pip install -r ci/requirements_{{ tag }}.txt
script:
  - name: unit-tests
    run: python -m unittest discover
  - name: version-smoke
    run: python -c "import glymur; print(glymur.version.info)"
"#;

/// A failing test step fails its job and the run
#[tokio::test]
async fn test_failing_script_fails_run() {
    let runner = FakeRunner::new().fail_on("unittest");
    let mut matrix = matrix_from_yaml(MATRIX);

    let result = run_sequential(runner, &mut matrix).await;

    assert_run_failed(&result);
    assert_job_failed(&result, "py27", "unit-tests");
    assert_job_failed(&result, "py33", "unit-tests");
}

/// Steps after the failure are skipped, with the failed step named
#[tokio::test]
async fn test_steps_after_failure_are_skipped() {
    let runner = FakeRunner::new().fail_on("unittest");
    let mut matrix = matrix_from_yaml(MATRIX);

    let result = run_sequential(runner.clone(), &mut matrix).await;

    assert_step_completed(&result, "py27", "requirements");
    assert_step_skipped(&result, "py27", "version-smoke", "unit-tests");

    // The smoke check never reached the shell
    assert!(!runner.commands().iter().any(|c| c.contains("version.info")));
}

/// A failing install skips the whole script phase
#[tokio::test]
async fn test_failing_install_skips_script_phase() {
    let runner = FakeRunner::new().fail_on("requirements_27");
    let mut matrix = matrix_from_yaml(MATRIX);

    let result = run_sequential(runner, &mut matrix).await;

    assert_job_failed(&result, "py27", "requirements");
    assert_step_skipped(&result, "py27", "unit-tests", "requirements");
    assert_step_skipped(&result, "py27", "version-smoke", "requirements");

    // The tag-27 failure leaves the tag-33 job untouched
    assert_job_passed(&result, "py33");
}

/// The failed step records its exit code
#[tokio::test]
async fn test_failed_step_records_exit_code() {
    let runner = FakeRunner::new().fail_on("unittest");
    let mut matrix = matrix_from_yaml(MATRIX);

    let result = run_sequential(runner, &mut matrix).await;

    match result.step_state("py27", "unit-tests") {
        Some(StepState::Failed {
            exit_code, error, ..
        }) => {
            assert_eq!(exit_code, Some(1));
            assert!(error.contains("code 1"), "error was: {}", error);
        }
        other => panic!("Expected Failed, got {:?}", other),
    }
}
