//! Test: Step retry behavior

use crate::helpers::*;

const FLAKY: &str = r#"
name: glymur
matrix:
  - name: py33
    tag: "33"
script:
  - name: unit-tests
    run: python -m unittest discover
    retries: 2
  - name: version-smoke
    run: python -c "import glymur; print(glymur.version.info)"
"#;

/// A step that recovers within its retry budget passes
#[tokio::test]
async fn test_flaky_step_recovers() {
    let runner = FakeRunner::new().fail_times("unittest", 1);
    let mut matrix = matrix_from_yaml(FLAKY);

    let result = run_sequential(runner.clone(), &mut matrix).await;

    assert_run_passed(&result);
    assert_step_completed(&result, "py33", "unit-tests");
    assert_eq!(result.step_attempts("py33", "unit-tests"), 2);

    // First attempt + one retry, then the smoke step
    assert_eq!(runner.commands().len(), 3);
}

/// Retries exhausted: the step fails with the full attempt count
#[tokio::test]
async fn test_retries_exhausted_fails_job() {
    let runner = FakeRunner::new().fail_on("unittest");
    let mut matrix = matrix_from_yaml(FLAKY);

    let result = run_sequential(runner.clone(), &mut matrix).await;

    assert_run_failed(&result);
    assert_job_failed(&result, "py33", "unit-tests");
    assert_eq!(result.step_attempts("py33", "unit-tests"), 3);
    assert_step_skipped(&result, "py33", "version-smoke", "unit-tests");
}

/// Steps without a retries setting fail on the first non-zero exit
#[tokio::test]
async fn test_default_is_no_retries() {
    let yaml = r#"
name: glymur
matrix:
  - name: py33
    tag: "33"
script:
  - name: unit-tests
    run: python -m unittest discover
"#;

    let runner = FakeRunner::new().fail_on("unittest");
    let mut matrix = matrix_from_yaml(yaml);

    let result = run_sequential(runner.clone(), &mut matrix).await;

    assert_run_failed(&result);
    assert_eq!(result.step_attempts("py33", "unit-tests"), 1);
    assert_eq!(runner.commands().len(), 1);
}

/// A global retry default applies to steps that do not override it
#[tokio::test]
async fn test_global_retry_default() {
    let yaml = r#"
name: glymur
max_step_retries: 1
matrix:
  - name: py33
    tag: "33"
script:
  - name: unit-tests
    run: python -m unittest discover
"#;

    let runner = FakeRunner::new().fail_times("unittest", 1);
    let mut matrix = matrix_from_yaml(yaml);

    let result = run_sequential(runner, &mut matrix).await;

    assert_run_passed(&result);
    assert_eq!(result.step_attempts("py33", "unit-tests"), 2);
}
