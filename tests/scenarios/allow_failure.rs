//! Test: allow_failure entries do not fail the run

use crate::helpers::*;

const MATRIX: &str = r#"
name: glymur
matrix:
  - name: py27
    tag: "27"
  - name: py34_dev
    tag: "34"
    allow_failure: true
    env:
      DEV: "1"
install:
  - name: dev-deps
    run: pip install --pre -r ci/requirements_{{ tag }}.txt
    when: DEV
script:
  - name: unit-tests
    run: python -m unittest discover
"#;

/// An allowed failure is recorded but the run still passes
#[tokio::test]
async fn test_allowed_failure_keeps_run_green() {
    let runner = FakeRunner::new().fail_on("--pre");
    let mut matrix = matrix_from_yaml(MATRIX);

    let result = run_sequential(runner, &mut matrix).await;

    assert_run_passed(&result);
    assert_job_passed(&result, "py27");
    assert_job_failed(&result, "py34_dev", "dev-deps");
    assert_eq!(result.matrix.state.failed_jobs, 1);
}

/// A failure in a required job still fails the run
#[tokio::test]
async fn test_required_failure_fails_run() {
    let runner = FakeRunner::new().fail_on("unittest");
    let mut matrix = matrix_from_yaml(MATRIX);

    let result = run_sequential(runner, &mut matrix).await;

    assert_run_failed(&result);
    assert_job_failed(&result, "py27", "unit-tests");
}
