//! Test: Matrix expansion - entries become isolated jobs

use crate::helpers::*;
use matrixci::execution::SchedulingStrategy;

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

/// Every entry becomes a job; every job runs the full step list
#[tokio::test]
async fn test_every_entry_runs() {
    let runner = FakeRunner::new();
    let mut matrix = matrix_from_yaml(MATRIX);

    let result = run_sequential(runner.clone(), &mut matrix).await;

    assert_run_passed(&result);
    assert_eq!(
        result.passed_jobs(),
        vec!["py27", "py27_opj15", "py33"]
    );

    // 3 jobs x 3 steps
    assert_eq!(runner.commands().len(), 9);
}

/// The requirements template resolves per job tag
#[tokio::test]
async fn test_requirements_file_selected_by_tag() {
    let runner = FakeRunner::new();
    let mut matrix = matrix_from_yaml(MATRIX);

    run_sequential(runner.clone(), &mut matrix).await;

    let commands = runner.commands();
    assert!(commands.contains(&"pip install -r ci/requirements_27.txt".to_string()));
    assert!(commands.contains(&"pip install -r ci/requirements_33.txt".to_string()));
}

/// Each job sees its own JOB_NAME/JOB_TAG and flags; no cross-job leakage
#[tokio::test]
async fn test_job_environments_are_isolated() {
    let runner = FakeRunner::new();
    let mut matrix = matrix_from_yaml(MATRIX);

    run_sequential(runner.clone(), &mut matrix).await;

    let invocations = runner.invocations();

    let opj15_invocations: Vec<_> = invocations
        .iter()
        .filter(|i| i.env.get("JOB_NAME") == Some(&"py27_opj15".to_string()))
        .collect();
    assert_eq!(opj15_invocations.len(), 3);
    for invocation in &opj15_invocations {
        assert_eq!(invocation.env.get("OPJ15"), Some(&"1".to_string()));
        assert_eq!(invocation.env.get("JOB_TAG"), Some(&"27".to_string()));
    }

    // The flag never leaks into the other jobs
    for invocation in invocations
        .iter()
        .filter(|i| i.env.get("JOB_NAME") != Some(&"py27_opj15".to_string()))
    {
        assert_eq!(invocation.env.get("OPJ15"), None);
    }

    // Global env reaches every job
    for invocation in &invocations {
        assert_eq!(
            invocation.env.get("PIP_DOWNLOAD_CACHE"),
            Some(&"/tmp/pip-cache".to_string())
        );
    }
}

/// Parallel scheduling reaches the same terminal states
#[tokio::test]
async fn test_parallel_run_matches_sequential_outcome() {
    let runner = FakeRunner::new();
    let mut matrix = matrix_from_yaml(MATRIX);

    let result = run_matrix_with(runner, &mut matrix, SchedulingStrategy::Parallel).await;

    assert_run_passed(&result);
    assert_eq!(result.passed_jobs().len(), 3);
    assert_eq!(result.failed_jobs().len(), 0);
}
