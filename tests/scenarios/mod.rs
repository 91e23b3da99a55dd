pub mod allow_failure;
pub mod conditional_install;
pub mod env_overrides;
pub mod failure_handling;
pub mod matrix_expansion;
pub mod retry_behavior;
