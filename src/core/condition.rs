//! Step condition model
//!
//! Conditions gate a step per job, evaluated against the job's resolved
//! environment. The grammar is deliberately small:
//!
//! - `FLAG` — true when the variable is set to a truthy value
//! - `!FLAG` — negation
//! - `VAR == value` / `VAR == "value"` — string equality

use anyhow::{bail, Result};
use regex::Regex;
use std::collections::BTreeMap;

/// A parsed `when` expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WhenCondition {
    /// Variable is set to a truthy value
    Flag(String),
    /// Variable is unset or falsy
    NotFlag(String),
    /// Variable equals a literal value
    Equals { var: String, value: String },
}

/// Falsy values for flag conditions (case-insensitive)
const FALSY: &[&str] = &["0", "false", "no"];

fn var_name_pattern() -> Regex {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap()
}

impl WhenCondition {
    /// Parse a `when` expression
    pub fn parse(expr: &str) -> Result<Self> {
        let expr = expr.trim();
        if expr.is_empty() {
            bail!("Empty condition expression");
        }

        let name_re = var_name_pattern();

        if let Some((lhs, rhs)) = expr.split_once("==") {
            let var = lhs.trim();
            if !name_re.is_match(var) {
                bail!("Invalid variable name in condition: '{}'", var);
            }
            let value = rhs.trim();
            let value = value
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .unwrap_or(value);
            return Ok(WhenCondition::Equals {
                var: var.to_string(),
                value: value.to_string(),
            });
        }

        if let Some(var) = expr.strip_prefix('!') {
            let var = var.trim();
            if !name_re.is_match(var) {
                bail!("Invalid variable name in condition: '{}'", var);
            }
            return Ok(WhenCondition::NotFlag(var.to_string()));
        }

        if !name_re.is_match(expr) {
            bail!("Invalid condition expression: '{}'", expr);
        }
        Ok(WhenCondition::Flag(expr.to_string()))
    }

    /// Evaluate the condition against a resolved job environment
    pub fn evaluate(&self, env: &BTreeMap<String, String>) -> bool {
        match self {
            WhenCondition::Flag(var) => env.get(var).is_some_and(|v| is_truthy(v)),
            WhenCondition::NotFlag(var) => !env.get(var).is_some_and(|v| is_truthy(v)),
            // Unset never compares equal, not even to the empty string
            WhenCondition::Equals { var, value } => env.get(var).is_some_and(|v| v == value),
        }
    }
}

impl std::fmt::Display for WhenCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WhenCondition::Flag(var) => write!(f, "{}", var),
            WhenCondition::NotFlag(var) => write!(f, "!{}", var),
            WhenCondition::Equals { var, value } => write!(f, "{} == \"{}\"", var, value),
        }
    }
}

fn is_truthy(value: &str) -> bool {
    !value.is_empty() && !FALSY.iter().any(|f| value.eq_ignore_ascii_case(f))
}
