//! Core domain models for matrixci
//!
//! This module defines the fundamental data structures that represent
//! a matrix, its jobs, and their configuration.

pub mod condition;
pub mod config;
pub mod env;
pub mod job;
pub mod matrix;
pub mod state;

pub use job::*;
pub use matrix::*;
pub use state::*;
