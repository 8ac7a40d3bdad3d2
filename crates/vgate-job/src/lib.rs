//! External job runner.
//!
//! This crate provides:
//! - Argument building for the external processing job
//! - A runner with stderr streaming, timeout and cancellation
//! - Temp-file ownership that removes the upload exactly once
//! - Structured job lifecycle logging

pub mod command;
pub mod error;
pub mod fs_utils;
pub mod logging;

pub use command::{check_program, JobCommand, JobRunner};
pub use error::{JobError, JobResult};
pub use fs_utils::{remove_if_exists, TempFile};
pub use logging::JobLogger;
