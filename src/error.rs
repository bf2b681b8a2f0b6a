//! Application error type.
//!
//! Exit codes:
//! - `2`: configuration or I/O problem (bad flags, unreadable/unwritable files)
//! - `3`: not enough data to continue (no usable rows, empty train/test split)
//! - `4`: model or numeric failure (every registered model failed, non-finite output)
//!
//! Per-country and per-model problems are *not* errors; they are collected in
//! [`crate::domain::RunSummary`] and the run carries on.

#[derive(Clone, PartialEq, Eq)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}
