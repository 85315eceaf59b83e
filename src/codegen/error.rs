//! Codegen's own small error enum (spec §7 "Codegen error").
//!
//! Unlike lex/parse/validate errors, an unsupported construct does not
//! abort a run: `lower_expr` emits a `# TODO:` comment into the IR stream
//! and keeps going, matching spec §7's "does not abort unless explicitly
//! fatal". `CodeGenError` exists for the handful of cases that really are
//! fatal (no `main` word equivalent, a malformed call target).

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum CodeGenError {
    UnsupportedConstruct { what: String },
    Fatal { message: String },
}

impl fmt::Display for CodeGenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodeGenError::UnsupportedConstruct { what } => {
                write!(f, "unsupported construct: {}", what)
            }
            CodeGenError::Fatal { message } => write!(f, "{}", message),
        }
    }
}

impl std::error::Error for CodeGenError {}
