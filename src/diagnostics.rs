//! Diagnostic sink shared by the parser, validator, and type checker.
//!
//! Append-only: every stage after the lexer pushes `Diagnostic`s here
//! instead of returning early, so a single run can surface more than one
//! problem (see spec §7 "Propagation policy").

use crate::source::SourceLoc;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
    Note,
    Help,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Note => "note",
            Severity::Help => "help",
        };
        f.write_str(s)
    }
}

/// Whether a renderer should emit color. Actual ANSI styling is an external
/// collaborator's concern (spec §1); this just records the caller's intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorMode {
    Auto,
    Always,
    Never,
}

impl ColorMode {
    /// Resolve `--color` plus `NO_COLOR`/`FORCE_COLOR` the way the spec's
    /// §6 "Environment" section describes. `is_tty` stands in for the
    /// driver's own terminal detection.
    pub fn resolve(requested: ColorMode, no_color: bool, force_color: bool, is_tty: bool) -> bool {
        if no_color {
            return false;
        }
        if force_color {
            return true;
        }
        match requested {
            ColorMode::Always => true,
            ColorMode::Never => false,
            ColorMode::Auto => is_tty,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub loc: SourceLoc,
    pub message: String,
    /// A single caret-underlined line of source, when available.
    pub snippet: Option<String>,
}

impl Diagnostic {
    pub fn error(loc: SourceLoc, message: impl Into<String>) -> Self {
        Diagnostic {
            severity: Severity::Error,
            loc,
            message: message.into(),
            snippet: None,
        }
    }

    pub fn with_snippet(mut self, snippet: impl Into<String>) -> Self {
        self.snippet = Some(snippet.into());
        self
    }

    /// Plain-text rendering. Color is never applied here — see module docs.
    pub fn render(&self) -> String {
        let mut out = format!(
            "{}: {}: {}",
            self.loc, self.severity, self.message
        );
        if let Some(snippet) = &self.snippet {
            out.push('\n');
            out.push_str(snippet);
        }
        out
    }
}

/// Append-only collector for diagnostics produced across a compilation run.
#[derive(Debug, Default)]
pub struct DiagnosticSink {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticSink {
    pub fn new() -> Self {
        DiagnosticSink::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter()
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sink_tracks_error_presence() {
        let mut sink = DiagnosticSink::new();
        assert!(!sink.has_errors());
        sink.push(Diagnostic {
            severity: Severity::Warning,
            loc: SourceLoc::new("a.fn", 1, 1),
            message: "just a warning".into(),
            snippet: None,
        });
        assert!(!sink.has_errors());
        sink.push(Diagnostic::error(SourceLoc::new("a.fn", 2, 1), "boom"));
        assert!(sink.has_errors());
        assert_eq!(sink.len(), 2);
    }

    #[test]
    fn color_mode_resolution_honors_env_overrides() {
        assert!(!ColorMode::resolve(ColorMode::Always, true, false, true));
        assert!(ColorMode::resolve(ColorMode::Never, false, true, false));
        assert!(ColorMode::resolve(ColorMode::Auto, false, false, true));
        assert!(!ColorMode::resolve(ColorMode::Auto, false, false, false));
    }
}
