//! Compiler configuration.
//!
//! Grounded in the teacher's `compiler/src/config.rs::CompilerConfig` /
//! `ExternalBuiltin` builder pattern, trimmed to what this front-end
//! actually needs: a diagnostics-only mode switch, a color mode, and an
//! arena sizing knob. Unlike the teacher's config this one has no public
//! extension point — Fern's module-call dispatch table (`codegen::dispatch`)
//! is fixed by the language, not pluggable by embedders.

use crate::diagnostics::ColorMode;

/// How far the pipeline should run before stopping, independent of whether
/// diagnostics were produced (spec §5 "a diagnostic-only mode exists").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DiagnosticsMode {
    /// Lex, parse, validate, type-check, and generate code.
    #[default]
    Full,
    /// Lex, parse, validate, and type-check; skip codegen.
    TypeCheckOnly,
    /// Lex, parse, and validate only.
    ParseOnly,
}

/// Configuration threaded through the pipeline entry points in `lib.rs`.
#[derive(Debug, Clone)]
pub struct CompilerConfig {
    pub diagnostics_mode: DiagnosticsMode,
    pub color: ColorMode,
    pub arena_block_bytes: usize,
}

impl CompilerConfig {
    pub fn new() -> Self {
        CompilerConfig::default()
    }

    pub fn with_diagnostics_mode(mut self, mode: DiagnosticsMode) -> Self {
        self.diagnostics_mode = mode;
        self
    }

    pub fn with_color(mut self, color: ColorMode) -> Self {
        self.color = color;
        self
    }

    pub fn with_arena_block_bytes(mut self, bytes: usize) -> Self {
        self.arena_block_bytes = bytes;
        self
    }
}

impl Default for CompilerConfig {
    fn default() -> Self {
        CompilerConfig {
            diagnostics_mode: DiagnosticsMode::Full,
            color: ColorMode::Auto,
            arena_block_bytes: 64 * 1024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_runs_the_full_pipeline() {
        let config = CompilerConfig::new();
        assert_eq!(config.diagnostics_mode, DiagnosticsMode::Full);
        assert_eq!(config.arena_block_bytes, 64 * 1024);
    }

    #[test]
    fn builder_methods_chain() {
        let config = CompilerConfig::new()
            .with_diagnostics_mode(DiagnosticsMode::TypeCheckOnly)
            .with_color(ColorMode::Never)
            .with_arena_block_bytes(4096);
        assert_eq!(config.diagnostics_mode, DiagnosticsMode::TypeCheckOnly);
        assert_eq!(config.color, ColorMode::Never);
        assert_eq!(config.arena_block_bytes, 4096);
    }
}
