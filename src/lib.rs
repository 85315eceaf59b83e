//! Front-end compiler for the Fern language: lexer, parser, structural
//! validator, type checker, and SSA code generator, plus the `FernSim`
//! deterministic simulation harness used by actor tests.
//!
//! This crate is a pure function from source text to diagnostics and IR
//! text (spec §6 "Persisted state: none"). It never touches the filesystem
//! or shells out to a backend — callers own I/O and linking, the same
//! split the teacher workspace draws between `seqc` (library) and its
//! `clang`-invoking `main.rs`.

pub mod arena;
pub mod ast;
pub mod codegen;
pub mod config;
pub mod diagnostics;
pub mod lexer;
pub mod parser;
pub mod pretty;
pub mod sim;
pub mod source;
pub mod token;
pub mod typechecker;
pub mod types;
pub mod unify;
pub mod validator;

pub use ast::Program;
pub use codegen::CodeGen;
pub use config::{CompilerConfig, DiagnosticsMode};
pub use diagnostics::{ColorMode, Diagnostic, DiagnosticSink, Severity};
pub use validator::ValidateError;

/// Parse a source string into an AST plus every diagnostic the lexer and
/// parser produced. Never fails outright — per spec §7 the parser recovers
/// from errors and keeps going, so the caller decides what to do with a
/// non-empty diagnostic list.
pub fn parse_file(source: &str, filename: &str) -> (Program, Vec<Diagnostic>) {
    tracing::debug!(filename, "parsing");
    let (program, diagnostics) = parser::parse(source, filename);
    tracing::trace!(count = diagnostics.len(), "parse diagnostics");
    (program, diagnostics)
}

/// Run the full diagnostics pipeline short of codegen: lex, parse,
/// validate, type-check. Returns every diagnostic collected; an empty
/// result means the source is well-formed and fully typed.
pub fn check_file(source: &str, filename: &str, config: &CompilerConfig) -> Vec<Diagnostic> {
    let (program, mut diagnostics) = parse_file(source, filename);
    if !diagnostics.is_empty() {
        return diagnostics;
    }

    tracing::debug!(filename, "validating");
    if let Err(e) = validator::validate(&program) {
        diagnostics.push(Diagnostic::error(e.loc, e.message));
        return diagnostics;
    }

    if config.diagnostics_mode == DiagnosticsMode::ParseOnly {
        return diagnostics;
    }

    tracing::debug!(filename, "type checking");
    diagnostics.extend(typechecker::check(&program));
    diagnostics
}

/// Run the entire pipeline, including codegen, and return the SSA IR text.
/// Returns the accumulated diagnostics instead of IR if any stage before
/// codegen reported an error (spec §7 "Codegen assumes a validated,
/// checked AST").
pub fn compile_to_ir(
    source: &str,
    filename: &str,
    config: &CompilerConfig,
) -> Result<String, Vec<Diagnostic>> {
    let diagnostics = check_file(source, filename, config);
    if diagnostics.iter().any(|d| d.severity == Severity::Error) {
        return Err(diagnostics);
    }
    if config.diagnostics_mode != DiagnosticsMode::Full {
        return Err(diagnostics);
    }

    let (program, _) = parse_file(source, filename);
    tracing::debug!(filename, "generating code");
    let mut codegen = CodeGen::with_arena_block_bytes(config.arena_block_bytes);
    codegen
        .codegen_program(&program)
        .map_err(|e| vec![Diagnostic::error(source::SourceLoc::new(filename, 1, 1), e.to_string())])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_file_reports_no_diagnostics_for_well_formed_source() {
        let config = CompilerConfig::new();
        let diagnostics = check_file("let x = 1\n", "ok.fn", &config);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn check_file_reports_a_parse_error() {
        let config = CompilerConfig::new();
        let diagnostics = check_file("let = 1\n", "bad.fn", &config);
        assert!(!diagnostics.is_empty());
    }

    #[test]
    fn compile_to_ir_produces_an_export_function() {
        let config = CompilerConfig::new();
        let ir = compile_to_ir("fn add(a: Int, b: Int) -> Int: a + b\n", "add.fn", &config).unwrap();
        assert!(ir.contains("export function"));
    }

    #[test]
    fn parse_only_mode_skips_type_checking() {
        let config = CompilerConfig::new().with_diagnostics_mode(DiagnosticsMode::ParseOnly);
        let diagnostics = check_file("let x = 1\n", "ok.fn", &config);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn compile_to_ir_honors_the_configured_arena_block_size() {
        let config = CompilerConfig::new().with_arena_block_bytes(128);
        let ir = compile_to_ir("fn greet(): \"hi\"\n", "greet.fn", &config).unwrap();
        assert!(ir.contains("$str0"));
    }
}
