//! Type soundness laws and exhaustive binary-op coverage (spec §8).

use ferncore::parser::parse;
use ferncore::typechecker::check;

fn diagnostics_for(src: &str) -> Vec<ferncore::Diagnostic> {
    let (program, parse_diags) = parse(src, "<test>");
    assert!(parse_diags.is_empty(), "unexpected parse errors: {:?}", parse_diags);
    check(&program)
}

fn type_checks(src: &str) -> bool {
    diagnostics_for(src).is_empty()
}

#[test]
fn literals_type_check_standalone() {
    assert!(type_checks("1\n"));
    assert!(type_checks("1.5\n"));
    assert!(type_checks("\"hi\"\n"));
    assert!(type_checks("true\n"));
}

#[test]
fn let_then_use_matches_bound_expression() {
    assert!(type_checks("let x: Int = 1\nx\n"));
}

#[test]
fn let_annotation_mismatch_is_an_error() {
    assert!(!type_checks("let x: Int = \"hi\"\n"));
}

#[test]
fn if_with_matching_branches_unifies() {
    assert!(type_checks("if true:\n  1\nelse:\n  2\n"));
}

#[test]
fn if_with_mismatched_branches_is_a_type_error() {
    assert!(!type_checks("if true:\n  1\nelse:\n  \"x\"\n"));
}

#[test]
fn every_numeric_binary_op_type_checks() {
    for op in ["+", "-", "*", "/", "%", "**"] {
        let src = format!("1 {} 2\n", op);
        assert!(type_checks(&src), "op {} should type check", op);
    }
}

#[test]
fn comparisons_type_check_on_numeric_operands() {
    for op in ["==", "!=", "<", "<=", ">", ">="] {
        let src = format!("1 {} 2\n", op);
        assert!(type_checks(&src), "op {}", op);
    }
}

#[test]
fn mismatched_operand_types_are_an_error() {
    assert!(!type_checks("1 + \"x\"\n"));
}

#[test]
fn typed_function_call_checks_out() {
    let diagnostics = diagnostics_for("fn add(a: Int, b: Int) -> Int:\n  a + b\nadd(2, 3)\n");
    assert!(diagnostics.is_empty(), "unexpected: {:?}", diagnostics);
}

#[test]
fn wrong_arity_call_is_an_error() {
    assert!(!type_checks("fn add(a: Int, b: Int) -> Int:\n  a + b\nadd(2)\n"));
}
