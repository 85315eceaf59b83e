//! AST golden-format snapshots (spec §8 concrete scenarios 1-3).
//!
//! These lock `pretty::print_program`'s exact text output — changing the
//! format is a breaking change, per spec §6.

use ferncore::parser::parse;
use ferncore::pretty::print_program;

#[test]
fn scenario_1_let_binding_golden_print() {
    let (program, diagnostics) = parse("let x = 1\n", "demo.fn");
    assert!(diagnostics.is_empty());
    let printed = print_program("demo.fn", &program);
    assert_eq!(
        printed,
        "AST for demo.fn:\n\nLet:\n  pattern:\n    PatIdent: x\n  value:\n    Int: 1\n\n"
    );
}

#[test]
fn scenario_2_match_with_literal_and_wildcard_arms() {
    let (program, diagnostics) = parse("match x:\n  1 -> 2\n  _ -> 3\n", "match.fn");
    assert!(diagnostics.is_empty());
    let printed = print_program("match.fn", &program);
    assert!(printed.contains("Match:"));
    assert!(printed.contains("arms: (2)"));
    assert!(printed.contains("PatLit:"));
    assert!(printed.contains("PatWildcard:"));
}

#[test]
fn scenario_3_list_comprehension_shape() {
    let (program, diagnostics) = parse("[x * 2 for x in nums if x > 0]\n", "comp.fn");
    assert!(diagnostics.is_empty());
    let printed = print_program("comp.fn", &program);
    assert!(printed.contains("ListComp:"));
    assert!(printed.contains("var: x"));
    assert!(printed.contains("condition:"));
}
