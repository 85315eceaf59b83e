//! Golden AST pretty-printer (spec §6 "AST golden format").
//!
//! Two-space indentation per level, one node per line, a node-kind name
//! followed by `:` and child labels. This format is locked by tests —
//! changing it is a breaking change, so resist the urge to "improve" the
//! layout once it matches a golden file.

use crate::ast::{Expr, FnBody, InterpPart, Pattern, Program, Stmt, TypeExpr};
use std::fmt::Write;

pub fn print_program(filename: &str, program: &Program) -> String {
    let mut out = format!("AST for {}:\n\n", filename);
    for stmt in &program.statements {
        print_stmt(&mut out, stmt, 0);
    }
    out.push('\n');
    out
}

fn indent(out: &mut String, level: usize) {
    for _ in 0..level {
        out.push_str("  ");
    }
}

fn line(out: &mut String, level: usize, text: &str) {
    indent(out, level);
    out.push_str(text);
    out.push('\n');
}

fn label(out: &mut String, level: usize, name: &str) {
    indent(out, level);
    let _ = writeln!(out, "{}:", name);
}

fn scalar(out: &mut String, level: usize, name: &str, value: &str) {
    indent(out, level);
    let _ = writeln!(out, "{}: {}", name, value);
}

fn count_label(out: &mut String, level: usize, name: &str, count: usize) {
    indent(out, level);
    let _ = writeln!(out, "{}: ({})", name, count);
}

fn print_stmt(out: &mut String, stmt: &Stmt, level: usize) {
    match stmt {
        Stmt::Let {
            pattern,
            type_ann,
            value,
            else_branch,
            ..
        } => {
            line(out, level, "Let:");
            label(out, level + 1, "pattern");
            print_pattern(out, pattern, level + 2);
            if let Some(t) = type_ann {
                label(out, level + 1, "type");
                print_type_expr(out, t, level + 2);
            }
            label(out, level + 1, "value");
            print_expr(out, value, level + 2);
            if let Some(e) = else_branch {
                label(out, level + 1, "else");
                print_expr(out, e, level + 2);
            }
        }
        Stmt::Return { value, cond, .. } => {
            line(out, level, "Return:");
            if let Some(v) = value {
                label(out, level + 1, "value");
                print_expr(out, v, level + 2);
            }
            if let Some(c) = cond {
                label(out, level + 1, "condition");
                print_expr(out, c, level + 2);
            }
        }
        Stmt::ExprStmt { expr, .. } => print_expr(out, expr, level),
        Stmt::Fn { name, body, .. } => {
            line(out, level, "Fn:");
            scalar(out, level + 1, "name", name);
            match body {
                FnBody::Params { params, body } => {
                    count_label(out, level + 1, "params", params.len());
                    for (pname, ty) in params {
                        if let Some(t) = ty {
                            indent(out, level + 2);
                            let _ = writeln!(out, "Param: {}", pname);
                            print_type_expr(out, t, level + 3);
                        } else {
                            scalar(out, level + 2, "Param", pname);
                        }
                    }
                    label(out, level + 1, "body");
                    print_expr(out, body, level + 2);
                }
                FnBody::Clauses(clauses) => {
                    count_label(out, level + 1, "clauses", clauses.len());
                    for clause in clauses {
                        line(out, level + 2, "Clause:");
                        count_label(out, level + 3, "params", clause.params.len());
                        for p in &clause.params {
                            print_pattern(out, p, level + 4);
                        }
                        if let Some(g) = &clause.guard {
                            label(out, level + 3, "guard");
                            print_expr(out, g, level + 4);
                        }
                        label(out, level + 3, "body");
                        print_expr(out, &clause.body, level + 4);
                    }
                }
            }
        }
        Stmt::Import { path, items, alias, .. } => {
            line(out, level, "Import:");
            scalar(out, level + 1, "path", path);
            if let Some(items) = items {
                count_label(out, level + 1, "items", items.len());
                for i in items {
                    scalar(out, level + 2, "Item", i);
                }
            }
            if let Some(a) = alias {
                scalar(out, level + 1, "alias", a);
            }
        }
        Stmt::Defer { expr, .. } => {
            line(out, level, "Defer:");
            label(out, level + 1, "value");
            print_expr(out, expr, level + 2);
        }
        Stmt::TypeDef {
            name,
            variants,
            record_fields,
            ..
        } => {
            line(out, level, "TypeDef:");
            scalar(out, level + 1, "name", name);
            if let Some(variants) = variants {
                count_label(out, level + 1, "variants", variants.len());
                for (vname, args) in variants {
                    indent(out, level + 2);
                    let _ = writeln!(out, "Variant: {}", vname);
                    for a in args {
                        print_type_expr(out, a, level + 3);
                    }
                }
            }
            if let Some(fields) = record_fields {
                count_label(out, level + 1, "fields", fields.len());
                for (fname, ty) in fields {
                    indent(out, level + 2);
                    let _ = writeln!(out, "Field: {}", fname);
                    print_type_expr(out, ty, level + 3);
                }
            }
        }
        Stmt::Break { value, .. } => {
            line(out, level, "Break:");
            if let Some(v) = value {
                label(out, level + 1, "value");
                print_expr(out, v, level + 2);
            }
        }
        Stmt::Continue { .. } => line(out, level, "Continue:"),
        Stmt::Trait { name, methods, .. } => {
            line(out, level, "Trait:");
            scalar(out, level + 1, "name", name);
            count_label(out, level + 1, "methods", methods.len());
            for m in methods {
                print_stmt(out, m, level + 2);
            }
        }
        Stmt::Impl {
            trait_name, methods, ..
        } => {
            line(out, level, "Impl:");
            scalar(out, level + 1, "trait", trait_name);
            count_label(out, level + 1, "methods", methods.len());
            for m in methods {
                print_stmt(out, m, level + 2);
            }
        }
        Stmt::Newtype { name, ctor, inner, .. } => {
            line(out, level, "Newtype:");
            scalar(out, level + 1, "name", name);
            scalar(out, level + 1, "ctor", ctor);
            label(out, level + 1, "inner");
            print_type_expr(out, inner, level + 2);
        }
        Stmt::Module { path, .. } => {
            line(out, level, "Module:");
            scalar(out, level + 1, "path", path);
        }
    }
}

fn print_pattern(out: &mut String, pattern: &Pattern, level: usize) {
    match pattern {
        Pattern::Ident { name, .. } => scalar(out, level, "PatIdent", name),
        Pattern::Wildcard { .. } => line(out, level, "PatWildcard:"),
        Pattern::Lit { value, .. } => {
            line(out, level, "PatLit:");
            print_expr(out, value, level + 1);
        }
        Pattern::Constructor { name, args, .. } => {
            line(out, level, "PatConstructor:");
            scalar(out, level + 1, "name", name);
            count_label(out, level + 1, "args", args.len());
            for a in args {
                print_pattern(out, a, level + 2);
            }
        }
        Pattern::Tuple { elements, .. } => {
            line(out, level, "PatTuple:");
            count_label(out, level + 1, "elements", elements.len());
            for e in elements {
                print_pattern(out, e, level + 2);
            }
        }
        Pattern::Rest { name, .. } => match name {
            Some(n) => scalar(out, level, "PatRest", n),
            None => line(out, level, "PatRest:"),
        },
    }
}

fn print_type_expr(out: &mut String, ty: &TypeExpr, level: usize) {
    match ty {
        TypeExpr::Named { name, args, .. } => {
            if args.is_empty() {
                scalar(out, level, "TypeNamed", name);
            } else {
                line(out, level, "TypeNamed:");
                scalar(out, level + 1, "name", name);
                count_label(out, level + 1, "args", args.len());
                for a in args {
                    print_type_expr(out, a, level + 2);
                }
            }
        }
        TypeExpr::Function { params, result, .. } => {
            line(out, level, "TypeFunction:");
            count_label(out, level + 1, "params", params.len());
            for p in params {
                print_type_expr(out, p, level + 2);
            }
            label(out, level + 1, "result");
            print_type_expr(out, result, level + 2);
        }
        TypeExpr::Tuple { elements, .. } => {
            line(out, level, "TypeTuple:");
            count_label(out, level + 1, "elements", elements.len());
            for e in elements {
                print_type_expr(out, e, level + 2);
            }
        }
    }
}

fn print_expr(out: &mut String, expr: &Expr, level: usize) {
    match expr {
        Expr::IntLit { value, .. } => scalar(out, level, "Int", &value.to_string()),
        Expr::FloatLit { value, .. } => scalar(out, level, "Float", &value.to_string()),
        Expr::StringLit { value, .. } => scalar(out, level, "String", value),
        Expr::BoolLit { value, .. } => scalar(out, level, "Bool", &value.to_string()),
        Expr::Ident { name, .. } => scalar(out, level, "Ident", name),
        Expr::Binary { op, left, right, .. } => {
            line(out, level, "Binary:");
            scalar(out, level + 1, "op", &format!("{:?}", op));
            label(out, level + 1, "left");
            print_expr(out, left, level + 2);
            label(out, level + 1, "right");
            print_expr(out, right, level + 2);
        }
        Expr::Unary { op, operand, .. } => {
            line(out, level, "Unary:");
            scalar(out, level + 1, "op", &format!("{:?}", op));
            label(out, level + 1, "operand");
            print_expr(out, operand, level + 2);
        }
        Expr::Call { callee, args, .. } => {
            line(out, level, "Call:");
            label(out, level + 1, "callee");
            print_expr(out, callee, level + 2);
            count_label(out, level + 1, "args", args.len());
            for a in args {
                if let Some(l) = &a.label {
                    indent(out, level + 2);
                    let _ = writeln!(out, "Arg ({}):", l);
                } else {
                    line(out, level + 2, "Arg:");
                }
                print_expr(out, &a.value, level + 3);
            }
        }
        Expr::If {
            cond,
            then_branch,
            else_branch,
            ..
        } => {
            line(out, level, "If:");
            label(out, level + 1, "condition");
            print_expr(out, cond, level + 2);
            label(out, level + 1, "then");
            print_expr(out, then_branch, level + 2);
            if let Some(e) = else_branch {
                label(out, level + 1, "else");
                print_expr(out, e, level + 2);
            }
        }
        Expr::Match {
            scrutinee, arms, ..
        } => {
            line(out, level, "Match:");
            label(out, level + 1, "value");
            print_expr(out, scrutinee, level + 2);
            count_label(out, level + 1, "arms", arms.len());
            for arm in arms {
                line(out, level + 2, "Arm:");
                label(out, level + 3, "pattern");
                print_pattern(out, &arm.pattern, level + 4);
                if let Some(g) = &arm.guard {
                    label(out, level + 3, "guard");
                    print_expr(out, g, level + 4);
                }
                label(out, level + 3, "body");
                print_expr(out, &arm.body, level + 4);
            }
        }
        Expr::Block { stmts, final_expr, .. } => {
            line(out, level, "Block:");
            count_label(out, level + 1, "stmts", stmts.len());
            for s in stmts {
                print_stmt(out, s, level + 2);
            }
            if let Some(e) = final_expr {
                label(out, level + 1, "final");
                print_expr(out, e, level + 2);
            }
        }
        Expr::List { elements, .. } => {
            line(out, level, "List:");
            count_label(out, level + 1, "elements", elements.len());
            for e in elements {
                print_expr(out, e, level + 2);
            }
        }
        Expr::Bind { name, value, .. } => {
            line(out, level, "Bind:");
            scalar(out, level + 1, "name", name);
            label(out, level + 1, "value");
            print_expr(out, value, level + 2);
        }
        Expr::With {
            bindings,
            body,
            else_arms,
            ..
        } => {
            line(out, level, "With:");
            count_label(out, level + 1, "bindings", bindings.len());
            for b in bindings {
                indent(out, level + 2);
                let _ = writeln!(out, "Binding: {}", b.name);
                print_expr(out, &b.value, level + 3);
            }
            label(out, level + 1, "body");
            print_expr(out, body, level + 2);
            if let Some(arms) = else_arms {
                count_label(out, level + 1, "else_arms", arms.len());
                for arm in arms {
                    line(out, level + 2, "ElseArm:");
                    label(out, level + 3, "pattern");
                    print_pattern(out, &arm.pattern, level + 4);
                    label(out, level + 3, "body");
                    print_expr(out, &arm.body, level + 4);
                }
            }
        }
        Expr::Dot { object, field, .. } => {
            line(out, level, "Dot:");
            label(out, level + 1, "object");
            print_expr(out, object, level + 2);
            scalar(out, level + 1, "field", field);
        }
        Expr::Range {
            start,
            end,
            inclusive,
            ..
        } => {
            line(out, level, "Range:");
            scalar(out, level + 1, "inclusive", &inclusive.to_string());
            label(out, level + 1, "start");
            print_expr(out, start, level + 2);
            label(out, level + 1, "end");
            print_expr(out, end, level + 2);
        }
        Expr::For {
            var_name,
            iterable,
            body,
            ..
        } => {
            line(out, level, "For:");
            scalar(out, level + 1, "var", var_name);
            label(out, level + 1, "iterable");
            print_expr(out, iterable, level + 2);
            label(out, level + 1, "body");
            print_expr(out, body, level + 2);
        }
        Expr::While { cond, body, .. } => {
            line(out, level, "While:");
            label(out, level + 1, "condition");
            print_expr(out, cond, level + 2);
            label(out, level + 1, "body");
            print_expr(out, body, level + 2);
        }
        Expr::Loop { body, .. } => {
            line(out, level, "Loop:");
            label(out, level + 1, "body");
            print_expr(out, body, level + 2);
        }
        Expr::Lambda { params, body, .. } => {
            line(out, level, "Lambda:");
            count_label(out, level + 1, "params", params.len());
            for p in params {
                scalar(out, level + 2, "Param", p);
            }
            label(out, level + 1, "body");
            print_expr(out, body, level + 2);
        }
        Expr::InterpString { parts, .. } => {
            line(out, level, "InterpString:");
            count_label(out, level + 1, "parts", parts.len());
            for p in parts {
                match p {
                    InterpPart::Text(t) => scalar(out, level + 2, "Text", t),
                    InterpPart::Expr(e) => {
                        line(out, level + 2, "Part:");
                        print_expr(out, e, level + 3);
                    }
                }
            }
        }
        Expr::Map { entries, .. } => {
            line(out, level, "Map:");
            count_label(out, level + 1, "entries", entries.len());
            for (k, v) in entries {
                line(out, level + 2, "Entry:");
                label(out, level + 3, "key");
                print_expr(out, k, level + 4);
                label(out, level + 3, "value");
                print_expr(out, v, level + 4);
            }
        }
        Expr::Tuple { elements, .. } => {
            line(out, level, "Tuple:");
            count_label(out, level + 1, "elements", elements.len());
            for e in elements {
                print_expr(out, e, level + 2);
            }
        }
        Expr::RecordUpdate { base, fields, .. } => {
            line(out, level, "RecordUpdate:");
            label(out, level + 1, "base");
            print_expr(out, base, level + 2);
            count_label(out, level + 1, "fields", fields.len());
            for f in fields {
                indent(out, level + 2);
                let _ = writeln!(out, "Field: {}", f.name);
                print_expr(out, &f.value, level + 3);
            }
        }
        Expr::ListComp {
            body,
            var_name,
            iterable,
            cond,
            ..
        } => {
            line(out, level, "ListComp:");
            label(out, level + 1, "body");
            print_expr(out, body, level + 2);
            scalar(out, level + 1, "var", var_name);
            label(out, level + 1, "iterable");
            print_expr(out, iterable, level + 2);
            if let Some(c) = cond {
                label(out, level + 1, "condition");
                print_expr(out, c, level + 2);
            }
        }
        Expr::Index { object, index, .. } => {
            line(out, level, "Index:");
            label(out, level + 1, "object");
            print_expr(out, object, level + 2);
            label(out, level + 1, "index");
            print_expr(out, index, level + 2);
        }
        Expr::Spawn { body, .. } => {
            line(out, level, "Spawn:");
            label(out, level + 1, "body");
            print_expr(out, body, level + 2);
        }
        Expr::Send { pid, message, .. } => {
            line(out, level, "Send:");
            label(out, level + 1, "pid");
            print_expr(out, pid, level + 2);
            label(out, level + 1, "message");
            print_expr(out, message, level + 2);
        }
        Expr::Receive {
            arms,
            after_ms,
            after_body,
            ..
        } => {
            line(out, level, "Receive:");
            count_label(out, level + 1, "arms", arms.len());
            for arm in arms {
                line(out, level + 2, "Arm:");
                label(out, level + 3, "pattern");
                print_pattern(out, &arm.pattern, level + 4);
                label(out, level + 3, "body");
                print_expr(out, &arm.body, level + 4);
            }
            if let Some(ms) = after_ms {
                label(out, level + 1, "after");
                print_expr(out, ms, level + 2);
            }
            if let Some(body) = after_body {
                label(out, level + 1, "after_body");
                print_expr(out, body, level + 2);
            }
        }
        Expr::Try { operand, .. } => {
            line(out, level, "Try:");
            label(out, level + 1, "operand");
            print_expr(out, operand, level + 2);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    #[test]
    fn matches_locked_golden_format_for_let() {
        let (program, diagnostics) = parse("let x = 1\n", "demo.fn");
        assert!(diagnostics.is_empty());
        let printed = print_program("demo.fn", &program);
        assert_eq!(
            printed,
            "AST for demo.fn:\n\nLet:\n  pattern:\n    PatIdent: x\n  value:\n    Int: 1\n\n"
        );
    }

    #[test]
    fn match_arms_show_count() {
        let (program, diagnostics) = parse("match x:\n  1 -> 2\n  _ -> 3\n", "m.fn");
        assert!(diagnostics.is_empty());
        let printed = print_program("m.fn", &program);
        assert!(printed.contains("arms: (2)"));
    }
}
