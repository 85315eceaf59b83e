//! Structural validator.
//!
//! In the reference implementation every AST field is a nullable pointer,
//! so the validator's job is mostly "is this required child present".
//! Here, required children are represented as non-`Option` `Box`/`Vec`
//! fields, so the type system already rules out the null case at parse
//! time. What's left for the validator is the set of shape invariants the
//! type system *can't* express directly: "exactly one of A or B", "this
//! vector must be non-empty", "these must be the unique top-level
//! definition of this name". The validator still walks the whole tree
//! exactly once (spec §4.4) so it remains the single safety net between
//! the parser and the type checker — it doesn't rewrite anything, and it
//! stops at the first violation.

use crate::ast::{Expr, FnBody, InterpPart, Pattern, Program, Stmt};
use crate::source::SourceLoc;
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq)]
pub struct ValidateError {
    pub message: String,
    pub loc: SourceLoc,
}

impl ValidateError {
    fn new(message: impl Into<String>, loc: &SourceLoc) -> Self {
        ValidateError {
            message: message.into(),
            loc: loc.clone(),
        }
    }
}

pub fn validate(program: &Program) -> Result<(), ValidateError> {
    let mut fn_names = HashSet::new();
    for stmt in &program.statements {
        validate_stmt(stmt, &mut fn_names)?;
    }
    Ok(())
}

fn validate_stmt(stmt: &Stmt, fn_names: &mut HashSet<String>) -> Result<(), ValidateError> {
    match stmt {
        Stmt::Fn { name, body, loc, .. } => {
            if !fn_names.insert(name.clone()) {
                return Err(ValidateError::new(
                    format!("function `{}` has non-adjacent clause groups", name),
                    loc,
                ));
            }
            match body {
                FnBody::Params { body, .. } => validate_expr(body)?,
                FnBody::Clauses(clauses) => {
                    if clauses.is_empty() {
                        return Err(ValidateError::new(
                            format!("function `{}` has no clauses", name),
                            loc,
                        ));
                    }
                    for clause in clauses {
                        for p in &clause.params {
                            validate_pattern(p)?;
                        }
                        if let Some(g) = &clause.guard {
                            validate_expr(g)?;
                        }
                        validate_expr(&clause.body)?;
                    }
                }
            }
            Ok(())
        }
        Stmt::Let {
            pattern,
            value,
            else_branch,
            ..
        } => {
            validate_pattern(pattern)?;
            validate_expr(value)?;
            if let Some(e) = else_branch {
                validate_expr(e)?;
            }
            Ok(())
        }
        Stmt::Return { value, cond, .. } => {
            if let Some(v) = value {
                validate_expr(v)?;
            }
            if let Some(c) = cond {
                validate_expr(c)?;
            }
            Ok(())
        }
        Stmt::ExprStmt { expr, .. } => validate_expr(expr),
        Stmt::Defer { expr, .. } => validate_expr(expr),
        Stmt::Break { value, .. } => {
            if let Some(v) = value {
                validate_expr(v)?;
            }
            Ok(())
        }
        Stmt::Continue { .. } => Ok(()),
        Stmt::Import { items, loc, .. } => {
            if let Some(items) = items {
                if items.is_empty() {
                    return Err(ValidateError::new(
                        "import item list must not be empty when present",
                        loc,
                    ));
                }
            }
            Ok(())
        }
        Stmt::TypeDef {
            name,
            variants,
            record_fields,
            loc,
            ..
        } => match (variants, record_fields) {
            (Some(_), Some(_)) => Err(ValidateError::new(
                format!(
                    "type `{}` must not declare both variants and record fields",
                    name
                ),
                loc,
            )),
            (None, None) => Err(ValidateError::new(
                format!("type `{}` declares neither variants nor record fields", name),
                loc,
            )),
            _ => Ok(()),
        },
        Stmt::Trait { methods, .. } | Stmt::Impl { methods, .. } => {
            for m in methods {
                validate_stmt(m, fn_names)?;
            }
            Ok(())
        }
        Stmt::Newtype { ctor, loc, .. } => {
            if ctor.is_empty() {
                return Err(ValidateError::new("newtype constructor name is empty", loc));
            }
            Ok(())
        }
        Stmt::Module { path, loc, .. } => {
            if path.is_empty() {
                return Err(ValidateError::new("module path is empty", loc));
            }
            Ok(())
        }
    }
}

fn validate_expr(expr: &Expr) -> Result<(), ValidateError> {
    match expr {
        Expr::IntLit { .. }
        | Expr::FloatLit { .. }
        | Expr::StringLit { .. }
        | Expr::BoolLit { .. }
        | Expr::Ident { .. } => Ok(()),
        Expr::Binary { left, right, .. } => {
            validate_expr(left)?;
            validate_expr(right)
        }
        Expr::Unary { operand, .. } => validate_expr(operand),
        Expr::Call { callee, args, .. } => {
            validate_expr(callee)?;
            for a in args {
                validate_expr(&a.value)?;
            }
            Ok(())
        }
        Expr::If {
            cond,
            then_branch,
            else_branch,
            ..
        } => {
            validate_expr(cond)?;
            validate_expr(then_branch)?;
            if let Some(e) = else_branch {
                validate_expr(e)?;
            }
            Ok(())
        }
        Expr::Match { scrutinee, arms, loc } => {
            if arms.is_empty() {
                return Err(ValidateError::new("match has no arms", loc));
            }
            validate_expr(scrutinee)?;
            for arm in arms {
                validate_pattern(&arm.pattern)?;
                if let Some(g) = &arm.guard {
                    validate_expr(g)?;
                }
                validate_expr(&arm.body)?;
            }
            Ok(())
        }
        Expr::Block {
            stmts, final_expr, ..
        } => {
            let mut fn_names = HashSet::new();
            for s in stmts {
                validate_stmt(s, &mut fn_names)?;
            }
            if let Some(e) = final_expr {
                validate_expr(e)?;
            }
            Ok(())
        }
        Expr::List { elements, .. } => {
            for e in elements {
                validate_expr(e)?;
            }
            Ok(())
        }
        Expr::Bind { value, .. } => validate_expr(value),
        Expr::With {
            bindings,
            body,
            else_arms,
            loc,
        } => {
            if bindings.is_empty() {
                return Err(ValidateError::new("with-block has no bindings", loc));
            }
            for b in bindings {
                validate_expr(&b.value)?;
            }
            validate_expr(body)?;
            if let Some(arms) = else_arms {
                for arm in arms {
                    validate_pattern(&arm.pattern)?;
                    validate_expr(&arm.body)?;
                }
            }
            Ok(())
        }
        Expr::Dot { object, .. } => validate_expr(object),
        Expr::Range { start, end, .. } => {
            validate_expr(start)?;
            validate_expr(end)
        }
        Expr::For {
            iterable, body, ..
        } => {
            validate_expr(iterable)?;
            validate_expr(body)
        }
        Expr::While { cond, body, .. } => {
            validate_expr(cond)?;
            validate_expr(body)
        }
        Expr::Loop { body, .. } => validate_expr(body),
        Expr::Lambda { body, .. } => validate_expr(body),
        Expr::InterpString { parts, .. } => {
            for p in parts {
                if let InterpPart::Expr(e) = p {
                    validate_expr(e)?;
                }
            }
            Ok(())
        }
        Expr::Map { entries, .. } => {
            for (k, v) in entries {
                validate_expr(k)?;
                validate_expr(v)?;
            }
            Ok(())
        }
        Expr::Tuple { elements, loc } => {
            if elements.len() < 2 {
                return Err(ValidateError::new(
                    "tuple literal must have at least two elements",
                    loc,
                ));
            }
            for e in elements {
                validate_expr(e)?;
            }
            Ok(())
        }
        Expr::RecordUpdate { base, fields, loc } => {
            if fields.is_empty() {
                return Err(ValidateError::new(
                    "record update has no fields",
                    loc,
                ));
            }
            validate_expr(base)?;
            for f in fields {
                validate_expr(&f.value)?;
            }
            Ok(())
        }
        Expr::ListComp {
            body,
            iterable,
            cond,
            ..
        } => {
            validate_expr(body)?;
            validate_expr(iterable)?;
            if let Some(c) = cond {
                validate_expr(c)?;
            }
            Ok(())
        }
        Expr::Index { object, index, .. } => {
            validate_expr(object)?;
            validate_expr(index)
        }
        Expr::Spawn { body, .. } => validate_expr(body),
        Expr::Send { pid, message, .. } => {
            validate_expr(pid)?;
            validate_expr(message)
        }
        Expr::Receive {
            arms,
            after_ms,
            after_body,
            loc,
        } => {
            if arms.is_empty() && after_ms.is_none() {
                return Err(ValidateError::new(
                    "receive has neither arms nor an after-clause",
                    loc,
                ));
            }
            for arm in arms {
                validate_pattern(&arm.pattern)?;
                validate_expr(&arm.body)?;
            }
            if let Some(ms) = after_ms {
                validate_expr(ms)?;
            }
            if let Some(body) = after_body {
                validate_expr(body)?;
            }
            Ok(())
        }
        Expr::Try { operand, .. } => validate_expr(operand),
    }
}

fn validate_pattern(pattern: &Pattern) -> Result<(), ValidateError> {
    match pattern {
        Pattern::Ident { .. } | Pattern::Wildcard { .. } | Pattern::Rest { .. } => Ok(()),
        Pattern::Lit { value, .. } => validate_expr(value),
        Pattern::Constructor { name, args, loc } => {
            if name.is_empty() {
                return Err(ValidateError::new("constructor pattern has empty name", loc));
            }
            for a in args {
                validate_pattern(a)?;
            }
            Ok(())
        }
        Pattern::Tuple { elements, loc } => {
            if elements.len() < 2 {
                return Err(ValidateError::new(
                    "tuple pattern must have at least two elements",
                    loc,
                ));
            }
            for e in elements {
                validate_pattern(e)?;
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn validate_src(src: &str) -> Result<(), ValidateError> {
        let (program, diagnostics) = parse(src, "<test>");
        assert!(diagnostics.is_empty(), "unexpected parse errors: {:?}", diagnostics);
        validate(&program)
    }

    #[test]
    fn accepts_well_formed_program() {
        assert!(validate_src("let x = 1\n").is_ok());
    }

    #[test]
    fn rejects_type_with_neither_shape() {
        // constructed directly since the parser cannot produce this shape
        let loc = SourceLoc::new("<test>", 1, 1);
        let program = Program {
            statements: vec![Stmt::TypeDef {
                name: "Foo".into(),
                is_pub: false,
                type_params: vec![],
                derives: vec![],
                variants: None,
                record_fields: None,
                loc,
            }],
        };
        assert!(validate(&program).is_err());
    }

    #[test]
    fn rejects_empty_match() {
        let loc = SourceLoc::new("<test>", 1, 1);
        let scrutinee = Box::new(Expr::Ident {
            name: "x".into(),
            loc: loc.clone(),
        });
        let expr = Expr::Match {
            scrutinee,
            arms: vec![],
            loc: loc.clone(),
        };
        let program = Program {
            statements: vec![Stmt::ExprStmt { expr, loc }],
        };
        assert!(validate(&program).is_err());
    }
}
