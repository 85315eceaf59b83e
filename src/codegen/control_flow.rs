//! `if` / `match` / `for` / `while` / `loop` / `with` / block lowering
//! (spec §4.6 "Emission rules").

use crate::ast::{Expr, Pattern, Stmt};
use crate::codegen::error::CodeGenError;
use crate::codegen::expr::{Lowerer, Value};
use crate::codegen::value_abi::Abi;
use std::fmt::Write;

pub fn lower(lowerer: &mut Lowerer, expr: &Expr, out: &mut String) -> Result<Value, CodeGenError> {
    match expr {
        Expr::If {
            cond,
            then_branch,
            else_branch,
            ..
        } => lower_if(lowerer, cond, then_branch, else_branch.as_deref(), out),
        Expr::Match { scrutinee, arms, .. } => lower_match(lowerer, scrutinee, arms, out),
        Expr::Block { stmts, final_expr, .. } => lower_block(lowerer, stmts, final_expr.as_deref(), out),
        Expr::For {
            var_name,
            iterable,
            body,
            ..
        } => lower_for(lowerer, var_name, iterable, body, out),
        Expr::While { cond, body, .. } => lower_while(lowerer, cond, body, out),
        Expr::Loop { body, .. } => lower_loop(lowerer, body, out),
        Expr::With {
            bindings,
            body,
            else_arms,
            ..
        } => lower_with(lowerer, bindings, body, else_arms.as_deref(), out),
        _ => unreachable!("lower() called on a non-control-flow expression"),
    }
}

fn lower_if(
    lowerer: &mut Lowerer,
    cond: &Expr,
    then_branch: &Expr,
    else_branch: Option<&Expr>,
    out: &mut String,
) -> Result<Value, CodeGenError> {
    let cond_val = lowerer.lower_expr(cond, out)?;
    let then_label = lowerer.module.fresh_label();
    let else_label = lowerer.module.fresh_label();
    let join_label = lowerer.module.fresh_label();
    let result = lowerer.func.fresh_temp();

    let _ = writeln!(out, "jnz {}, {}, {}", cond_val.text, then_label, else_label);
    let _ = writeln!(out, "{}", then_label);
    let then_val = lowerer.lower_expr(then_branch, out)?;
    let _ = writeln!(out, "{} ={} copy {}", result, then_val.abi, then_val.text);
    let _ = writeln!(out, "jmp {}", join_label);
    let _ = writeln!(out, "{}", else_label);
    let else_abi = match else_branch {
        Some(e) => {
            let v = lowerer.lower_expr(e, out)?;
            let _ = writeln!(out, "{} ={} copy {}", result, v.abi, v.text);
            v.abi
        }
        None => {
            let _ = writeln!(out, "{} =w copy 0", result);
            Abi::W
        }
    };
    let _ = writeln!(out, "jmp {}", join_label);
    let _ = writeln!(out, "{}", join_label);
    Ok(Value::new(result, else_abi.merge(then_val.abi)))
}

fn lower_match(
    lowerer: &mut Lowerer,
    scrutinee: &Expr,
    arms: &[crate::ast::MatchArm],
    out: &mut String,
) -> Result<Value, CodeGenError> {
    let scrutinee_val = lowerer.lower_expr(scrutinee, out)?;
    let join_label = lowerer.module.fresh_label();
    let result = lowerer.func.fresh_temp();

    let mut arm_labels = Vec::with_capacity(arms.len());
    for _ in arms {
        arm_labels.push((lowerer.module.fresh_label(), lowerer.module.fresh_label()));
    }
    let default_label = lowerer.module.fresh_label();

    if let Some((first_test, _)) = arm_labels.first() {
        let _ = writeln!(out, "jmp {}", first_test);
    } else {
        let _ = writeln!(out, "jmp {}", default_label);
    }

    for (i, arm) in arms.iter().enumerate() {
        let (test_label, body_label) = &arm_labels[i];
        let _ = writeln!(out, "{}", test_label);
        let next = if i + 1 < arms.len() {
            arm_labels[i + 1].0.clone()
        } else {
            default_label.clone()
        };
        lower_pattern_test(lowerer, &arm.pattern, &scrutinee_val, body_label, &next, out);
        let _ = writeln!(out, "{}", body_label);
        let arm_val = lowerer.lower_expr(&arm.body, out)?;
        let _ = writeln!(out, "{} ={} copy {}", result, arm_val.abi, arm_val.text);
        let _ = writeln!(out, "jmp {}", join_label);
    }
    let _ = writeln!(out, "{}", default_label);
    let _ = writeln!(out, "{} =w copy 0", result);
    let _ = writeln!(out, "jmp {}", join_label);
    let _ = writeln!(out, "{}", join_label);
    Ok(Value::new(result, Abi::L))
}

/// Emit the pattern test for one `match` arm. Wildcard always matches;
/// ident binds and matches; literal compares equal; constructor dispatches
/// on the runtime tag then descends into fields (spec §4.6).
fn lower_pattern_test(
    lowerer: &mut Lowerer,
    pattern: &Pattern,
    scrutinee: &Value,
    body_label: &str,
    next_label: &str,
    out: &mut String,
) {
    match pattern {
        Pattern::Wildcard { .. } => {
            let _ = writeln!(out, "jmp {}", body_label);
        }
        Pattern::Ident { name, .. } => {
            let _ = writeln!(out, "%{} ={} copy {}", name, scrutinee.abi, scrutinee.text);
            lowerer.func.bind_local(name.clone(), scrutinee.abi);
            let _ = writeln!(out, "jmp {}", body_label);
        }
        Pattern::Lit { value, .. } => {
            let lit_val = match lowerer.lower_expr(value, out) {
                Ok(v) => v,
                Err(_) => Value::new("0", Abi::W),
            };
            let check = lowerer.func.fresh_temp();
            let _ = writeln!(
                out,
                "{} =w ceqw {}, {}",
                check, scrutinee.text, lit_val.text
            );
            let _ = writeln!(out, "jnz {}, {}, {}", check, body_label, next_label);
        }
        Pattern::Constructor { name, .. } => {
            let tag = lowerer.func.fresh_temp();
            let check = lowerer.func.fresh_temp();
            let _ = writeln!(out, "{} =w call $fern_tag_of(l {})", tag, scrutinee.text);
            let _ = writeln!(
                out,
                "{} =w ceqw {}, $fern_tag_{}",
                check, tag, name
            );
            let _ = writeln!(out, "jnz {}, {}, {}", check, body_label, next_label);
        }
        Pattern::Tuple { .. } | Pattern::Rest { .. } => {
            let _ = writeln!(out, "jmp {}", body_label);
        }
    }
}

fn lower_block(
    lowerer: &mut Lowerer,
    stmts: &[Stmt],
    final_expr: Option<&Expr>,
    out: &mut String,
) -> Result<Value, CodeGenError> {
    for stmt in stmts {
        lower_stmt(lowerer, stmt, out)?;
    }
    match final_expr {
        Some(e) => lowerer.lower_expr(e, out),
        None => {
            let t = lowerer.func.fresh_temp();
            let _ = writeln!(out, "{} =w copy 0", t);
            Ok(Value::new(t, Abi::W))
        }
    }
}

pub fn lower_stmt(lowerer: &mut Lowerer, stmt: &Stmt, out: &mut String) -> Result<(), CodeGenError> {
    match stmt {
        Stmt::Let { pattern, value, .. } => {
            let v = lowerer.lower_expr(value, out)?;
            if let Pattern::Ident { name, .. } = pattern {
                let _ = writeln!(out, "%{} ={} copy {}", name, v.abi, v.text);
                lowerer.func.bind_local(name.clone(), v.abi);
            } else {
                // spec §9 open question: destructuring lets beyond a bare
                // ident are parsed but codegen has no lowering yet.
                let _ = writeln!(out, "# TODO: let-destructuring lowering for {}", pattern.kind_name());
            }
            Ok(())
        }
        Stmt::ExprStmt { expr, .. } => {
            lowerer.lower_expr(expr, out)?;
            Ok(())
        }
        Stmt::Defer { expr, .. } => {
            let mut snippet = String::new();
            let v = lowerer.lower_expr(expr, &mut snippet)?;
            let _ = writeln!(snippet, "# defer result {} discarded at flush", v.text);
            lowerer.func.push_defer(snippet);
            Ok(())
        }
        Stmt::Return { value, .. } => {
            let v = match value {
                Some(e) => lowerer.lower_expr(e, out)?,
                None => Value::new("0", Abi::W),
            };
            lowerer.func.flush_defers(out);
            let _ = writeln!(out, "ret {}", v.text);
            Ok(())
        }
        _ => {
            let _ = writeln!(out, "# TODO: unsupported statement {}", stmt.kind_name());
            Ok(())
        }
    }
}

fn lower_for(
    lowerer: &mut Lowerer,
    var_name: &str,
    iterable: &Expr,
    body: &Expr,
    out: &mut String,
) -> Result<Value, CodeGenError> {
    let iter_val = lowerer.lower_expr(iterable, out)?;
    let len = lowerer.func.fresh_temp();
    let _ = writeln!(out, "{} =w call $fern_list_len(l {})", len, iter_val.text);
    let counter = format!("%{}__i", var_name);
    let _ = writeln!(out, "{} =w copy 0", counter);

    let cond_label = lowerer.module.fresh_label();
    let body_label = lowerer.module.fresh_label();
    let done_label = lowerer.module.fresh_label();

    let _ = writeln!(out, "jmp {}", cond_label);
    let _ = writeln!(out, "{}", cond_label);
    let keep_going = lowerer.func.fresh_temp();
    let _ = writeln!(out, "{} =w csltw {}, {}", keep_going, counter, len);
    let _ = writeln!(out, "jnz {}, {}, {}", keep_going, body_label, done_label);
    let _ = writeln!(out, "{}", body_label);
    let _ = writeln!(
        out,
        "%{} =l call $fern_list_get(l {}, w {})",
        var_name, iter_val.text, counter
    );
    lowerer.func.bind_local(var_name.to_string(), Abi::L);
    lowerer.lower_expr(body, out)?;
    let _ = writeln!(out, "{} =w add {}, 1", counter, counter);
    let _ = writeln!(out, "jmp {}", cond_label);
    let _ = writeln!(out, "{}", done_label);
    let t = lowerer.func.fresh_temp();
    let _ = writeln!(out, "{} =w copy 0", t);
    Ok(Value::new(t, Abi::W))
}

/// `while`/`loop` are parsed and lowered best-effort even though the
/// language specification says they "do not exist" (spec §9 open
/// question) — the type checker is the stage that flags this, codegen
/// just needs to produce well-formed SSA for whatever the checker let
/// through.
fn lower_while(lowerer: &mut Lowerer, cond: &Expr, body: &Expr, out: &mut String) -> Result<Value, CodeGenError> {
    let cond_label = lowerer.module.fresh_label();
    let body_label = lowerer.module.fresh_label();
    let done_label = lowerer.module.fresh_label();
    let _ = writeln!(out, "jmp {}", cond_label);
    let _ = writeln!(out, "{}", cond_label);
    let cond_val = lowerer.lower_expr(cond, out)?;
    let _ = writeln!(out, "jnz {}, {}, {}", cond_val.text, body_label, done_label);
    let _ = writeln!(out, "{}", body_label);
    lowerer.lower_expr(body, out)?;
    let _ = writeln!(out, "jmp {}", cond_label);
    let _ = writeln!(out, "{}", done_label);
    let t = lowerer.func.fresh_temp();
    let _ = writeln!(out, "{} =w copy 0", t);
    Ok(Value::new(t, Abi::W))
}

fn lower_loop(lowerer: &mut Lowerer, body: &Expr, out: &mut String) -> Result<Value, CodeGenError> {
    let top_label = lowerer.module.fresh_label();
    let _ = writeln!(out, "jmp {}", top_label);
    let _ = writeln!(out, "{}", top_label);
    lowerer.lower_expr(body, out)?;
    let _ = writeln!(out, "jmp {}", top_label);
    let t = lowerer.func.fresh_temp();
    let _ = writeln!(out, "{} =w copy 0", t);
    Ok(Value::new(t, Abi::W))
}

fn lower_with(
    lowerer: &mut Lowerer,
    bindings: &[crate::ast::WithBinding],
    body: &Expr,
    else_arms: Option<&[crate::ast::ElseArm]>,
    out: &mut String,
) -> Result<Value, CodeGenError> {
    let err_label = lowerer.module.fresh_label();
    let join_label = lowerer.module.fresh_label();
    let result = lowerer.func.fresh_temp();
    let err_value = lowerer.func.fresh_temp();

    for binding in bindings {
        let v = lowerer.lower_expr(&binding.value, out)?;
        let ok_check = lowerer.func.fresh_temp();
        let ok_label = lowerer.module.fresh_label();
        let fail_label = lowerer.module.fresh_label();
        let _ = writeln!(out, "{} =w call $fern_result_is_ok(l {})", ok_check, v.text);
        let _ = writeln!(out, "jnz {}, {}, {}", ok_check, ok_label, fail_label);
        let _ = writeln!(out, "{}", fail_label);
        let _ = writeln!(out, "{} =l copy {}", err_value, v.text);
        let _ = writeln!(out, "jmp {}", err_label);
        let _ = writeln!(out, "{}", ok_label);
        let unwrapped = lowerer.func.fresh_temp();
        let _ = writeln!(out, "{} =l call $fern_result_unwrap(l {})", unwrapped, v.text);
        let _ = writeln!(out, "%{} =l copy {}", binding.name, unwrapped);
        lowerer.func.bind_local(binding.name.clone(), Abi::L);
    }
    let body_val = lowerer.lower_expr(body, out)?;
    let _ = writeln!(out, "{} ={} copy {}", result, body_val.abi, body_val.text);
    let _ = writeln!(out, "jmp {}", join_label);

    let _ = writeln!(out, "{}", err_label);
    match else_arms {
        Some(arms) if !arms.is_empty() => {
            let err_payload = lowerer.func.fresh_temp();
            let _ = writeln!(
                out,
                "{} =l call $fern_result_unwrap_err(l {})",
                err_payload, err_value
            );
            let err_as_value = Value::new(err_payload, Abi::L);

            let mut arm_labels = Vec::with_capacity(arms.len());
            for _ in arms {
                arm_labels.push((lowerer.module.fresh_label(), lowerer.module.fresh_label()));
            }
            let no_match_label = lowerer.module.fresh_label();

            if let Some((first_test, _)) = arm_labels.first() {
                let _ = writeln!(out, "jmp {}", first_test);
            } else {
                let _ = writeln!(out, "jmp {}", no_match_label);
            }

            // Each else-arm's pattern is tested in turn against the
            // unwrapped error payload (same dispatch `lower_pattern_test`
            // uses for `match`), falling through to the next arm or to the
            // raw-error return if nothing matches (spec §4.6 "the error
            // path matches else-arms or falls through returning the
            // error").
            for (i, arm) in arms.iter().enumerate() {
                let (test_label, body_label) = &arm_labels[i];
                let _ = writeln!(out, "{}", test_label);
                let next = if i + 1 < arms.len() {
                    arm_labels[i + 1].0.clone()
                } else {
                    no_match_label.clone()
                };
                lower_pattern_test(lowerer, &arm.pattern, &err_as_value, body_label, &next, out);
                let _ = writeln!(out, "{}", body_label);
                let arm_val = lowerer.lower_expr(&arm.body, out)?;
                let _ = writeln!(out, "{} ={} copy {}", result, arm_val.abi, arm_val.text);
                let _ = writeln!(out, "jmp {}", join_label);
            }
            let _ = writeln!(out, "{}", no_match_label);
            let _ = writeln!(out, "{} =l copy {}", result, err_value);
            let _ = writeln!(out, "jmp {}", join_label);
        }
        _ => {
            let _ = writeln!(out, "{} =l copy {}", result, err_value);
            let _ = writeln!(out, "jmp {}", join_label);
        }
    }
    let _ = writeln!(out, "{}", join_label);
    Ok(Value::new(result, Abi::L))
}
