//! Bidirectional Hindley-Milner-style type checker (spec §4.5).
//!
//! Explicit annotations act as expected types to unify against. Errors are
//! recorded as both a `Diagnostic` (for reporting) and a `Type::Error`
//! carried by the expression (so inference can keep walking instead of
//! halting — one file yields multiple diagnostics).

use crate::ast::{BinaryOp, Expr, FnBody, InterpPart, Pattern, Program, Stmt, UnaryOp};
use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::source::SourceLoc;
use crate::types::{Type, TypeEnv};
use crate::unify::unify;

pub struct TypeChecker {
    env: TypeEnv,
    diagnostics: DiagnosticSink,
    fn_result_stack: Vec<Type>,
}

pub fn check(program: &Program) -> Vec<Diagnostic> {
    let mut checker = TypeChecker::new();
    checker.check_program(program);
    checker.diagnostics.into_vec()
}

impl TypeChecker {
    pub fn new() -> Self {
        TypeChecker {
            env: TypeEnv::new(),
            diagnostics: DiagnosticSink::new(),
            fn_result_stack: Vec::new(),
        }
    }

    fn error(&mut self, loc: &SourceLoc, message: impl Into<String>) -> Type {
        let message = message.into();
        self.diagnostics.push(Diagnostic::error(loc.clone(), message.clone()));
        Type::Error { message }
    }

    fn unify_report(&mut self, a: &Type, b: &Type, loc: &SourceLoc, context: &str) -> Type {
        if a.is_error() {
            return a.clone();
        }
        if b.is_error() {
            return b.clone();
        }
        match unify(a, b) {
            Ok(()) => a.prune(),
            Err(e) => self.error(loc, format!("{}: {}", context, e.message)),
        }
    }

    pub fn check_program(&mut self, program: &Program) {
        for stmt in &program.statements {
            self.check_stmt(stmt);
        }
    }

    fn check_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Let {
                pattern,
                type_ann,
                value,
                else_branch,
                loc,
            } => {
                let value_ty = self.infer_expr(value);
                let value_ty = if let Some(ann) = type_ann {
                    let expected = self.type_expr_to_type(ann);
                    self.unify_report(&value_ty, &expected, loc, "let annotation")
                } else {
                    value_ty
                };
                self.bind_pattern(pattern, &value_ty);
                if let Some(fallback) = else_branch {
                    self.infer_expr(fallback);
                }
            }
            Stmt::Return { value, cond, .. } => {
                if let Some(v) = value {
                    let ty = self.infer_expr(v);
                    if let Some(expected) = self.fn_result_stack.last().cloned() {
                        self.unify_report(&ty, &expected, v.loc(), "return value");
                    }
                }
                if let Some(c) = cond {
                    let cond_ty = self.infer_expr(c);
                    self.unify_report(&cond_ty, &Type::Bool, c.loc(), "return condition");
                }
            }
            Stmt::ExprStmt { expr, .. } => {
                self.infer_expr(expr);
            }
            Stmt::Defer { expr, .. } => {
                self.infer_expr(expr);
            }
            Stmt::Break { value, .. } => {
                if let Some(v) = value {
                    self.infer_expr(v);
                }
            }
            Stmt::Continue { .. } => {}
            Stmt::Import { .. } | Stmt::Module { .. } => {}
            Stmt::Fn {
                name,
                body,
                return_type,
                loc,
                ..
            } => self.check_fn(name, body, return_type.as_ref(), loc),
            Stmt::TypeDef { name, loc, .. } => {
                self.env.define_type(name.clone(), Type::Con {
                    name: name.clone(),
                    args: vec![],
                });
                let _ = loc;
            }
            Stmt::Newtype { name, inner, .. } => {
                let inner_ty = self.type_expr_to_type(inner);
                self.env.define_type(name.clone(), inner_ty);
            }
            Stmt::Trait { methods, .. } | Stmt::Impl { methods, .. } => {
                for m in methods {
                    self.check_stmt(m);
                }
            }
        }
    }

    fn check_fn(
        &mut self,
        name: &str,
        body: &FnBody,
        return_type: &Option<crate::ast::TypeExpr>,
        loc: &SourceLoc,
    ) {
        match body {
            FnBody::Params { params, body } => {
                self.env.push_scope();
                let mut param_types = Vec::new();
                for (pname, ann) in params {
                    let ty = match ann {
                        Some(t) => self.type_expr_to_type(t),
                        None => self.env.fresh_var("p"),
                    };
                    self.env.define(pname.clone(), ty.clone());
                    param_types.push(ty);
                }
                let expected_result = match return_type {
                    Some(t) => self.type_expr_to_type(t),
                    None => self.env.fresh_var("r"),
                };
                self.fn_result_stack.push(expected_result.clone());
                let body_ty = self.infer_expr(body);
                self.fn_result_stack.pop();
                let result_ty = self.unify_report(&body_ty, &expected_result, loc, "function body");
                self.env.pop_scope();
                self.env.define(
                    name.to_string(),
                    Type::Fn {
                        params: param_types,
                        result: Box::new(result_ty),
                    },
                );
            }
            FnBody::Clauses(clauses) => {
                let arity = clauses.first().map(|c| c.params.len()).unwrap_or(0);
                let param_vars: Vec<Type> =
                    (0..arity).map(|_| self.env.fresh_var("p")).collect();
                let result_var = self.env.fresh_var("r");
                self.env.define(
                    name.to_string(),
                    Type::Fn {
                        params: param_vars.clone(),
                        result: Box::new(result_var.clone()),
                    },
                );
                for clause in clauses {
                    if clause.params.len() != arity {
                        self.error(
                            loc,
                            format!(
                                "function `{}` clauses disagree on arity ({} vs {})",
                                name,
                                clause.params.len(),
                                arity
                            ),
                        );
                        continue;
                    }
                    self.env.push_scope();
                    for (pat, pty) in clause.params.iter().zip(param_vars.iter()) {
                        self.bind_pattern(pat, pty);
                    }
                    if let Some(guard) = &clause.guard {
                        let guard_ty = self.infer_expr(guard);
                        self.unify_report(&guard_ty, &Type::Bool, guard.loc(), "clause guard");
                    }
                    self.fn_result_stack.push(result_var.clone());
                    let body_ty = self.infer_expr(&clause.body);
                    self.fn_result_stack.pop();
                    self.unify_report(&body_ty, &result_var, clause.body.loc(), "clause body");
                    self.env.pop_scope();
                }
            }
        }
    }

    fn type_expr_to_type(&mut self, te: &crate::ast::TypeExpr) -> Type {
        use crate::ast::TypeExpr;
        match te {
            TypeExpr::Named { name, args, .. } => match name.as_str() {
                "Int" => Type::Int,
                "Float" => Type::Float,
                "String" => Type::String,
                "Bool" => Type::Bool,
                "Unit" => Type::Unit,
                "List" => Type::list(
                    args.first()
                        .map(|a| self.type_expr_to_type(a))
                        .unwrap_or(Type::Unit),
                ),
                "Option" => Type::option(
                    args.first()
                        .map(|a| self.type_expr_to_type(a))
                        .unwrap_or(Type::Unit),
                ),
                "Result" => {
                    let ok = args
                        .first()
                        .map(|a| self.type_expr_to_type(a))
                        .unwrap_or(Type::Unit);
                    let err = args
                        .get(1)
                        .map(|a| self.type_expr_to_type(a))
                        .unwrap_or(Type::String);
                    Type::result(ok, err)
                }
                "Map" => {
                    let k = args
                        .first()
                        .map(|a| self.type_expr_to_type(a))
                        .unwrap_or(Type::String);
                    let v = args
                        .get(1)
                        .map(|a| self.type_expr_to_type(a))
                        .unwrap_or(Type::Unit);
                    Type::map(k, v)
                }
                "Pid" => Type::pid(
                    args.first()
                        .map(|a| self.type_expr_to_type(a))
                        .unwrap_or(Type::Unit),
                ),
                other => self
                    .env
                    .lookup_type(other)
                    .unwrap_or_else(|| Type::Con {
                        name: other.to_string(),
                        args: args.iter().map(|a| self.type_expr_to_type(a)).collect(),
                    }),
            },
            TypeExpr::Function { params, result, .. } => Type::Fn {
                params: params.iter().map(|p| self.type_expr_to_type(p)).collect(),
                result: Box::new(self.type_expr_to_type(result)),
            },
            TypeExpr::Tuple { elements, .. } => Type::Tuple {
                elements: elements.iter().map(|e| self.type_expr_to_type(e)).collect(),
            },
        }
    }

    fn bind_pattern(&mut self, pattern: &Pattern, scrutinee_ty: &Type) {
        match pattern {
            Pattern::Ident { name, .. } => {
                self.env.define(name.clone(), scrutinee_ty.clone());
            }
            Pattern::Wildcard { .. } | Pattern::Rest { .. } => {}
            Pattern::Lit { value, .. } => {
                let lit_ty = self.infer_expr(value);
                self.unify_report(&lit_ty, scrutinee_ty, value.loc(), "literal pattern");
            }
            Pattern::Tuple { elements, loc } => {
                let elem_vars: Vec<Type> =
                    elements.iter().map(|_| self.env.fresh_var("e")).collect();
                let tuple_ty = Type::Tuple {
                    elements: elem_vars.clone(),
                };
                self.unify_report(scrutinee_ty, &tuple_ty, loc, "tuple pattern");
                for (elem, ty) in elements.iter().zip(elem_vars.iter()) {
                    self.bind_pattern(elem, ty);
                }
            }
            Pattern::Constructor { name, args, loc } => {
                if name == "List" {
                    let elem_var = self.env.fresh_var("e");
                    let list_ty = Type::list(elem_var.clone());
                    self.unify_report(scrutinee_ty, &list_ty, loc, "list pattern");
                    for a in args {
                        self.bind_pattern(a, &elem_var);
                    }
                } else {
                    // User-defined constructor: bind each arg to a fresh
                    // var; full variant-field typing needs a constructor
                    // table the checker does not yet build from TypeDef.
                    for a in args {
                        let ty = self.env.fresh_var("c");
                        self.bind_pattern(a, &ty);
                    }
                }
            }
        }
    }

    fn infer_expr(&mut self, expr: &Expr) -> Type {
        match expr {
            Expr::IntLit { .. } => Type::Int,
            Expr::FloatLit { .. } => Type::Float,
            Expr::StringLit { .. } => Type::String,
            Expr::BoolLit { .. } => Type::Bool,
            Expr::Ident { name, loc } => self
                .env
                .lookup(name)
                .unwrap_or_else(|| self.error(loc, format!("unknown identifier `{}`", name))),
            Expr::Binary {
                op, left, right, loc,
            } => self.infer_binary(*op, left, right, loc),
            Expr::Unary { op, operand, loc } => {
                let ty = self.infer_expr(operand);
                match op {
                    UnaryOp::Neg => {
                        if ty.is_error() || ty.is_numeric() {
                            ty
                        } else {
                            self.error(loc, format!("cannot negate `{}`", ty))
                        }
                    }
                    UnaryOp::Not => self.unify_report(&ty, &Type::Bool, loc, "`not` operand"),
                }
            }
            Expr::Call { callee, args, loc } => self.infer_call(callee, args, loc),
            Expr::If {
                cond,
                then_branch,
                else_branch,
                loc,
            } => {
                let cond_ty = self.infer_expr(cond);
                self.unify_report(&cond_ty, &Type::Bool, cond.loc(), "if condition");
                let then_ty = self.infer_expr(then_branch);
                match else_branch {
                    Some(e) => {
                        let else_ty = self.infer_expr(e);
                        self.unify_report(&then_ty, &else_ty, loc, "if branches")
                    }
                    None => Type::Unit,
                }
            }
            Expr::Match {
                scrutinee,
                arms,
                loc,
            } => {
                let scrut_ty = self.infer_expr(scrutinee);
                let mut result: Option<Type> = None;
                for arm in arms {
                    self.env.push_scope();
                    self.bind_pattern(&arm.pattern, &scrut_ty);
                    if let Some(guard) = &arm.guard {
                        let guard_ty = self.infer_expr(guard);
                        self.unify_report(&guard_ty, &Type::Bool, guard.loc(), "match guard");
                    }
                    let body_ty = self.infer_expr(&arm.body);
                    self.env.pop_scope();
                    result = Some(match result {
                        Some(prev) => self.unify_report(&prev, &body_ty, loc, "match arms"),
                        None => body_ty,
                    });
                }
                result.unwrap_or(Type::Unit)
            }
            Expr::Block { stmts, final_expr, .. } => {
                self.env.push_scope();
                for s in stmts {
                    self.check_stmt(s);
                }
                let ty = match final_expr {
                    Some(e) => self.infer_expr(e),
                    None => Type::Unit,
                };
                self.env.pop_scope();
                ty
            }
            Expr::List { elements, .. } => self.infer_homogeneous_list(elements),
            Expr::Bind { value, .. } => self.infer_expr(value),
            Expr::With {
                bindings,
                body,
                else_arms,
                loc,
            } => {
                let mut err_ty: Option<Type> = None;
                self.env.push_scope();
                for b in bindings {
                    let bound_ty = self.infer_expr(&b.value);
                    let ok_var = self.env.fresh_var("ok");
                    let err_var = match &err_ty {
                        Some(t) => t.clone(),
                        None => self.env.fresh_var("err"),
                    };
                    let expected = Type::result(ok_var.clone(), err_var.clone());
                    self.unify_report(&bound_ty, &expected, loc, "with binding");
                    err_ty = Some(err_var);
                    self.env.define(b.name.clone(), ok_var);
                }
                let body_ty = self.infer_expr(body);
                if let Some(arms) = else_arms {
                    let err_var = err_ty.clone().unwrap_or(Type::Unit);
                    for arm in arms {
                        self.env.push_scope();
                        self.bind_pattern(&arm.pattern, &err_var);
                        let arm_ty = self.infer_expr(&arm.body);
                        self.env.pop_scope();
                        self.unify_report(&body_ty, &arm_ty, loc, "with else arm");
                    }
                }
                self.env.pop_scope();
                body_ty
            }
            Expr::Dot { object, .. } => {
                self.infer_expr(object);
                self.env.fresh_var("field")
            }
            Expr::Range { start, end, loc, .. } => {
                let start_ty = self.infer_expr(start);
                let end_ty = self.infer_expr(end);
                self.unify_report(&start_ty, &Type::Int, start.loc(), "range start");
                self.unify_report(&end_ty, &Type::Int, end.loc(), "range end");
                let _ = loc;
                Type::range(Type::Int)
            }
            Expr::For {
                var_name,
                iterable,
                body,
                ..
            } => {
                let iter_ty = self.infer_expr(iterable);
                let elem_var = self.env.fresh_var("e");
                let list_ty = Type::list(elem_var.clone());
                self.unify_report(&iter_ty, &list_ty, iterable.loc(), "for iterable");
                self.env.push_scope();
                self.env.define(var_name.clone(), elem_var);
                self.infer_expr(body);
                self.env.pop_scope();
                Type::Unit
            }
            Expr::While { cond, body, loc } => {
                self.diagnostics.push(Diagnostic::error(
                    loc.clone(),
                    "`while` is not part of the Fern language (accepted here for forward compatibility only)",
                ));
                let cond_ty = self.infer_expr(cond);
                self.unify_report(&cond_ty, &Type::Bool, cond.loc(), "while condition");
                self.infer_expr(body);
                Type::Unit
            }
            Expr::Loop { body, loc } => {
                self.diagnostics.push(Diagnostic::error(
                    loc.clone(),
                    "`loop` is not part of the Fern language (accepted here for forward compatibility only)",
                ));
                self.infer_expr(body);
                Type::Unit
            }
            Expr::Lambda { params, body, .. } => {
                self.env.push_scope();
                let param_vars: Vec<Type> = params
                    .iter()
                    .map(|p| {
                        let v = self.env.fresh_var("a");
                        self.env.define(p.clone(), v.clone());
                        v
                    })
                    .collect();
                let body_ty = self.infer_expr(body);
                self.env.pop_scope();
                Type::Fn {
                    params: param_vars,
                    result: Box::new(body_ty),
                }
            }
            Expr::InterpString { parts, .. } => {
                for p in parts {
                    if let InterpPart::Expr(e) = p {
                        self.infer_expr(e);
                    }
                }
                Type::String
            }
            Expr::Map { entries, loc } => {
                let key_var = self.env.fresh_var("k");
                let val_var = self.env.fresh_var("v");
                for (k, v) in entries {
                    let kt = self.infer_expr(k);
                    let vt = self.infer_expr(v);
                    self.unify_report(&kt, &key_var, loc, "map key");
                    self.unify_report(&vt, &val_var, loc, "map value");
                }
                Type::map(key_var, val_var)
            }
            Expr::Tuple { elements, .. } => Type::Tuple {
                elements: elements.iter().map(|e| self.infer_expr(e)).collect(),
            },
            Expr::RecordUpdate { base, fields, .. } => {
                let base_ty = self.infer_expr(base);
                for f in fields {
                    self.infer_expr(&f.value);
                }
                base_ty
            }
            Expr::ListComp {
                body,
                var_name,
                iterable,
                cond,
                ..
            } => {
                let iter_ty = self.infer_expr(iterable);
                let elem_var = self.env.fresh_var("e");
                let list_ty = Type::list(elem_var.clone());
                self.unify_report(&iter_ty, &list_ty, iterable.loc(), "list comprehension source");
                self.env.push_scope();
                self.env.define(var_name.clone(), elem_var);
                if let Some(c) = cond {
                    let cond_ty = self.infer_expr(c);
                    self.unify_report(&cond_ty, &Type::Bool, c.loc(), "list comprehension filter");
                }
                let body_ty = self.infer_expr(body);
                self.env.pop_scope();
                Type::list(body_ty)
            }
            Expr::Index { object, index, loc } => {
                let obj_ty = self.infer_expr(object);
                let idx_ty = self.infer_expr(index);
                match obj_ty.prune() {
                    Type::Con { name, mut args } if name == "List" && args.len() == 1 => {
                        self.unify_report(&idx_ty, &Type::Int, loc, "list index");
                        args.remove(0)
                    }
                    Type::Con { name, mut args } if name == "Map" && args.len() == 2 => {
                        let val_ty = args.remove(1);
                        let key_ty = args.remove(0);
                        self.unify_report(&idx_ty, &key_ty, loc, "map index");
                        val_ty
                    }
                    other if other.is_error() => other,
                    other => self.error(loc, format!("cannot index into `{}`", other)),
                }
            }
            Expr::Spawn { body, loc } => {
                let body_ty = self.infer_expr(body);
                match body_ty.prune() {
                    Type::Fn { params, result } if params.is_empty() => Type::pid(*result),
                    other if other.is_error() => other,
                    other => self.error(loc, format!("`spawn` requires a zero-argument function, got `{}`", other)),
                }
            }
            Expr::Send { pid, message, loc } => {
                let pid_ty = self.infer_expr(pid);
                let msg_ty = self.infer_expr(message);
                let expected = Type::pid(msg_ty);
                self.unify_report(&pid_ty, &expected, loc, "send target");
                Type::Unit
            }
            Expr::Receive {
                arms,
                after_ms,
                after_body,
                ..
            } => {
                let msg_var = self.env.fresh_var("msg");
                let mut result: Option<Type> = None;
                for arm in arms {
                    self.env.push_scope();
                    self.bind_pattern(&arm.pattern, &msg_var);
                    let body_ty = self.infer_expr(&arm.body);
                    self.env.pop_scope();
                    result = Some(match result {
                        Some(prev) => self.unify_report(&prev, &body_ty, arm.body.loc(), "receive arms"),
                        None => body_ty,
                    });
                }
                if let Some(ms) = after_ms {
                    let ms_ty = self.infer_expr(ms);
                    self.unify_report(&ms_ty, &Type::Int, ms.loc(), "receive after");
                }
                if let Some(body) = after_body {
                    let after_ty = self.infer_expr(body);
                    result = Some(match result {
                        Some(prev) => self.unify_report(&prev, &after_ty, body.loc(), "receive after body"),
                        None => after_ty,
                    });
                }
                result.unwrap_or(Type::Unit)
            }
            Expr::Try { operand, loc } => {
                let operand_ty = self.infer_expr(operand);
                let ok_var = self.env.fresh_var("ok");
                let err_var = self.env.fresh_var("err");
                let expected = Type::result(ok_var.clone(), err_var.clone());
                self.unify_report(&operand_ty, &expected, loc, "`?` operand");
                if let Some(enclosing) = self.fn_result_stack.last().cloned() {
                    let expected_fn_result = Type::result(self.env.fresh_var("r"), err_var);
                    self.unify_report(&enclosing, &expected_fn_result, loc, "`?` outside a Result-returning function");
                } else {
                    self.error(loc, "`?` used outside a function body");
                }
                ok_var
            }
        }
    }

    fn infer_homogeneous_list(&mut self, elements: &[Expr]) -> Type {
        let elem_var = self.env.fresh_var("e");
        for e in elements {
            let ty = self.infer_expr(e);
            self.unify_report(&ty, &elem_var, e.loc(), "list element");
        }
        Type::list(elem_var)
    }

    fn infer_binary(&mut self, op: BinaryOp, left: &Expr, right: &Expr, loc: &SourceLoc) -> Type {
        let lt = self.infer_expr(left);
        let rt = self.infer_expr(right);
        if lt.is_error() {
            return lt;
        }
        if rt.is_error() {
            return rt;
        }
        match op {
            BinaryOp::Add => {
                if matches!(lt.prune(), Type::String) && matches!(rt.prune(), Type::String) {
                    Type::String
                } else if lt.is_numeric() || rt.is_numeric() {
                    self.unify_report(&lt, &rt, loc, "`+` operands")
                } else {
                    self.error(loc, format!("`+` is not defined for `{}` and `{}`", lt, rt))
                }
            }
            BinaryOp::Sub | BinaryOp::Mul => {
                let unified = self.unify_report(&lt, &rt, loc, "arithmetic operands");
                if unified.is_error() || unified.is_numeric() {
                    unified
                } else {
                    self.error(loc, format!("arithmetic requires numeric operands, got `{}`", unified))
                }
            }
            BinaryOp::Div => {
                let unified = self.unify_report(&lt, &rt, loc, "`/` operands");
                if unified.is_error() || unified.is_numeric() {
                    unified
                } else {
                    self.error(loc, format!("`/` requires numeric operands, got `{}`", unified))
                }
            }
            BinaryOp::Rem => {
                self.unify_report(&lt, &Type::Int, loc, "`%` left operand");
                self.unify_report(&rt, &Type::Int, loc, "`%` right operand")
            }
            BinaryOp::Pow => {
                let unified = self.unify_report(&lt, &rt, loc, "`**` operands");
                if unified.is_error() || unified.is_numeric() {
                    unified
                } else {
                    self.error(loc, format!("`**` requires numeric operands, got `{}`", unified))
                }
            }
            BinaryOp::Eq | BinaryOp::Ne => {
                self.unify_report(&lt, &rt, loc, "equality operands");
                Type::Bool
            }
            BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
                let unified = self.unify_report(&lt, &rt, loc, "comparison operands");
                if !unified.is_error()
                    && !unified.is_numeric()
                    && !matches!(unified.prune(), Type::String)
                {
                    self.error(
                        loc,
                        format!("comparison requires numeric or string operands, got `{}`", unified),
                    );
                }
                Type::Bool
            }
            BinaryOp::And | BinaryOp::Or => {
                self.unify_report(&lt, &Type::Bool, loc, "boolean operand");
                self.unify_report(&rt, &Type::Bool, loc, "boolean operand");
                Type::Bool
            }
        }
    }

    fn infer_call(&mut self, callee: &Expr, args: &[crate::ast::CallArg], loc: &SourceLoc) -> Type {
        let callee_ty = self.infer_expr(callee);
        let arg_types: Vec<Type> = args.iter().map(|a| self.infer_expr(&a.value)).collect();
        match callee_ty.prune() {
            Type::Fn { params, result } => {
                if params.len() != arg_types.len() {
                    return self.error(
                        loc,
                        format!(
                            "expected {} argument(s), found {}",
                            params.len(),
                            arg_types.len()
                        ),
                    );
                }
                for (expected, actual) in params.iter().zip(arg_types.iter()) {
                    self.unify_report(expected, actual, loc, "call argument");
                }
                *result
            }
            Type::Error { .. } => callee_ty,
            other => self.error(loc, format!("cannot call a value of type `{}`", other)),
        }
    }
}

impl Default for TypeChecker {
    fn default() -> Self {
        TypeChecker::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn infer_program_last(src: &str) -> Type {
        let (program, diagnostics) = parse(src, "<test>");
        assert!(diagnostics.is_empty(), "parse errors: {:?}", diagnostics);
        let mut checker = TypeChecker::new();
        let mut last = Type::Unit;
        for stmt in &program.statements {
            if let Stmt::ExprStmt { expr, .. } = stmt {
                last = checker.infer_expr(expr);
            } else {
                checker.check_stmt(stmt);
            }
        }
        last
    }

    #[test]
    fn literals_have_primitive_types() {
        assert_eq!(infer_program_last("1\n"), Type::Int);
        assert_eq!(infer_program_last("1.5\n"), Type::Float);
        assert_eq!(infer_program_last("true\n"), Type::Bool);
        assert_eq!(infer_program_last("\"hi\"\n"), Type::String);
    }

    #[test]
    fn if_without_else_is_unit() {
        assert_eq!(infer_program_last("if true:\n  1\n"), Type::Unit);
    }

    #[test]
    fn if_branches_must_unify() {
        assert_eq!(
            infer_program_last("if true:\n  1\nelse:\n  2\n"),
            Type::Int
        );
    }

    #[test]
    fn mismatched_if_branches_is_a_type_error() {
        assert!(infer_program_last("if true:\n  1\nelse:\n  \"x\"\n").is_error());
    }

    #[test]
    fn typed_function_call_checks_out() {
        let diagnostics = {
            let (program, parse_diags) =
                parse("fn add(a: Int, b: Int) -> Int:\n  a + b\nadd(2, 3)\n", "<test>");
            assert!(parse_diags.is_empty());
            check(&program)
        };
        assert!(diagnostics.is_empty(), "unexpected: {:?}", diagnostics);
    }

    #[test]
    fn wrong_arity_call_is_an_error() {
        let (program, parse_diags) =
            parse("fn add(a: Int, b: Int) -> Int:\n  a + b\nadd(2)\n", "<test>");
        assert!(parse_diags.is_empty());
        assert!(!check(&program).is_empty());
    }

    #[test]
    fn range_requires_int_operands() {
        assert!(!infer_program_last("1 .. 10\n").is_error());
        assert!(infer_program_last("1.0 .. 10\n").is_error());
    }

    #[test]
    fn list_elements_must_unify() {
        assert!(!infer_program_last("[1, 2, 3]\n").is_error());
        assert!(infer_program_last("[1, \"x\"]\n").is_error());
    }
}
