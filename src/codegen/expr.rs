//! Expression-directed lowering (spec §4.6 "Emission rules").
//!
//! Each `lower_expr` call appends SSA instructions to `out` and returns the
//! fresh temp (or literal value) holding the expression's result, plus the
//! ABI class that value was produced under.

use crate::ast::{BinaryOp, CallArg, Expr, InterpPart, UnaryOp};
use crate::codegen::control_flow;
use crate::codegen::error::CodeGenError;
use crate::codegen::state::{FunctionState, ModuleState};
use crate::codegen::value_abi::Abi;
use std::fmt::Write;

/// A lowered value: the SSA text referring to it plus its ABI class.
#[derive(Debug, Clone)]
pub struct Value {
    pub text: String,
    pub abi: Abi,
}

impl Value {
    pub fn new(text: impl Into<String>, abi: Abi) -> Self {
        Value {
            text: text.into(),
            abi,
        }
    }
}

pub struct Lowerer<'a> {
    pub module: &'a mut ModuleState,
    pub func: &'a mut FunctionState,
}

impl<'a> Lowerer<'a> {
    pub fn lower_expr(&mut self, expr: &Expr, out: &mut String) -> Result<Value, CodeGenError> {
        match expr {
            Expr::IntLit { value, .. } => {
                let t = self.func.fresh_temp();
                let _ = writeln!(out, "{} =w copy {}", t, value);
                Ok(Value::new(t, Abi::W))
            }
            Expr::FloatLit { value, .. } => {
                let t = self.func.fresh_temp();
                let _ = writeln!(out, "{} =d copy d_{}", t, value);
                Ok(Value::new(t, Abi::D))
            }
            Expr::BoolLit { value, .. } => {
                let t = self.func.fresh_temp();
                let _ = writeln!(out, "{} =w copy {}", t, if *value { 1 } else { 0 });
                Ok(Value::new(t, Abi::W))
            }
            Expr::StringLit { value, .. } => {
                let sym = self.module.intern_string(value);
                let t = self.func.fresh_temp();
                let _ = writeln!(out, "{} =l copy {}", t, sym);
                Ok(Value::new(t, Abi::L))
            }
            Expr::Ident { name, .. } => {
                let abi = self.func.local_abi(name).unwrap_or(Abi::L);
                Ok(Value::new(format!("%{}", name), abi))
            }
            Expr::Binary { op, left, right, .. } => self.lower_binary(*op, left, right, out),
            Expr::Unary { op, operand, .. } => self.lower_unary(*op, operand, out),
            Expr::Bind { name, value, .. } => {
                let v = self.lower_expr(value, out)?;
                let _ = writeln!(out, "%{} ={} copy {}", name, v.abi, v.text);
                self.func.bind_local(name.clone(), v.abi);
                Ok(Value::new(format!("%{}", name), v.abi))
            }
            Expr::If { .. } | Expr::Match { .. } | Expr::Block { .. } | Expr::For { .. }
            | Expr::While { .. } | Expr::Loop { .. } | Expr::With { .. } => {
                control_flow::lower(self, expr, out)
            }
            Expr::Call { callee, args, .. } => self.lower_call(callee, args, out),
            Expr::InterpString { parts, .. } => self.lower_interp_string(parts, out),
            Expr::Try { operand, .. } => self.lower_try(operand, out),
            Expr::List { elements, .. } => {
                let t = self.func.fresh_temp();
                let _ = writeln!(out, "{} =l call $fern_list_new()", t);
                for element in elements {
                    let v = self.lower_expr(element, out)?;
                    let _ = writeln!(out, "call $fern_list_push(l {}, {} {})", t, v.abi, v.text);
                }
                Ok(Value::new(t, Abi::L))
            }
            Expr::Tuple { elements, .. } => {
                let t = self.func.fresh_temp();
                let _ = writeln!(out, "{} =l call $fern_tuple_new({})", t, elements.len());
                Ok(Value::new(t, Abi::L))
            }
            Expr::Range { start, end, inclusive, .. } => {
                let s = self.lower_expr(start, out)?;
                let e = self.lower_expr(end, out)?;
                let t = self.func.fresh_temp();
                let _ = writeln!(
                    out,
                    "{} =l call $fern_range_new(w {}, w {}, w {})",
                    t,
                    s.text,
                    e.text,
                    if *inclusive { 1 } else { 0 }
                );
                Ok(Value::new(t, Abi::L))
            }
            Expr::Lambda { params, body, .. } => self.lower_lambda(params, body, out),
            Expr::Index { object, index, .. } => {
                let obj = self.lower_expr(object, out)?;
                let idx = self.lower_expr(index, out)?;
                let t = self.func.fresh_temp();
                let _ = writeln!(
                    out,
                    "{} =l call $fern_list_get(l {}, w {})",
                    t, obj.text, idx.text
                );
                Ok(Value::new(t, Abi::L))
            }
            Expr::Send { pid, message, .. } => {
                let p = self.lower_expr(pid, out)?;
                let m = self.lower_expr(message, out)?;
                let _ = writeln!(out, "call $fern_send(l {}, l {})", p.text, m.text);
                Ok(Value::new("0", Abi::W))
            }
            Expr::Spawn { body, .. } => {
                let name = self.lower_spawn_body(body)?;
                let t = self.func.fresh_temp();
                let _ = writeln!(out, "{} =l call $fern_spawn(l {})", t, name);
                Ok(Value::new(t, Abi::L))
            }
            Expr::Dot { object, field, .. } => {
                let obj = self.lower_expr(object, out)?;
                let t = self.func.fresh_temp();
                let _ = writeln!(
                    out,
                    "{} =l call $fern_field_get(l {}, l {})",
                    t,
                    obj.text,
                    self.module.intern_string(field)
                );
                Ok(Value::new(t, Abi::L))
            }
            Expr::Map { .. } | Expr::ListComp { .. } | Expr::RecordUpdate { .. } | Expr::Receive { .. } => {
                let what = expr.kind_name();
                let _ = writeln!(out, "# TODO: unsupported construct {}", what);
                let t = self.func.fresh_temp();
                let _ = writeln!(out, "{} =w copy 0", t);
                Ok(Value::new(t, Abi::W))
            }
        }
    }

    fn lower_binary(
        &mut self,
        op: BinaryOp,
        left: &Expr,
        right: &Expr,
        out: &mut String,
    ) -> Result<Value, CodeGenError> {
        let l = self.lower_expr(left, out)?;
        let r = self.lower_expr(right, out)?;
        let t = self.func.fresh_temp();
        let (opcode, abi) = binary_opcode(op, l.abi);
        let _ = writeln!(out, "{} ={} {} {}, {}", t, abi, opcode, l.text, r.text);
        Ok(Value::new(t, abi))
    }

    fn lower_unary(&mut self, op: UnaryOp, operand: &Expr, out: &mut String) -> Result<Value, CodeGenError> {
        let v = self.lower_expr(operand, out)?;
        let t = self.func.fresh_temp();
        match op {
            UnaryOp::Neg => {
                let _ = writeln!(out, "{} ={} neg {}", t, v.abi, v.text);
            }
            UnaryOp::Not => {
                let _ = writeln!(out, "{} =w ceqw {}, 0", t, v.text);
            }
        }
        Ok(Value::new(t, v.abi))
    }

    fn lower_call(
        &mut self,
        callee: &Expr,
        args: &[CallArg],
        out: &mut String,
    ) -> Result<Value, CodeGenError> {
        let mut lowered = Vec::with_capacity(args.len());
        for arg in args {
            lowered.push(self.lower_expr(&arg.value, out)?);
        }
        let arg_list = lowered
            .iter()
            .map(|v| format!("{} {}", v.abi, v.text))
            .collect::<Vec<_>>()
            .join(", ");

        let (symbol, abi) = match callee {
            Expr::Dot { object, field, .. } => {
                if let Expr::Ident { name: module, .. } = object.as_ref() {
                    match self.module.dispatch.resolve(module, field) {
                        Some(sym) => (sym.symbol.to_string(), sym.result_abi),
                        None => (format!("${}_{}", module, field), Abi::L),
                    }
                } else {
                    (format!("${}", field), Abi::L)
                }
            }
            Expr::Ident { name, .. } => match self.module.dispatch.resolve("", name) {
                Some(sym) => (sym.symbol.to_string(), sym.result_abi),
                None => (format!("${}", name), Abi::L),
            },
            other => {
                let callee_val = self.lower_expr(other, out)?;
                (callee_val.text, Abi::L)
            }
        };

        let t = self.func.fresh_temp();
        let _ = writeln!(out, "{} ={} call {}({})", t, abi, symbol, arg_list);
        Ok(Value::new(t, abi))
    }

    fn lower_interp_string(&mut self, parts: &[InterpPart], out: &mut String) -> Result<Value, CodeGenError> {
        let mut acc: Option<Value> = None;
        for part in parts {
            let piece = match part {
                InterpPart::Text(text) => {
                    let sym = self.module.intern_string(text);
                    let t = self.func.fresh_temp();
                    let _ = writeln!(out, "{} =l copy {}", t, sym);
                    Value::new(t, Abi::L)
                }
                InterpPart::Expr(expr) => {
                    let v = self.lower_expr(expr, out)?;
                    match v.abi {
                        Abi::L => v,
                        Abi::W => {
                            let t = self.func.fresh_temp();
                            let _ = writeln!(out, "{} =l call $fern_int_to_str(w {})", t, v.text);
                            Value::new(t, Abi::L)
                        }
                        Abi::D => {
                            let t = self.func.fresh_temp();
                            let _ = writeln!(out, "{} =l call $fern_float_to_str(d {})", t, v.text);
                            Value::new(t, Abi::L)
                        }
                    }
                }
            };
            acc = Some(match acc {
                None => piece,
                Some(prev) => {
                    let t = self.func.fresh_temp();
                    let _ = writeln!(
                        out,
                        "{} =l call $fern_str_concat(l {}, l {})",
                        t, prev.text, piece.text
                    );
                    Value::new(t, Abi::L)
                }
            });
        }
        Ok(acc.unwrap_or_else(|| Value::new(self.module.intern_string(""), Abi::L)))
    }

    fn lower_try(&mut self, operand: &Expr, out: &mut String) -> Result<Value, CodeGenError> {
        let v = self.lower_expr(operand, out)?;
        let check = self.func.fresh_temp();
        let ok_label = self.module.fresh_label();
        let err_label = self.module.fresh_label();
        let _ = writeln!(out, "{} =w call $fern_result_is_ok(l {})", check, v.text);
        let _ = writeln!(out, "jnz {}, {}, {}", check, ok_label, err_label);
        let _ = writeln!(out, "{}", err_label);
        let _ = writeln!(out, "ret {}", v.text);
        let _ = writeln!(out, "{}", ok_label);
        let t = self.func.fresh_temp();
        let _ = writeln!(out, "{} =l call $fern_result_unwrap(l {})", t, v.text);
        Ok(Value::new(t, Abi::L))
    }

    fn lower_lambda(
        &mut self,
        params: &[String],
        body: &Expr,
        out: &mut String,
    ) -> Result<Value, CodeGenError> {
        let name = self.module.fresh_lambda_name();
        let mut lambda_func = FunctionState::new();
        let mut lambda_body = String::new();
        for p in params {
            lambda_func.bind_local(p.clone(), Abi::L);
        }
        {
            let mut inner = Lowerer {
                module: self.module,
                func: &mut lambda_func,
            };
            let result = inner.lower_expr(body, &mut lambda_body)?;
            lambda_func.flush_defers(&mut lambda_body);
            let _ = writeln!(lambda_body, "ret {}", result.text);
        }
        let param_list = params
            .iter()
            .map(|p| format!("l %{}", p))
            .collect::<Vec<_>>()
            .join(", ");
        let _ = writeln!(
            self.module.lambda_section,
            "function l {}({}) {{\n@start\n{}}}\n",
            name, param_list, lambda_body
        );
        let t = self.func.fresh_temp();
        let _ = writeln!(out, "{} =l copy {}", t, name);
        Ok(Value::new(t, Abi::L))
    }

    /// Lower a `spawn` body into its own zero-argument function in
    /// `lambda_section`, the same way `lower_lambda` does for real lambdas,
    /// and return the function's symbol for `fern_spawn` to reference.
    /// `spawn` bodies take no parameters (spec §4.6), unlike `Expr::Lambda`.
    fn lower_spawn_body(&mut self, body: &Expr) -> Result<String, CodeGenError> {
        let name = self.module.fresh_lambda_name();
        let mut lambda_func = FunctionState::new();
        let mut lambda_body = String::new();
        {
            let mut inner = Lowerer {
                module: self.module,
                func: &mut lambda_func,
            };
            let result = inner.lower_expr(body, &mut lambda_body)?;
            lambda_func.flush_defers(&mut lambda_body);
            let _ = writeln!(lambda_body, "ret {}", result.text);
        }
        let _ = writeln!(
            self.module.lambda_section,
            "function l {}() {{\n@start\n{}}}\n",
            name, lambda_body
        );
        Ok(name)
    }
}

fn binary_opcode(op: BinaryOp, operand_abi: Abi) -> (&'static str, Abi) {
    match op {
        BinaryOp::Add if operand_abi == Abi::D => ("add", Abi::D),
        BinaryOp::Add => ("add", operand_abi),
        BinaryOp::Sub if operand_abi == Abi::D => ("sub", Abi::D),
        BinaryOp::Sub => ("sub", operand_abi),
        BinaryOp::Mul if operand_abi == Abi::D => ("mul", Abi::D),
        BinaryOp::Mul => ("mul", operand_abi),
        BinaryOp::Div if operand_abi == Abi::D => ("div", Abi::D),
        BinaryOp::Div => ("div", operand_abi),
        BinaryOp::Rem => ("rem", Abi::W),
        BinaryOp::Pow => ("call $fern_pow", operand_abi),
        BinaryOp::Eq => ("ceqw", Abi::W),
        BinaryOp::Ne => ("cnew", Abi::W),
        BinaryOp::Lt => ("csltw", Abi::W),
        BinaryOp::Le => ("cslew", Abi::W),
        BinaryOp::Gt => ("csgtw", Abi::W),
        BinaryOp::Ge => ("csgew", Abi::W),
        BinaryOp::And => ("and", Abi::W),
        BinaryOp::Or => ("or", Abi::W),
    }
}
