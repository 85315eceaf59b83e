//! Structural unification over `Type` (spec §4.5 "Unification").
//!
//! Attempting to unify two distinct constructors is an error; unifying a
//! free `Var` with any type binds it after an occurs check. Already-bound
//! vars are followed transitively via `Type::prune`.

use crate::source::SourceLoc;
use crate::types::{Type, TypeVar};

#[derive(Debug, Clone, PartialEq)]
pub struct UnifyError {
    pub message: String,
}

impl UnifyError {
    fn new(message: impl Into<String>) -> Self {
        UnifyError {
            message: message.into(),
        }
    }
}

pub fn unify(a: &Type, b: &Type) -> Result<(), UnifyError> {
    let a = a.prune();
    let b = b.prune();
    match (&a, &b) {
        (Type::Var(v), _) => bind_var(v, &b),
        (_, Type::Var(v)) => bind_var(v, &a),
        (Type::Int, Type::Int)
        | (Type::Float, Type::Float)
        | (Type::String, Type::String)
        | (Type::Bool, Type::Bool)
        | (Type::Unit, Type::Unit) => Ok(()),
        (Type::Error { .. }, _) | (_, Type::Error { .. }) => Ok(()),
        (Type::Con { name: n1, args: a1 }, Type::Con { name: n2, args: a2 }) => {
            if n1 != n2 || a1.len() != a2.len() {
                return Err(UnifyError::new(format!(
                    "cannot unify `{}` with `{}`",
                    a, b
                )));
            }
            for (x, y) in a1.iter().zip(a2.iter()) {
                unify(x, y)?;
            }
            Ok(())
        }
        (
            Type::Fn {
                params: p1,
                result: r1,
            },
            Type::Fn {
                params: p2,
                result: r2,
            },
        ) => {
            if p1.len() != p2.len() {
                return Err(UnifyError::new(format!(
                    "function arity mismatch: `{}` vs `{}`",
                    a, b
                )));
            }
            for (x, y) in p1.iter().zip(p2.iter()) {
                unify(x, y)?;
            }
            unify(r1, r2)
        }
        (Type::Tuple { elements: e1 }, Type::Tuple { elements: e2 }) => {
            if e1.len() != e2.len() {
                return Err(UnifyError::new(format!(
                    "tuple arity mismatch: `{}` vs `{}`",
                    a, b
                )));
            }
            for (x, y) in e1.iter().zip(e2.iter()) {
                unify(x, y)?;
            }
            Ok(())
        }
        _ => Err(UnifyError::new(format!(
            "cannot unify `{}` with `{}`",
            a, b
        ))),
    }
}

fn bind_var(v: &TypeVar, ty: &Type) -> Result<(), UnifyError> {
    if let Type::Var(other) = ty {
        if other.id == v.id {
            return Ok(());
        }
    }
    if occurs(v, ty) {
        return Err(UnifyError::new(format!(
            "occurs check failed: `{}` occurs in `{}`",
            v.name, ty
        )));
    }
    v.bind(ty.clone());
    Ok(())
}

fn occurs(v: &TypeVar, ty: &Type) -> bool {
    match ty.prune() {
        Type::Var(other) => other.id == v.id,
        Type::Con { args, .. } | Type::Tuple { elements: args } => {
            args.iter().any(|a| occurs(v, a))
        }
        Type::Fn { params, result } => {
            params.iter().any(|p| occurs(v, p)) || occurs(v, &result)
        }
        _ => false,
    }
}

/// Convenience used by the checker: unify, converting failure into a
/// located `Type::Error` rather than bubbling a `Result` — the checker
/// never halts on a unification failure (spec §4.5).
pub fn unify_or_error(a: &Type, b: &Type, loc: &SourceLoc, context: &str) -> Type {
    match unify(a, b) {
        Ok(()) => a.prune(),
        Err(e) => Type::Error {
            message: format!("{}:{}: {} ({})", loc, context, e.message, context),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TypeEnv;

    #[test]
    fn unifies_identical_primitives() {
        assert!(unify(&Type::Int, &Type::Int).is_ok());
    }

    #[test]
    fn rejects_distinct_constructors() {
        assert!(unify(&Type::Int, &Type::String).is_err());
    }

    #[test]
    fn binds_a_free_var() {
        let mut env = TypeEnv::new();
        let v = env.fresh_var("t");
        assert!(unify(&v, &Type::Int).is_ok());
        assert_eq!(v.prune(), Type::Int);
    }

    #[test]
    fn occurs_check_rejects_infinite_type() {
        let mut env = TypeEnv::new();
        let v = env.fresh_var("t");
        let list_of_v = Type::list(v.clone());
        assert!(unify(&v, &list_of_v).is_err());
    }

    #[test]
    fn unifies_nested_constructors() {
        let a = Type::result(Type::Int, Type::String);
        let b = Type::result(Type::Int, Type::String);
        assert!(unify(&a, &b).is_ok());
    }
}
