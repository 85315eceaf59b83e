//! The three-type value ABI (spec §4.6).
//!
//! `w` is a 32-bit word (narrowed `Int`, `Bool` as 0/1, `Unit`), `l` is a
//! 64-bit pointer (strings, lists, maps, tuples, `Result`/`Option`, user
//! records, lambdas, pids), `d` is a 64-bit float. Codegen classifies every
//! `Type` it sees into one of these before emitting a temp, a parameter, or
//! a call argument.

use crate::types::Type;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Abi {
    W,
    L,
    D,
}

impl fmt::Display for Abi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Abi::W => "w",
            Abi::L => "l",
            Abi::D => "d",
        };
        f.write_str(s)
    }
}

/// Classify a checked `Type` into its ABI class. Unresolved type variables
/// and checker-reported error types default to `l`: the safest choice when
/// the real shape is unknown, since every `l` value is pointer-sized and a
/// wrong-but-uniform guess is less harmful than panicking the generator.
impl Abi {
    /// Merge the ABI of two branches of a join point. Equal classes pass
    /// through; a mismatch (e.g. one branch `w`, the other `l`) widens to
    /// `l` since every `l` value can hold a pointer-sized fallback.
    pub fn merge(self, other: Abi) -> Abi {
        if self == other {
            self
        } else {
            Abi::L
        }
    }
}

pub fn classify(ty: &Type) -> Abi {
    match ty.prune() {
        Type::Int | Type::Bool | Type::Unit => Abi::W,
        Type::Float => Abi::D,
        Type::String => Abi::L,
        Type::Con { .. } | Type::Tuple { .. } | Type::Fn { .. } => Abi::L,
        Type::Var(_) | Type::Error { .. } => Abi::L,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ints_and_bools_are_words() {
        assert_eq!(classify(&Type::Int), Abi::W);
        assert_eq!(classify(&Type::Bool), Abi::W);
        assert_eq!(classify(&Type::Unit), Abi::W);
    }

    #[test]
    fn floats_are_doubles() {
        assert_eq!(classify(&Type::Float), Abi::D);
    }

    #[test]
    fn strings_and_constructors_are_pointers() {
        assert_eq!(classify(&Type::String), Abi::L);
        assert_eq!(classify(&Type::list(Type::Int)), Abi::L);
        assert_eq!(
            classify(&Type::Fn {
                params: vec![Type::Int],
                result: Box::new(Type::Int)
            }),
            Abi::L
        );
    }
}
