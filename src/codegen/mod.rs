//! SSA code generator (spec §4.6).
//!
//! Mirrors the teacher's `codegen/{mod,state,program,control_flow,error}.rs`
//! split: this file carries the module-level architecture doc comment and
//! re-exports, `state.rs` carries the mutable context structs, and one file
//! per lowering concern does the rest. The generator does no register
//! allocation, no optimization, and no liveness analysis — it only has to
//! produce well-formed SSA text for the downstream backend to consume.

pub mod control_flow;
pub mod dispatch;
pub mod error;
pub mod expr;
pub mod program;
pub mod state;
pub mod value_abi;

pub use dispatch::{Dispatch, RuntimeSymbol};
pub use error::CodeGenError;
pub use program::CodeGen;
pub use value_abi::Abi;
