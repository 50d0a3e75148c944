//! rellc-ast — the name, type and declaration data model (spec §3).
//!
//! Leaf dependency order per spec §2: names & locations → AST → row
//! representation. This crate owns all three; the unification and
//! checking algorithms that operate on this data live in `rellc-check`.

pub mod builtins;
pub mod decl;
pub mod expr;
pub mod name;
pub mod surface;
pub mod types;

pub use builtins::Builtins;
pub use decl::{Assoc, Decl, Fixity, Op, RelOrd};
pub use expr::{Expr, Literal, Pattern};
pub use name::{Builtin, DeclId, Id, Name};
pub use types::{Row, SkolemId, Type, TypeVar, UniVarId};
