//! rellc-check — the bidirectional type checker (spec §4.3–§4.9):
//! unification variables, polytype instantiation and generalization, row
//! operations, subtype/supertype, `infer`/`check`, and post-inference
//! normalisation. Consumes the `rellc_resolve::Output` the dependency
//! resolver produces and emits `(Output, Name -> Type, diagnostics)`
//! (spec §6).

mod checker;
mod infer;
mod mono;
mod normalise;
mod rows;
mod subtype;
mod univar;

pub use checker::{Checker, Sigs};
pub use mono::{first_free_var, mono, substitute_ty, Variance};
pub use normalise::normalise;
pub use rows::{compress, deep_lookup, diff, RowKind};
pub use subtype::{subtype, supertype};
pub use univar::UnificationTable;
