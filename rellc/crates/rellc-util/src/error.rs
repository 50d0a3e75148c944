//! Internal-error conditions (spec §7, "Internal errors").
//!
//! These indicate a bug in the checker itself, never a problem with the
//! input program. There is no recovery path for them in a single-pass,
//! single-threaded checker, so call sites panic with the `Display` message
//! rather than threading a `Result` through every unification step.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum InternalError {
    #[error("attempted to re-solve already-solved univar {0} without override")]
    ResolveAlreadySolved(u32),

    #[error("dangling unification variable {0} survived normalisation")]
    DanglingUniVar(u32),

    #[error("skolem survived normalisation outside the module top level")]
    SkolemEscape,

    #[error("forallScope produced a Forall whose bound variable does not occur in the body")]
    VacuousForall,
}

impl InternalError {
    pub fn panic(self) -> ! {
        panic!("internal checker error: {self}")
    }
}
