//! rellc-util — foundation types shared by every stage of the core.
//!
//! This crate holds the ambient infrastructure a type checker needs but
//! that isn't itself part of the algorithm: string interning, typed
//! arenas, source locations, diagnostics, monotonic id generation, and a
//! small internal-error type. None of the checking logic lives here.

pub mod diagnostic;
pub mod error;
pub mod fresh;
pub mod index_vec;
pub mod loc;
pub mod symbol;

pub use diagnostic::{Diagnostic, Handler, Level};
pub use error::InternalError;
pub use fresh::Fresh;
pub use index_vec::{Idx, IndexVec};
pub use loc::{FileId, Loc};
pub use symbol::Symbol;
