//! Diagnostic reporting.
//!
//! Spec §6 describes the core's only interaction with the outside world as
//! two calls on a diagnostic sink: `nonFatal(report)` and `fatal(reports)`.
//! `Handler` is the concrete sink used throughout `rellc-resolve` and
//! `rellc-check`; turning a `Diagnostic` into a rendered message (source
//! snippet, ANSI color, ...) is the external diagnostic-rendering
//! collaborator's job, not this crate's.

use crate::loc::Loc;
use std::fmt;

/// Severity of a diagnostic. The core never emits `Note`/`Help` on its own;
/// those are left for the rendering layer to attach.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Level {
    Error,
    Warning,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Error => write!(f, "error"),
            Level::Warning => write!(f, "warning"),
        }
    }
}

/// A stable identifier for a diagnostic kind, following the taxonomy in
/// spec §7.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct DiagnosticCode {
    pub prefix: &'static str,
    pub number: u32,
    pub name: &'static str,
}

impl DiagnosticCode {
    const fn new(prefix: &'static str, number: u32, name: &'static str) -> Self {
        Self { prefix, number, name }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:04}[{}]", self.prefix, self.number, self.name)
    }
}

// Fatal type errors (spec §7).
pub const E_UNBOUND_TYVAR: DiagnosticCode = DiagnosticCode::new("E", 1, "unbound-type-variable");
pub const E_NOT_SUBTYPE: DiagnosticCode = DiagnosticCode::new("E", 2, "not-a-subtype");
pub const E_NOT_FUNCTION: DiagnosticCode = DiagnosticCode::new("E", 3, "not-a-function");
pub const E_ARITY_MISMATCH: DiagnosticCode = DiagnosticCode::new("E", 4, "arity-mismatch");
pub const E_SELF_REFERENTIAL: DiagnosticCode = DiagnosticCode::new("E", 5, "self-referential-type");
pub const E_ROW_MISSING_LABEL: DiagnosticCode = DiagnosticCode::new("E", 6, "missing-row-label");
pub const E_CANNOT_UNIFY: DiagnosticCode = DiagnosticCode::new("E", 7, "cannot-unify");
pub const E_SKOLEM_ESCAPE: DiagnosticCode = DiagnosticCode::new("E", 8, "skolem-escape");
pub const E_DANGLING_UNIVAR: DiagnosticCode = DiagnosticCode::new("E", 9, "dangling-univar");

// Fatal resolver errors.
pub const E_FIXITY_SELF_REFERENCE: DiagnosticCode = DiagnosticCode::new("E", 50, "fixity-self-reference");

// Non-fatal warnings.
pub const W_PRECEDENCE_CYCLE: DiagnosticCode = DiagnosticCode::new("W", 1, "precedence-cycle");
pub const W_DANGLING_SIGNATURE: DiagnosticCode = DiagnosticCode::new("W", 2, "dangling-signature");

/// A single diagnostic message.
#[derive(Clone, Debug)]
pub struct Diagnostic {
    pub level: Level,
    pub code: DiagnosticCode,
    pub message: String,
    pub loc: Loc,
    pub notes: Vec<String>,
}

impl Diagnostic {
    pub fn error(code: DiagnosticCode, message: impl Into<String>, loc: Loc) -> Self {
        Self { level: Level::Error, code, message: message.into(), loc, notes: Vec::new() }
    }

    pub fn warning(code: DiagnosticCode, message: impl Into<String>, loc: Loc) -> Self {
        Self { level: Level::Warning, code, message: message.into(), loc, notes: Vec::new() }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }
}

/// Collects diagnostics as the checker runs. Fatal diagnostics abort the
/// enclosing SCC (spec §7) but the `Handler` itself never panics or
/// unwinds; the checker is responsible for checking [`Handler::has_fatal`]
/// at SCC boundaries.
#[derive(Default, Debug)]
pub struct Handler {
    diagnostics: Vec<Diagnostic>,
}

impl Handler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a non-fatal diagnostic (a warning); processing continues.
    pub fn non_fatal(&mut self, report: Diagnostic) {
        debug_assert_eq!(report.level, Level::Warning, "non_fatal report should be a warning");
        self.diagnostics.push(report);
    }

    /// Record one or more fatal diagnostics; the caller must stop work on
    /// the current declaration group once this returns.
    pub fn fatal(&mut self, reports: impl IntoIterator<Item = Diagnostic>) {
        for report in reports {
            debug_assert_eq!(report.level, Level::Error, "fatal report should be an error");
            self.diagnostics.push(report);
        }
    }

    pub fn has_fatal(&self) -> bool {
        self.diagnostics.iter().any(|d| d.level == Level::Error)
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_fatal_does_not_set_has_fatal() {
        let mut h = Handler::new();
        h.non_fatal(Diagnostic::warning(W_DANGLING_SIGNATURE, "f : Int has no binding", Loc::DUMMY));
        assert!(!h.has_fatal());
        assert_eq!(h.diagnostics().len(), 1);
    }

    #[test]
    fn fatal_sets_has_fatal() {
        let mut h = Handler::new();
        h.fatal([Diagnostic::error(E_NOT_FUNCTION, "not a function", Loc::DUMMY)]);
        assert!(h.has_fatal());
    }

    #[test]
    fn code_display_format() {
        assert_eq!(E_UNBOUND_TYVAR.to_string(), "E0001[unbound-type-variable]");
        assert_eq!(W_PRECEDENCE_CYCLE.to_string(), "W0001[precedence-cycle]");
    }
}
