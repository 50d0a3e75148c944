//! The `Type` data model (spec §3, "Types").
//!
//! `Type` is a plain tagged tree; none of the unification/generalization
//! machinery lives here (that's `rellc-check`'s job) — this module only
//! defines the shape, plus the handful of constructors that make building
//! types in tests and in `surface` readable.

use crate::name::Name;
use rellc_util::{define_idx, Symbol};
use std::collections::BTreeMap;

define_idx!(
    /// A bound type variable's identity. Since names are globally unique
    /// in this checker (spec §9: "name-based... because names are
    /// globally unique"), a `TypeVar` is just an id, not a de Bruijn
    /// index — no binder-depth bookkeeping is needed when substituting.
    TypeVar
);

define_idx!(
    /// A rigid variable introduced by instantiating a quantifier at
    /// "consuming" variance (spec §4.4).
    SkolemId
);

define_idx!(
    /// A metavariable that may later be solved to a concrete type.
    UniVarId
);

/// A row: an unordered label → `Type` mapping plus an optional extension
/// standing for "and more fields/tags, unknown" (spec §3, "Row T").
///
/// Represented as `(BTreeMap<Symbol, Type>, Option<Type>)` per spec §9 —
/// `BTreeMap` gives row equality a canonical field order for free once
/// `compress` has normalised the extension chain.
#[derive(Clone, Debug, PartialEq)]
pub struct Row {
    pub fields: BTreeMap<Symbol, Type>,
    pub extension: Option<Box<Type>>,
}

impl Row {
    pub fn closed(fields: BTreeMap<Symbol, Type>) -> Self {
        Self { fields, extension: None }
    }

    pub fn open(fields: BTreeMap<Symbol, Type>, extension: Type) -> Self {
        Self { fields, extension: Some(Box::new(extension)) }
    }

    pub fn empty() -> Self {
        Self { fields: BTreeMap::new(), extension: None }
    }

    pub fn is_closed(&self) -> bool {
        self.extension.is_none()
    }
}

/// A type (spec §3, "Types").
#[derive(Clone, Debug, PartialEq)]
pub enum Type {
    /// A named type constructor, e.g. `Bool`, `List`, or a user-defined
    /// type name.
    Name(Name),
    /// A bound type variable; must appear lexically under a binding
    /// `Forall`/`Exists` (spec §3 invariant 1) — a free `Var` reaching
    /// `mono` is a type error, not a panic.
    Var(TypeVar),
    Skolem(SkolemId),
    UniVar(UniVarId),
    Forall(TypeVar, Box<Type>),
    Exists(TypeVar, Box<Type>),
    Function(Box<Type>, Box<Type>),
    /// Higher-kinded application, e.g. `List a`. Checked invariantly in
    /// both positions (spec §4.7, a deliberate simplification).
    Application(Box<Type>, Box<Type>),
    Record(Row),
    Variant(Row),
}

impl Type {
    pub fn function(from: Type, to: Type) -> Type {
        Type::Function(Box::new(from), Box::new(to))
    }

    pub fn application(head: Type, arg: Type) -> Type {
        Type::Application(Box::new(head), Box::new(arg))
    }

    pub fn forall(v: TypeVar, body: Type) -> Type {
        Type::Forall(v, Box::new(body))
    }

    pub fn exists(v: TypeVar, body: Type) -> Type {
        Type::Exists(v, Box::new(body))
    }

    pub fn record(row: Row) -> Type {
        Type::Record(row)
    }

    pub fn variant(row: Row) -> Type {
        Type::Variant(row)
    }

    pub fn is_quantifier(&self) -> bool {
        matches!(self, Type::Forall(..) | Type::Exists(..))
    }
}
