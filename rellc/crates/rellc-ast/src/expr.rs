//! Expressions and patterns (spec §4.8, "Bidirectional checker").
//!
//! Mirrors `faxc-par::ast`'s shape: `Expr`/`Pattern` are enums over
//! per-variant structs that each carry their own `loc: Loc`, with a
//! `.loc()` accessor instead of threading a separate span table.

use crate::name::Name;
use crate::types::Type;
use rellc_util::{Loc, Symbol};
use std::collections::BTreeMap;

#[derive(Clone, Debug, PartialEq)]
pub enum Literal {
    /// `IntLiteral` per spec §4.8; the checker decides `Nat` vs `Int` from
    /// the sign, so the sign is kept rather than split at parse time.
    Int(i64),
    Text(Symbol),
    Char(char),
}

#[derive(Clone, Debug)]
pub struct AppExpr {
    pub func: Box<Expr>,
    pub arg: Box<Expr>,
    pub loc: Loc,
}

#[derive(Clone, Debug)]
pub struct LambdaExpr {
    pub param: Box<Pattern>,
    pub body: Box<Expr>,
    pub loc: Loc,
}

#[derive(Clone, Debug)]
pub struct LetExpr {
    pub binding: Box<Pattern>,
    pub value: Box<Expr>,
    pub body: Box<Expr>,
    pub loc: Loc,
}

#[derive(Clone, Debug)]
pub struct AnnotationExpr {
    pub expr: Box<Expr>,
    pub annotation: Type,
    pub loc: Loc,
}

#[derive(Clone, Debug)]
pub struct IfExpr {
    pub cond: Box<Expr>,
    pub then_branch: Box<Expr>,
    pub else_branch: Box<Expr>,
    pub loc: Loc,
}

#[derive(Clone, Debug)]
pub struct CaseArm {
    pub pattern: Pattern,
    pub body: Expr,
}

#[derive(Clone, Debug)]
pub struct CaseExpr {
    pub scrutinee: Box<Expr>,
    pub arms: Vec<CaseArm>,
    pub loc: Loc,
}

/// A `match` over one or more scrutinees; every arm's pattern list must
/// have the same arity as `scrutinees` (spec §4.8: "Match requires all
/// arms to have the same arity").
#[derive(Clone, Debug)]
pub struct MatchArm {
    pub patterns: Vec<Pattern>,
    pub body: Expr,
}

#[derive(Clone, Debug)]
pub struct MatchExpr {
    pub scrutinees: Vec<Expr>,
    pub arms: Vec<MatchArm>,
    pub loc: Loc,
}

#[derive(Clone, Debug)]
pub struct ListExpr {
    pub items: Vec<Expr>,
    pub loc: Loc,
}

#[derive(Clone, Debug)]
pub struct RecordExpr {
    pub fields: BTreeMap<Symbol, Expr>,
    pub loc: Loc,
}

/// A variant constructor application `'Tag e` (spec §4.8: "Variant
/// `'Tag`"). `payload` is `None` for a nullary tag like `'None`, which
/// the checker treats as carrying an empty-record payload.
#[derive(Clone, Debug)]
pub struct VariantExpr {
    pub tag: Symbol,
    pub payload: Option<Box<Expr>>,
    pub loc: Loc,
}

/// A record-lens path `f1.f2…fn` (spec §4.8: "RecordLens").
#[derive(Clone, Debug)]
pub struct RecordLensExpr {
    pub path: Vec<Symbol>,
    pub loc: Loc,
}

#[derive(Clone, Debug)]
pub enum Expr {
    Var(Name),
    App(AppExpr),
    Lambda(LambdaExpr),
    Let(LetExpr),
    Annotation(AnnotationExpr),
    If(IfExpr),
    Case(CaseExpr),
    Match(MatchExpr),
    List(ListExpr),
    Record(RecordExpr),
    Variant(VariantExpr),
    RecordLens(RecordLensExpr),
    Literal(Literal, Loc),
}

impl Expr {
    pub fn loc(&self) -> Loc {
        match self {
            Expr::Var(n) => n.loc(),
            Expr::App(e) => e.loc,
            Expr::Lambda(e) => e.loc,
            Expr::Let(e) => e.loc,
            Expr::Annotation(e) => e.loc,
            Expr::If(e) => e.loc,
            Expr::Case(e) => e.loc,
            Expr::Match(e) => e.loc,
            Expr::List(e) => e.loc,
            Expr::Record(e) => e.loc,
            Expr::Variant(e) => e.loc,
            Expr::RecordLens(e) => e.loc,
            Expr::Literal(_, loc) => *loc,
        }
    }
}

#[derive(Clone, Debug)]
pub enum Pattern {
    Var(Name),
    Wildcard(Loc),
    Literal(Literal, Loc),
    /// A declared-constructor pattern (e.g. `Cons x xs`); arity is checked
    /// against the constructor's declared argument count (spec §7, "wrong
    /// arity in a constructor pattern").
    Constructor { name: Name, args: Vec<Pattern>, loc: Loc },
    /// A row-variant pattern (e.g. `'Some x`, `'None`); `payload` is
    /// `None` for a nullary tag.
    VariantTag { tag: Symbol, payload: Option<Box<Pattern>>, loc: Loc },
    Record { fields: BTreeMap<Symbol, Pattern>, loc: Loc },
}

impl Pattern {
    pub fn loc(&self) -> Loc {
        match self {
            Pattern::Var(n) => n.loc(),
            Pattern::Wildcard(loc) => *loc,
            Pattern::Literal(_, loc) => *loc,
            Pattern::Constructor { loc, .. } => *loc,
            Pattern::VariantTag { loc, .. } => *loc,
            Pattern::Record { loc, .. } => *loc,
        }
    }
}
