//! Hand-built constructors standing in for the parser.
//!
//! This workspace has no lexer/parser (spec §1: both are out-of-scope
//! external collaborators); tests that need an `Expr`/`Decl` tree build
//! one directly through these functions instead, the way `faxc-sem`'s
//! own tests construct `hir` nodes by hand rather than parsing source
//! text.

use crate::decl::{Assoc, ConstructorDef, Decl, FixityDecl, RelOrd, SignatureDecl, TypeDecl, ValueDecl};
use crate::expr::{
    AnnotationExpr, AppExpr, CaseArm, CaseExpr, Expr, IfExpr, LambdaExpr, LetExpr, ListExpr, Literal,
    MatchArm, MatchExpr, Pattern, RecordExpr, RecordLensExpr, VariantExpr,
};
use crate::name::{Id, Name};
use crate::types::Type;
use rellc_util::{Fresh, Loc, Symbol};
use std::collections::BTreeMap;

/// Mints fresh [`Name`]s for hand-built test trees, mirroring the name
/// resolver's monotonic `Id` source (spec §6, "Name generator").
#[derive(Default)]
pub struct NameGen(Fresh);

impl NameGen {
    pub fn new() -> Self {
        Self(Fresh::new())
    }

    pub fn fresh(&self, text: &str, loc: Loc) -> Name {
        Name::user(text, Id(self.0.next()), loc)
    }
}

pub fn var(name: Name) -> Expr {
    Expr::Var(name)
}

pub fn app(func: Expr, arg: Expr, loc: Loc) -> Expr {
    Expr::App(AppExpr { func: Box::new(func), arg: Box::new(arg), loc })
}

/// Curried application of `func` to each of `args` in order.
pub fn apply(func: Expr, args: impl IntoIterator<Item = Expr>, loc: Loc) -> Expr {
    args.into_iter().fold(func, |f, a| app(f, a, loc))
}

pub fn lambda(param: Pattern, body: Expr, loc: Loc) -> Expr {
    Expr::Lambda(LambdaExpr { param: Box::new(param), body: Box::new(body), loc })
}

/// Curried lambda over several patterns, innermost body last.
pub fn lambdas(params: impl IntoIterator<Item = Pattern>, body: Expr, loc: Loc) -> Expr {
    let params: Vec<_> = params.into_iter().collect();
    params.into_iter().rev().fold(body, |acc, p| lambda(p, acc, loc))
}

pub fn let_(binding: Pattern, value: Expr, body: Expr, loc: Loc) -> Expr {
    Expr::Let(LetExpr { binding: Box::new(binding), value: Box::new(value), body: Box::new(body), loc })
}

pub fn annotation(expr: Expr, annotation: Type, loc: Loc) -> Expr {
    Expr::Annotation(AnnotationExpr { expr: Box::new(expr), annotation, loc })
}

pub fn if_(cond: Expr, then_branch: Expr, else_branch: Expr, loc: Loc) -> Expr {
    Expr::If(IfExpr {
        cond: Box::new(cond),
        then_branch: Box::new(then_branch),
        else_branch: Box::new(else_branch),
        loc,
    })
}

pub fn case(scrutinee: Expr, arms: Vec<(Pattern, Expr)>, loc: Loc) -> Expr {
    Expr::Case(CaseExpr {
        scrutinee: Box::new(scrutinee),
        arms: arms.into_iter().map(|(pattern, body)| CaseArm { pattern, body }).collect(),
        loc,
    })
}

pub fn match_(scrutinees: Vec<Expr>, arms: Vec<(Vec<Pattern>, Expr)>, loc: Loc) -> Expr {
    Expr::Match(MatchExpr {
        scrutinees,
        arms: arms.into_iter().map(|(patterns, body)| MatchArm { patterns, body }).collect(),
        loc,
    })
}

pub fn list(items: Vec<Expr>, loc: Loc) -> Expr {
    Expr::List(ListExpr { items, loc })
}

pub fn record(fields: Vec<(&str, Expr)>, loc: Loc) -> Expr {
    let fields = fields.into_iter().map(|(label, expr)| (Symbol::intern(label), expr)).collect::<BTreeMap<_, _>>();
    Expr::Record(RecordExpr { fields, loc })
}

pub fn variant(tag: &str, payload: Option<Expr>, loc: Loc) -> Expr {
    Expr::Variant(VariantExpr { tag: Symbol::intern(tag), payload: payload.map(Box::new), loc })
}

pub fn record_lens(path: &[&str], loc: Loc) -> Expr {
    Expr::RecordLens(RecordLensExpr { path: path.iter().map(|s| Symbol::intern(s)).collect(), loc })
}

pub fn int_lit(value: i64, loc: Loc) -> Expr {
    Expr::Literal(Literal::Int(value), loc)
}

pub fn text_lit(value: &str, loc: Loc) -> Expr {
    Expr::Literal(Literal::Text(Symbol::intern(value)), loc)
}

pub fn char_lit(value: char, loc: Loc) -> Expr {
    Expr::Literal(Literal::Char(value), loc)
}

pub fn pvar(name: Name) -> Pattern {
    Pattern::Var(name)
}

pub fn pwildcard(loc: Loc) -> Pattern {
    Pattern::Wildcard(loc)
}

pub fn pliteral(lit: Literal, loc: Loc) -> Pattern {
    Pattern::Literal(lit, loc)
}

pub fn pconstructor(name: Name, args: Vec<Pattern>, loc: Loc) -> Pattern {
    Pattern::Constructor { name, args, loc }
}

pub fn pvariant(tag: &str, payload: Option<Pattern>, loc: Loc) -> Pattern {
    Pattern::VariantTag { tag: Symbol::intern(tag), payload: payload.map(Box::new), loc }
}

pub fn precord(fields: Vec<(&str, Pattern)>, loc: Loc) -> Pattern {
    let fields = fields.into_iter().map(|(label, pat)| (Symbol::intern(label), pat)).collect::<BTreeMap<_, _>>();
    Pattern::Record { fields, loc }
}

pub fn value_decl(name: Name, value: Expr, loc: Loc) -> Decl {
    Decl::Value(ValueDecl { name, value, loc })
}

pub fn signature_decl(name: Name, signature: Type, loc: Loc) -> Decl {
    Decl::Signature(SignatureDecl { name, signature, loc })
}

pub fn type_decl(name: Name, constructors: Vec<ConstructorDef>, loc: Loc) -> Decl {
    Decl::Type(TypeDecl { name, constructors, loc })
}

pub fn fixity_decl(op: crate::decl::Op, assoc: Assoc, related_to: crate::decl::Op, ord: RelOrd, loc: Loc) -> Decl {
    Decl::Fixity(FixityDecl { op, assoc, related_to, ord, loc })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_gen_mints_distinct_ids() {
        let gen = NameGen::new();
        let a = gen.fresh("x", Loc::DUMMY);
        let b = gen.fresh("x", Loc::DUMMY);
        assert_ne!(a, b);
    }

    #[test]
    fn apply_curries_left_to_right() {
        let gen = NameGen::new();
        let f = var(gen.fresh("f", Loc::DUMMY));
        let x = var(gen.fresh("x", Loc::DUMMY));
        let y = var(gen.fresh("y", Loc::DUMMY));
        let applied = apply(f, [x, y], Loc::DUMMY);
        match applied {
            Expr::App(outer) => match *outer.func {
                Expr::App(_) => {}
                _ => panic!("expected nested App for curried application"),
            },
            _ => panic!("expected App"),
        }
    }

    #[test]
    fn lambdas_nests_innermost_last() {
        let gen = NameGen::new();
        let x = gen.fresh("x", Loc::DUMMY);
        let y = gen.fresh("y", Loc::DUMMY);
        let body = var(x);
        let expr = lambdas([pvar(x), pvar(y)], body, Loc::DUMMY);
        match expr {
            Expr::Lambda(outer) => match *outer.body {
                Expr::Lambda(_) => {}
                _ => panic!("expected nested Lambda"),
            },
            _ => panic!("expected Lambda"),
        }
    }
}
