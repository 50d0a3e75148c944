//! Free-name collection over expressions, patterns and types (spec §4.2:
//! "traverses the body collecting free referenced names").

use rellc_ast::{Decl, Expr, Name, Pattern, Type};
use std::collections::HashSet;

/// Names a pattern binds (`Var`), as opposed to names it *references*
/// (`Constructor`, whose `name` is a use of an existing declaration, not
/// a binder).
pub fn pattern_binders(pattern: &Pattern, out: &mut HashSet<Name>) {
    match pattern {
        Pattern::Var(n) => {
            out.insert(*n);
        }
        Pattern::Wildcard(_) => {}
        Pattern::Literal(..) => {}
        Pattern::Constructor { args, .. } => {
            for arg in args {
                pattern_binders(arg, out);
            }
        }
        Pattern::VariantTag { payload, .. } => {
            if let Some(p) = payload {
                pattern_binders(p, out);
            }
        }
        Pattern::Record { fields, .. } => {
            for p in fields.values() {
                pattern_binders(p, out);
            }
        }
    }
}

/// Names a pattern *references* (constructor names), which contribute a
/// dependency edge the same way a `Var` use in an expression does.
pub fn pattern_references(pattern: &Pattern, out: &mut HashSet<Name>) {
    match pattern {
        Pattern::Var(_) | Pattern::Wildcard(_) | Pattern::Literal(..) => {}
        Pattern::Constructor { name, args, .. } => {
            out.insert(*name);
            for arg in args {
                pattern_references(arg, out);
            }
        }
        Pattern::VariantTag { payload, .. } => {
            if let Some(p) = payload {
                pattern_references(p, out);
            }
        }
        Pattern::Record { fields, .. } => {
            for p in fields.values() {
                pattern_references(p, out);
            }
        }
    }
}

fn type_references(ty: &Type, out: &mut HashSet<Name>) {
    match ty {
        Type::Name(n) => {
            out.insert(*n);
        }
        Type::Var(_) | Type::Skolem(_) | Type::UniVar(_) => {}
        Type::Forall(_, body) | Type::Exists(_, body) => type_references(body, out),
        Type::Function(a, b) | Type::Application(a, b) => {
            type_references(a, out);
            type_references(b, out);
        }
        Type::Record(row) | Type::Variant(row) => {
            for t in row.fields.values() {
                type_references(t, out);
            }
            if let Some(ext) = &row.extension {
                type_references(ext, out);
            }
        }
    }
}

/// Collects every free name referenced by `expr`: names used but not
/// bound by an enclosing lambda/let/case arm within `expr` itself.
pub fn free_names_expr(expr: &Expr, out: &mut HashSet<Name>) {
    let mut bound = HashSet::new();
    collect_expr(expr, &mut bound, out);
}

fn collect_expr(expr: &Expr, bound: &mut HashSet<Name>, out: &mut HashSet<Name>) {
    match expr {
        Expr::Var(n) => {
            if !bound.contains(n) {
                out.insert(*n);
            }
        }
        Expr::App(e) => {
            collect_expr(&e.func, bound, out);
            collect_expr(&e.arg, bound, out);
        }
        Expr::Lambda(e) => {
            let mut inner = bound.clone();
            let mut refs = HashSet::new();
            pattern_binders(&e.param, &mut inner);
            pattern_references(&e.param, &mut refs);
            out.extend(refs.into_iter().filter(|n| !bound.contains(n)));
            collect_expr(&e.body, &mut inner, out);
        }
        Expr::Let(e) => {
            collect_expr(&e.value, bound, out);
            let mut inner = bound.clone();
            let mut refs = HashSet::new();
            pattern_binders(&e.binding, &mut inner);
            pattern_references(&e.binding, &mut refs);
            out.extend(refs.into_iter().filter(|n| !bound.contains(n)));
            collect_expr(&e.body, &mut inner, out);
        }
        Expr::Annotation(e) => {
            type_references(&e.annotation, out);
            collect_expr(&e.expr, bound, out);
        }
        Expr::If(e) => {
            collect_expr(&e.cond, bound, out);
            collect_expr(&e.then_branch, bound, out);
            collect_expr(&e.else_branch, bound, out);
        }
        Expr::Case(e) => {
            collect_expr(&e.scrutinee, bound, out);
            for arm in &e.arms {
                let mut inner = bound.clone();
                let mut refs = HashSet::new();
                pattern_binders(&arm.pattern, &mut inner);
                pattern_references(&arm.pattern, &mut refs);
                out.extend(refs.into_iter().filter(|n| !bound.contains(n)));
                collect_expr(&arm.body, &mut inner, out);
            }
        }
        Expr::Match(e) => {
            for s in &e.scrutinees {
                collect_expr(s, bound, out);
            }
            for arm in &e.arms {
                let mut inner = bound.clone();
                let mut refs = HashSet::new();
                for p in &arm.patterns {
                    pattern_binders(p, &mut inner);
                    pattern_references(p, &mut refs);
                }
                out.extend(refs.into_iter().filter(|n| !bound.contains(n)));
                collect_expr(&arm.body, &mut inner, out);
            }
        }
        Expr::List(e) => {
            for item in &e.items {
                collect_expr(item, bound, out);
            }
        }
        Expr::Record(e) => {
            for field in e.fields.values() {
                collect_expr(field, bound, out);
            }
        }
        Expr::Variant(e) => {
            if let Some(p) = &e.payload {
                collect_expr(p, bound, out);
            }
        }
        Expr::RecordLens(_) => {}
        Expr::Literal(..) => {}
    }
}

/// Free names referenced by a single declaration, used to build the
/// declaration-dependency graph (spec §4.2).
pub fn decl_references(decl: &Decl, out: &mut HashSet<Name>) {
    match decl {
        Decl::Fixity(_) => {}
        Decl::Value(d) => free_names_expr(&d.value, out),
        Decl::Type(d) => {
            for ctor in &d.constructors {
                for arg in &ctor.args {
                    type_references(arg, out);
                }
            }
        }
        Decl::Signature(d) => type_references(&d.signature, out),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rellc_ast::surface;
    use rellc_util::Loc;

    #[test]
    fn lambda_param_is_not_a_free_name() {
        let gen = surface::NameGen::new();
        let x = gen.fresh("x", Loc::DUMMY);
        let expr = surface::lambda(surface::pvar(x), surface::var(x), Loc::DUMMY);
        let mut out = HashSet::new();
        free_names_expr(&expr, &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn unbound_var_is_free() {
        let gen = surface::NameGen::new();
        let f = gen.fresh("f", Loc::DUMMY);
        let expr = surface::var(f);
        let mut out = HashSet::new();
        free_names_expr(&expr, &mut out);
        assert_eq!(out.len(), 1);
        assert!(out.contains(&f));
    }

    #[test]
    fn constructor_pattern_name_is_a_reference_not_a_binder() {
        let gen = surface::NameGen::new();
        let cons = gen.fresh("Cons", Loc::DUMMY);
        let x = gen.fresh("x", Loc::DUMMY);
        let pat = surface::pconstructor(cons, vec![surface::pvar(x)], Loc::DUMMY);
        let mut binders = HashSet::new();
        let mut refs = HashSet::new();
        pattern_binders(&pat, &mut binders);
        pattern_references(&pat, &mut refs);
        assert!(binders.contains(&x) && !binders.contains(&cons));
        assert!(refs.contains(&cons) && !refs.contains(&x));
    }

    #[test]
    fn let_bound_name_shadows_within_body_only() {
        let gen = surface::NameGen::new();
        let x = gen.fresh("x", Loc::DUMMY);
        let outer = gen.fresh("x_outer_use", Loc::DUMMY);
        let expr = surface::let_(surface::pvar(x), surface::var(outer), surface::var(x), Loc::DUMMY);
        let mut out = HashSet::new();
        free_names_expr(&expr, &mut out);
        assert_eq!(out.len(), 1);
        assert!(out.contains(&outer));
    }
}
