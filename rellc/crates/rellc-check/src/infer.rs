//! The bidirectional checker: `infer`/`check` and their pattern-side
//! counterparts (spec §4.8).

use crate::checker::Checker;
use crate::mono::{mono, Variance};
use crate::rows::{deep_lookup, RowKind};
use crate::subtype::{subtype, supertype};
use rellc_ast::expr::Literal;
use rellc_ast::types::Row;
use rellc_ast::{Expr, Name, Pattern, Type};
use rellc_util::diagnostic::{Diagnostic, Handler, E_ARITY_MISMATCH, E_NOT_FUNCTION, E_ROW_MISSING_LABEL};
use rellc_util::Loc;
use std::collections::BTreeMap;

impl Checker {
    /// `infer(expr) → Type` (spec §4.8).
    pub fn infer(&mut self, handler: &mut Handler, expr: &Expr) -> Type {
        match expr {
            Expr::Var(name) => self.infer_name(*name),
            Expr::App(app) => {
                let func_ty = self.infer(handler, &app.func);
                self.infer_app(handler, func_ty, &app.arg, app.loc)
            }
            Expr::Lambda(lam) => self.scoped(|checker| {
                let handler = &mut *handler;
                let arg_ty = checker.infer_pattern(handler, &lam.param);
                let body_ty = checker.infer(handler, &lam.body);
                Type::function(arg_ty, body_ty)
            }),
            Expr::Let(let_) => self.scoped(|checker| {
                let handler = &mut *handler;
                let value_ty = checker.with_forall_scope(|c| c.infer(&mut *handler, &let_.value));
                checker.check_pattern(handler, &let_.binding, &value_ty);
                checker.infer(handler, &let_.body)
            }),
            Expr::Annotation(ann) => {
                self.check(handler, &ann.expr, &ann.annotation);
                ann.annotation.clone()
            }
            Expr::If(if_) => {
                let bool_ty = Type::Name(self.builtins.bool_);
                self.check(handler, &if_.cond, &bool_ty);
                let then_ty = self.infer(handler, &if_.then_branch);
                let else_ty = self.infer(handler, &if_.else_branch);
                supertype(&mut self.table, &self.builtins, &then_ty, &else_ty, if_.loc, handler)
            }
            Expr::Case(case) => {
                let scrutinee_ty = self.infer(handler, &case.scrutinee);
                let mut joined: Option<Type> = None;
                for arm in &case.arms {
                    let arm_ty = self.scoped(|checker| {
                        let handler = &mut *handler;
                        checker.check_pattern(handler, &arm.pattern, &scrutinee_ty);
                        checker.infer(handler, &arm.body)
                    });
                    joined = Some(match joined {
                        None => arm_ty,
                        Some(acc) => supertype(&mut self.table, &self.builtins, &acc, &arm_ty, case.loc, handler),
                    });
                }
                joined.unwrap_or_else(|| Type::UniVar(self.table.fresh_univar()))
            }
            Expr::Match(m) => {
                let scrutinee_tys: Vec<Type> = m.scrutinees.iter().map(|s| self.infer(handler, s)).collect();
                let mut joined: Option<Type> = None;
                for arm in &m.arms {
                    if arm.patterns.len() != scrutinee_tys.len() {
                        handler.fatal([Diagnostic::error(
                            E_ARITY_MISMATCH,
                            format!("match arm has {} pattern(s), scrutinee list has {}", arm.patterns.len(), scrutinee_tys.len()),
                            m.loc,
                        )]);
                        continue;
                    }
                    let arm_ty = self.scoped(|checker| {
                        let handler = &mut *handler;
                        for (pattern, scrutinee_ty) in arm.patterns.iter().zip(&scrutinee_tys) {
                            checker.check_pattern(handler, pattern, scrutinee_ty);
                        }
                        checker.infer(handler, &arm.body)
                    });
                    joined = Some(match joined {
                        None => arm_ty,
                        Some(acc) => supertype(&mut self.table, &self.builtins, &acc, &arm_ty, m.loc, handler),
                    });
                }
                joined.unwrap_or_else(|| Type::UniVar(self.table.fresh_univar()))
            }
            Expr::List(list) => {
                let mut acc = Type::UniVar(self.table.fresh_univar());
                for item in &list.items {
                    let item_ty = self.infer(handler, item);
                    acc = supertype(&mut self.table, &self.builtins, &acc, &item_ty, list.loc, handler);
                }
                Type::application(Type::Name(self.builtins.list), acc)
            }
            Expr::Record(record) => {
                let fields = record.fields.iter().map(|(label, field_expr)| (*label, self.infer(handler, field_expr))).collect();
                Type::record(Row::closed(fields))
            }
            Expr::Variant(variant) => {
                let payload_ty = match &variant.payload {
                    Some(payload) => self.infer(handler, payload),
                    None => Type::record(Row::empty()),
                };
                let rho = Type::UniVar(self.table.fresh_univar());
                let mut fields = BTreeMap::new();
                fields.insert(variant.tag, payload_ty);
                Type::variant(Row::open(fields, rho))
            }
            Expr::RecordLens(lens) => {
                let a = Type::UniVar(self.table.fresh_univar());
                let b = Type::UniVar(self.table.fresh_univar());
                let r_a = nested_record(&lens.path, a.clone());
                let r_b = nested_record(&lens.path, b.clone());
                let applied = Type::application(Type::Name(self.builtins.lens), r_a);
                let applied = Type::application(applied, r_b);
                let applied = Type::application(applied, a);
                Type::application(applied, b)
            }
            Expr::Literal(lit, loc) => self.literal_type(lit, *loc),
        }
    }

    fn infer_name(&mut self, name: Name) -> Type {
        match self.sigs.get(&name).cloned() {
            Some(sig) => mono(&mut self.table, Variance::Out, sig),
            None => {
                let fresh = Type::UniVar(self.table.fresh_univar());
                self.sigs.insert(name, fresh.clone());
                fresh
            }
        }
    }

    fn infer_app(&mut self, handler: &mut Handler, func_ty: Type, arg: &Expr, loc: Loc) -> Type {
        let func_mono = mono(&mut self.table, Variance::In, func_ty);
        match func_mono {
            Type::Function(from, to) => {
                self.check(handler, arg, &from);
                *to
            }
            Type::UniVar(u) => {
                let from = self.infer(handler, arg);
                let to = Type::UniVar(self.table.fresh_univar());
                self.table.solve_univar_reporting(u, Type::function(from, to.clone()), loc, handler);
                to
            }
            other => {
                handler.fatal([Diagnostic::error(E_NOT_FUNCTION, format!("`{other:?}` is not a function type"), loc)]);
                Type::UniVar(self.table.fresh_univar())
            }
        }
    }

    /// `check(expr, type)` (spec §4.8). The expected type is `mono Out`'d
    /// first so row-shaped expectations can drive row-shaped expressions.
    pub fn check(&mut self, handler: &mut Handler, expr: &Expr, expected: &Type) {
        let dispatch = mono(&mut self.table, Variance::Out, expected.clone());

        match (expr, &dispatch) {
            (Expr::Lambda(lam), Type::Function(from, to)) => {
                self.scoped(|checker| {
                    let handler = &mut *handler;
                    checker.check_pattern(handler, &lam.param, from);
                    checker.check(handler, &lam.body, to);
                });
            }
            (Expr::Annotation(ann), _) => {
                subtype(&mut self.table, &self.builtins, &ann.annotation, expected, ann.loc, handler);
                self.check(handler, &ann.expr, &ann.annotation);
            }
            (Expr::List(list), Type::Application(head, elem)) if matches!(**head, Type::Name(n) if n == self.builtins.list) => {
                for item in &list.items {
                    self.check(handler, item, elem);
                }
            }
            (Expr::Record(record), Type::Record(row)) => {
                for (label, field_expr) in &record.fields {
                    match deep_lookup(&mut self.table, RowKind::Record, *label, Type::record(row.clone())) {
                        Some(field_ty) => self.check(handler, field_expr, &field_ty),
                        None => {
                            handler.fatal([Diagnostic::error(
                                E_ROW_MISSING_LABEL,
                                format!("record type has no field `{label}`"),
                                record.loc,
                            )]);
                        }
                    }
                }
            }
            (_, Type::UniVar(u)) => {
                let inferred = self.infer(handler, expr);
                self.table.solve_univar_reporting(*u, inferred, expr.loc(), handler);
            }
            _ => {
                let inferred = self.infer(handler, expr);
                subtype(&mut self.table, &self.builtins, &inferred, expected, expr.loc(), handler);
            }
        }
    }

    /// `inferPattern` (spec §4.8): mirrors `infer` for patterns, binding
    /// every `Var` it encounters into `sigs`.
    pub fn infer_pattern(&mut self, handler: &mut Handler, pattern: &Pattern) -> Type {
        match pattern {
            Pattern::Var(name) => {
                let fresh = Type::UniVar(self.table.fresh_univar());
                self.sigs.insert(*name, fresh.clone());
                fresh
            }
            Pattern::Wildcard(_) => Type::UniVar(self.table.fresh_univar()),
            Pattern::Literal(lit, loc) => self.literal_type(lit, *loc),
            Pattern::Constructor { name, args, loc } => {
                let ctor_ty = match self.sigs.get(name).cloned() {
                    Some(ty) => mono(&mut self.table, Variance::In, ty),
                    None => {
                        let fresh = Type::UniVar(self.table.fresh_univar());
                        self.sigs.insert(*name, fresh.clone());
                        fresh
                    }
                };
                match walk_arrows(ctor_ty, args.len()) {
                    Ok((arg_tys, result_ty)) if !matches!(result_ty, Type::Function(..)) => {
                        for (arg_pattern, arg_ty) in args.iter().zip(&arg_tys) {
                            self.check_pattern(handler, arg_pattern, arg_ty);
                        }
                        result_ty
                    }
                    _ => {
                        handler.fatal([Diagnostic::error(
                            E_ARITY_MISMATCH,
                            format!("constructor `{name}` pattern supplies {} argument(s), which does not saturate its arity", args.len()),
                            *loc,
                        )]);
                        Type::UniVar(self.table.fresh_univar())
                    }
                }
            }
            Pattern::VariantTag { tag, payload, .. } => {
                let payload_ty = match payload {
                    Some(p) => self.infer_pattern(handler, p),
                    None => Type::record(Row::empty()),
                };
                let rho = Type::UniVar(self.table.fresh_univar());
                let mut fields = BTreeMap::new();
                fields.insert(*tag, payload_ty);
                Type::variant(Row::open(fields, rho))
            }
            Pattern::Record { fields, .. } => {
                let field_tys = fields.iter().map(|(label, p)| (*label, self.infer_pattern(handler, p))).collect();
                let rho = Type::UniVar(self.table.fresh_univar());
                Type::record(Row::open(field_tys, rho))
            }
        }
    }

    /// `checkPattern` (spec §4.8, implied by "Lambda against `Function`:
    /// `checkPattern(arg, from)`"): binds every `Var` at the type given
    /// by `expected` rather than a fresh univar.
    pub fn check_pattern(&mut self, handler: &mut Handler, pattern: &Pattern, expected: &Type) {
        let dispatch = mono(&mut self.table, Variance::Inv, expected.clone());
        match pattern {
            Pattern::Var(name) => {
                self.sigs.insert(*name, expected.clone());
            }
            Pattern::Wildcard(_) => {}
            Pattern::Literal(lit, loc) => {
                let lit_ty = self.literal_type(lit, *loc);
                subtype(&mut self.table, &self.builtins, &lit_ty, expected, *loc, handler);
            }
            Pattern::Constructor { name, args, loc } => {
                let ctor_ty = match self.sigs.get(name).cloned() {
                    Some(ty) => mono(&mut self.table, Variance::Inv, ty),
                    None => dispatch.clone(),
                };
                match walk_arrows(ctor_ty, args.len()) {
                    Ok((arg_tys, result_ty)) if !matches!(result_ty, Type::Function(..)) => {
                        for (arg_pattern, arg_ty) in args.iter().zip(&arg_tys) {
                            self.check_pattern(handler, arg_pattern, arg_ty);
                        }
                        subtype(&mut self.table, &self.builtins, &result_ty, expected, *loc, handler);
                    }
                    _ => {
                        handler.fatal([Diagnostic::error(
                            E_ARITY_MISMATCH,
                            format!("constructor `{name}` pattern supplies {} argument(s), which does not saturate its arity", args.len()),
                            *loc,
                        )]);
                    }
                }
            }
            Pattern::VariantTag { tag, payload, loc } => {
                let field_ty = deep_lookup(&mut self.table, RowKind::Variant, *tag, dispatch);
                match (payload, field_ty) {
                    (Some(p), Some(field_ty)) => self.check_pattern(handler, p, &field_ty),
                    (None, Some(field_ty)) => {
                        let empty = Type::record(Row::empty());
                        subtype(&mut self.table, &self.builtins, &empty, &field_ty, *loc, handler);
                    }
                    (_, None) => {
                        handler.fatal([Diagnostic::error(E_ROW_MISSING_LABEL, format!("variant type has no tag `{tag}`"), *loc)]);
                    }
                }
            }
            Pattern::Record { fields, loc } => {
                for (label, field_pattern) in fields {
                    match deep_lookup(&mut self.table, RowKind::Record, *label, dispatch.clone()) {
                        Some(field_ty) => self.check_pattern(handler, field_pattern, &field_ty),
                        None => {
                            handler.fatal([Diagnostic::error(E_ROW_MISSING_LABEL, format!("record type has no field `{label}`"), *loc)]);
                        }
                    }
                }
            }
        }
    }

    fn literal_type(&self, lit: &Literal, _loc: Loc) -> Type {
        match lit {
            Literal::Int(n) if *n >= 0 => Type::Name(self.builtins.nat),
            Literal::Int(_) => Type::Name(self.builtins.int),
            Literal::Text(_) => Type::Name(self.builtins.text),
            Literal::Char(_) => Type::Name(self.builtins.char_),
        }
    }
}

/// Pops `n` layers of `Function` off `ty`, returning the argument types
/// in order plus whatever remains. `Err` carries how many layers were
/// actually available when `ty` ran out early.
fn walk_arrows(mut ty: Type, n: usize) -> Result<(Vec<Type>, Type), usize> {
    let mut args = Vec::with_capacity(n);
    for i in 0..n {
        match ty {
            Type::Function(from, to) => {
                args.push(*from);
                ty = *to;
            }
            _ => return Err(i),
        }
    }
    Ok((args, ty))
}

/// Builds `{ f1 : { f2 : ... { fn : leaf } ... } }` for a record-lens
/// path (spec §4.8, "RecordLens").
fn nested_record(path: &[rellc_util::Symbol], leaf: Type) -> Type {
    path.iter().rev().fold(leaf, |acc, label| {
        let mut fields = BTreeMap::new();
        fields.insert(*label, acc);
        Type::record(Row::closed(fields))
    })
}
