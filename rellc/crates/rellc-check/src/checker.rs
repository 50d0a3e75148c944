//! The `Checker`: the shared mutable inference environment (spec §5) and
//! the entry point gluing `rellc-resolve`'s `Output` to the bidirectional
//! checker (spec §6, "Output: `(Output, environment, diagnostics)`").

use crate::univar::UnificationTable;
use indexmap::IndexMap;
use rellc_ast::decl::ConstructorDef;
use rellc_ast::{Builtins, Decl, Name, Type};
use rellc_resolve::Output;
use rellc_util::diagnostic::{Diagnostic, Handler};

/// The environment mapping every currently-known name to its type,
/// spec §3 "a `sigs` mapping `Name → Type`". Snapshotted and restored
/// on every scoped region entry (spec §5, §9).
pub type Sigs = IndexMap<Name, Type>;

/// The shared inference state: `sigs`, the unification table (which in
/// turn owns `nextUniVarId`/`nextTypeVar`/`currentScope`), and the
/// configured `Builtins` (spec §5).
pub struct Checker {
    pub(crate) table: UnificationTable,
    pub(crate) sigs: Sigs,
    pub(crate) builtins: Builtins,
}

impl Checker {
    pub fn new(builtins: Builtins) -> Self {
        Self { table: UnificationTable::new(), sigs: Sigs::new(), builtins }
    }

    /// `scoped(action)` (spec §9): snapshots `sigs` before running
    /// `action` and restores it afterward, the structural analogue of a
    /// nested environment frame.
    pub(crate) fn scoped<T>(&mut self, action: impl FnOnce(&mut Self) -> T) -> T {
        let snapshot = self.sigs.clone();
        let result = action(self);
        self.sigs = snapshot;
        result
    }

    /// `forallScope` lifted to the whole checker: `action` gets `&mut
    /// Checker` (not just `&mut UnificationTable`) since `infer`/`check`
    /// also need `sigs`/`builtins`/the handler while running.
    pub(crate) fn with_forall_scope(&mut self, action: impl FnOnce(&mut Self) -> Type) -> Type {
        let start = self.table.enter_scope();
        let out = action(self);
        self.table.exit_scope_and_generalize(start, out)
    }

    fn constructor_type(type_name: Name, ctor: &ConstructorDef) -> Type {
        ctor.args.iter().rev().fold(Type::Name(type_name), |result, arg| Type::function(arg.clone(), result))
    }

    /// Registers every SCC's user signatures and constructor types into
    /// `sigs` before any body is inferred, so mutually recursive groups
    /// (and forward references to later groups' constructors) resolve
    /// (spec §4.2, §5: "within an SCC, signatures are installed before
    /// any body is inferred").
    fn preregister(&mut self, output: &Output) {
        for (name, ty) in &output.signatures {
            self.sigs.insert(*name, ty.clone());
        }
        for decl in output.declarations.values() {
            if let Decl::Type(type_decl) = decl {
                for ctor in &type_decl.constructors {
                    self.sigs.entry(ctor.name).or_insert_with(|| Self::constructor_type(type_decl.name, ctor));
                }
            }
        }
    }

    /// `inferDecls` run over every SCC in dependency order (spec §4.2,
    /// §4.8): processes `output.ordered_declarations` group by group,
    /// reporting the first fatal error per group and continuing with
    /// the next so one mistake doesn't hide downstream problems (spec
    /// §7).
    pub fn check_program(mut self, output: Output, handler: &mut Handler) -> (Output, Sigs, Vec<Diagnostic>) {
        let span = tracing::debug_span!("check_program", group_count = output.ordered_declarations.len());
        let _enter = span.enter();

        self.preregister(&output);

        for group in &output.ordered_declarations {
            let group_span = tracing::debug_span!("scc", decls = group.len());
            let _group_enter = group_span.enter();

            let mut group_handler = Handler::new();
            self.infer_group(group, &mut group_handler);
            let group_had_fatal = group_handler.has_fatal();
            for d in group_handler.into_diagnostics() {
                if d.level == rellc_util::diagnostic::Level::Error {
                    handler.fatal([d]);
                } else {
                    handler.non_fatal(d);
                }
            }
            if group_had_fatal {
                tracing::debug!("group aborted after first fatal error");
            }
        }

        let sigs = self.sigs.clone();
        let diagnostics = handler.diagnostics().to_vec();
        (output, sigs, diagnostics)
    }

    fn infer_group(&mut self, group: &[Decl], handler: &mut Handler) {
        for decl in group {
            let Decl::Value(value) = decl else { continue };
            if handler.has_fatal() {
                break;
            }
            let user_sig = self.sigs.get(&value.name).cloned();
            let inferred = self.with_forall_scope(|checker| {
                let handler = &mut *handler;
                match &user_sig {
                    Some(sig) => {
                        checker.check(handler, &value.value, sig);
                        sig.clone()
                    }
                    None => checker.infer(handler, &value.value),
                }
            });
            let normalised = crate::normalise::normalise(&mut self.table, inferred, value.loc, handler);
            self.sigs.insert(value.name, normalised);
        }
    }
}
