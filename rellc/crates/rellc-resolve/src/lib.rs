//! rellc-resolve — the dependency resolver (spec §4.2) and the precedence
//! poset glue (spec §4.1), producing the `Output` the checker consumes.

mod free_names;
mod tarjan;

use indexmap::IndexMap;
use rellc_ast::decl::RelOrd;
use rellc_ast::{Decl, DeclId, Fixity, Name, Op, Type};
use rellc_fixity::{Ord as PosetOrd, Poset};
use rellc_util::diagnostic::{Diagnostic, Handler, W_DANGLING_SIGNATURE};
use rellc_util::{IndexVec, Loc};
use rustc_hash::FxHashMap;
use std::collections::HashSet;

/// Everything the dependency resolver hands to the (external) fixity
/// resolver and to the bidirectional checker (spec §3, "Output groups").
pub struct Output {
    pub fixity_map: IndexMap<Op, Fixity>,
    pub operator_priorities: Poset,
    /// SCCs of declarations in dependency order, leaves first (spec
    /// §4.2).
    pub ordered_declarations: Vec<Vec<Decl>>,
    pub declarations: IndexMap<DeclId, Decl>,
    pub name_origins: IndexMap<Name, DeclId>,
    pub signatures: IndexMap<Name, Type>,
}

#[derive(Default)]
pub struct DependencyResolver {
    poset: Poset,
    fixity_map: IndexMap<Op, Fixity>,
    declarations: IndexMap<DeclId, Decl>,
    name_origins: IndexMap<Name, DeclId>,
    signatures: IndexMap<Name, Type>,
    /// Operators that appeared in an explicit relation naming function
    /// application (`None`), so the implicit "below application" default
    /// (spec §4.1) is skipped for them.
    explicit_application_relation: HashSet<Op>,
    decl_ids: IndexVec<DeclId, ()>,
}

impl DependencyResolver {
    pub fn new() -> Self {
        Self::default()
    }

    fn alloc_decl_id(&mut self) -> DeclId {
        self.decl_ids.push(())
    }

    /// Runs the resolver over a module's declarations in source order,
    /// reporting diagnostics to `handler`, and returns the assembled
    /// [`Output`].
    pub fn resolve(mut self, decls: Vec<Decl>, handler: &mut Handler) -> Output {
        let span = tracing::debug_span!("dependency_resolve", decl_count = decls.len());
        let _enter = span.enter();

        let mut decl_ids_by_index: Vec<Option<DeclId>> = Vec::with_capacity(decls.len());

        // Pass 1: allocate DeclIds, register fixity/poset relations and
        // signatures, and record every bound name's origin.
        for decl in &decls {
            match decl {
                Decl::Fixity(fixity) => {
                    self.register_fixity(fixity, handler);
                    decl_ids_by_index.push(None);
                }
                Decl::Value(_) | Decl::Type(_) => {
                    let id = self.alloc_decl_id();
                    for name in decl.bound_names() {
                        self.name_origins.insert(name, id);
                    }
                    decl_ids_by_index.push(Some(id));
                }
                Decl::Signature(sig) => {
                    self.signatures.insert(sig.name, sig.signature.clone());
                    decl_ids_by_index.push(None);
                }
            }
        }

        // Default precedence: any operator not explicitly related to
        // application sits directly below it (spec §4.1).
        let seen_operators: Vec<Op> = self.fixity_map.keys().copied().collect();
        for op in seen_operators {
            if !self.explicit_application_relation.contains(&op) {
                self.poset.add_relation(op, None, PosetOrd::Lt, Loc::DUMMY, handler);
            }
        }

        // Pass 2: build the DeclId dependency graph (dependency -> dependent).
        let mut edges: FxHashMap<DeclId, Vec<DeclId>> = FxHashMap::default();
        let mut nodes: Vec<DeclId> = Vec::new();
        for (decl, maybe_id) in decls.iter().zip(decl_ids_by_index.iter()) {
            let Some(id) = maybe_id else { continue };
            nodes.push(*id);
            self.declarations.insert(*id, decl.clone());

            let mut refs = HashSet::new();
            free_names::decl_references(decl, &mut refs);
            for referenced in refs {
                if let Some(&dep_id) = self.name_origins.get(&referenced) {
                    if dep_id != *id {
                        edges.entry(dep_id).or_default().push(*id);
                    }
                }
            }
        }

        let sccs = tarjan::tarjan_scc(&nodes, &edges);
        let ordered_declarations: Vec<Vec<Decl>> = sccs
            .into_iter()
            .map(|scc| scc.into_iter().map(|id| self.declarations[&id].clone()).collect())
            .collect();

        self.check_dangling_signatures(handler);

        Output {
            fixity_map: self.fixity_map,
            operator_priorities: self.poset,
            ordered_declarations,
            declarations: self.declarations,
            name_origins: self.name_origins,
            signatures: self.signatures,
        }
    }

    fn register_fixity(&mut self, fixity: &rellc_ast::decl::FixityDecl, handler: &mut Handler) {
        self.fixity_map.insert(fixity.op, Fixity { assoc: fixity.assoc });
        let ord = match fixity.ord {
            RelOrd::Lt => PosetOrd::Lt,
            RelOrd::Eq => PosetOrd::Eq,
            RelOrd::Gt => PosetOrd::Gt,
        };
        if fixity.related_to.is_none() {
            self.explicit_application_relation.insert(fixity.op);
        }
        self.poset.add_relation(fixity.op, fixity.related_to, ord, fixity.loc, handler);
    }

    fn check_dangling_signatures(&self, handler: &mut Handler) {
        for (name, _ty) in &self.signatures {
            if !self.name_origins.contains_key(name) {
                handler.non_fatal(Diagnostic::warning(
                    W_DANGLING_SIGNATURE,
                    format!("signature for `{name}` has no matching binding"),
                    name.loc(),
                ));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rellc_ast::decl::{Assoc, RelOrd as AstRelOrd};
    use rellc_ast::surface;
    use rellc_ast::types::Type as AstType;

    #[test]
    fn independent_value_decls_form_separate_sccs() {
        let gen = surface::NameGen::new();
        let x = gen.fresh("x", Loc::DUMMY);
        let y = gen.fresh("y", Loc::DUMMY);
        let decls = vec![
            surface::value_decl(x, surface::int_lit(1, Loc::DUMMY), Loc::DUMMY),
            surface::value_decl(y, surface::int_lit(2, Loc::DUMMY), Loc::DUMMY),
        ];
        let mut handler = Handler::new();
        let output = DependencyResolver::new().resolve(decls, &mut handler);
        assert_eq!(output.ordered_declarations.len(), 2);
        assert!(!handler.has_fatal());
    }

    #[test]
    fn dependent_value_decl_comes_after_its_dependency() {
        let gen = surface::NameGen::new();
        let leaf = gen.fresh("leaf", Loc::DUMMY);
        let dependent = gen.fresh("dependent", Loc::DUMMY);
        let decls = vec![
            surface::value_decl(dependent, surface::var(leaf), Loc::DUMMY),
            surface::value_decl(leaf, surface::int_lit(1, Loc::DUMMY), Loc::DUMMY),
        ];
        let mut handler = Handler::new();
        let output = DependencyResolver::new().resolve(decls, &mut handler);
        let pos_of = |name: Name| {
            output
                .ordered_declarations
                .iter()
                .position(|scc| scc.iter().any(|d| d.bound_names().contains(&name)))
                .unwrap()
        };
        assert!(pos_of(leaf) < pos_of(dependent));
    }

    #[test]
    fn mutually_recursive_decls_share_an_scc() {
        let gen = surface::NameGen::new();
        let f = gen.fresh("f", Loc::DUMMY);
        let g = gen.fresh("g", Loc::DUMMY);
        let decls = vec![
            surface::value_decl(f, surface::var(g), Loc::DUMMY),
            surface::value_decl(g, surface::var(f), Loc::DUMMY),
        ];
        let mut handler = Handler::new();
        let output = DependencyResolver::new().resolve(decls, &mut handler);
        assert_eq!(output.ordered_declarations.len(), 1);
        assert_eq!(output.ordered_declarations[0].len(), 2);
    }

    #[test]
    fn dangling_signature_is_non_fatal() {
        let gen = surface::NameGen::new();
        let f = gen.fresh("f", Loc::DUMMY);
        let decls = vec![surface::signature_decl(f, AstType::Name(rellc_ast::Name::Builtin(rellc_ast::Builtin::Int)), Loc::DUMMY)];
        let mut handler = Handler::new();
        let output = DependencyResolver::new().resolve(decls, &mut handler);
        assert!(!handler.has_fatal());
        assert_eq!(handler.diagnostics().len(), 1);
        assert_eq!(output.signatures.len(), 1);
    }

    #[test]
    fn fixity_self_reference_is_fatal() {
        let gen = surface::NameGen::new();
        let plus = gen.fresh("+", Loc::DUMMY);
        let decls = vec![surface::fixity_decl(Some(plus), Assoc::Left, Some(plus), AstRelOrd::Gt, Loc::DUMMY)];
        let mut handler = Handler::new();
        let _output = DependencyResolver::new().resolve(decls, &mut handler);
        assert!(handler.has_fatal());
    }

    #[test]
    fn operator_implicitly_below_application() {
        let gen = surface::NameGen::new();
        let plus = gen.fresh("+", Loc::DUMMY);
        let decls = vec![surface::fixity_decl(Some(plus), Assoc::Left, None, AstRelOrd::Lt, Loc::DUMMY)];
        let mut handler = Handler::new();
        let output = DependencyResolver::new().resolve(decls, &mut handler);
        // Declared explicitly below application; no duplicate default edge warning.
        assert!(!handler.has_fatal());
        assert!(handler.diagnostics().is_empty());
    }
}
