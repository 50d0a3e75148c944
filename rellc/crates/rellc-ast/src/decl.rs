//! Declarations (spec §4.2, "Dependency Resolver") and fixity (spec §4.1,
//! "Precedence Poset").

use crate::expr::Expr;
use crate::name::Name;
use crate::types::Type;
use rellc_util::Loc;

/// Associativity of an infix operator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Assoc {
    Left,
    Right,
    None,
}

/// The ordering a fixity declaration asserts between two operator classes
/// (spec §4.1: `addRelation(left, right, ord)`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RelOrd {
    Lt,
    Eq,
    Gt,
}

/// An operator: `None` denotes function application, implicitly the
/// highest-priority "operator" (spec §3: `Op = Option<Name>`).
pub type Op = Option<Name>;

/// A declared relation between two operators, as written by the user
/// (`infix left (+) above application`, `(+) above (+)`, ...). Distinct
/// from [`RelOrd`], which is the direction fed to the poset once both
/// sides of the relation are known.
#[derive(Clone, Debug)]
pub struct FixityDecl {
    pub op: Op,
    pub assoc: Assoc,
    pub related_to: Op,
    pub ord: RelOrd,
    pub loc: Loc,
}

/// A top-level `name = expr` (or `name pat1 pat2 ... = expr`, desugared
/// into nested lambdas before reaching this data model) binding.
#[derive(Clone, Debug)]
pub struct ValueDecl {
    pub name: Name,
    pub value: Expr,
    pub loc: Loc,
}

/// One constructor of a `TypeDecl`: a name plus its declared argument
/// types (spec §4.2: "Dependencies run through constructor argument
/// types... at this stage kinds are trivial").
#[derive(Clone, Debug)]
pub struct ConstructorDef {
    pub name: Name,
    pub args: Vec<Type>,
    pub loc: Loc,
}

#[derive(Clone, Debug)]
pub struct TypeDecl {
    pub name: Name,
    pub constructors: Vec<ConstructorDef>,
    pub loc: Loc,
}

/// A user-supplied type signature `name : Type`, checked against the
/// matching `ValueDecl` once both are in the same declaration group.
#[derive(Clone, Debug)]
pub struct SignatureDecl {
    pub name: Name,
    pub signature: Type,
    pub loc: Loc,
}

#[derive(Clone, Debug)]
pub enum Decl {
    Fixity(FixityDecl),
    Value(ValueDecl),
    Type(TypeDecl),
    Signature(SignatureDecl),
}

impl Decl {
    pub fn loc(&self) -> Loc {
        match self {
            Decl::Fixity(d) => d.loc,
            Decl::Value(d) => d.loc,
            Decl::Type(d) => d.loc,
            Decl::Signature(d) => d.loc,
        }
    }

    /// Every name this declaration binds: one for a value binding, the
    /// type name plus every constructor for a type declaration, none for
    /// fixity/signature declarations (spec §4.2).
    pub fn bound_names(&self) -> Vec<Name> {
        match self {
            Decl::Fixity(_) => Vec::new(),
            Decl::Value(d) => vec![d.name],
            Decl::Type(d) => {
                let mut names = vec![d.name];
                names.extend(d.constructors.iter().map(|c| c.name));
                names
            }
            Decl::Signature(_) => Vec::new(),
        }
    }
}

/// A resolved fixity: the associativity and priority class membership of
/// a single operator, as stored in `Output.fixityMap` (spec §3).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Fixity {
    pub assoc: Assoc,
}
