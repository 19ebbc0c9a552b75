//! Local and metavariable contexts.

use std::collections::BTreeMap;

use crate::{
    expr::{BinderInfo, Expr},
    level::Level,
    name::Name,
    variable::{FVarId, LMVarId, MVarId},
};

/// A hypothesis opened by a telescope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalDecl {
    pub fvar: FVarId,
    pub name: Name,
    pub info: BinderInfo,
    pub ty: Expr,
}

/// Every local introduced in an elaboration context. Locals are never removed;
/// closing a telescope abstracts them out of the result instead.
#[derive(Debug, Clone, Default)]
pub struct LocalContext {
    decls: BTreeMap<FVarId, LocalDecl>,
}

impl LocalContext {
    pub fn insert(&mut self, decl: LocalDecl) {
        self.decls.insert(decl.fvar, decl);
    }

    pub fn get(&self, id: FVarId) -> Option<&LocalDecl> {
        self.decls.get(&id)
    }

    pub fn len(&self) -> usize {
        self.decls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }
}

/// Declaration of an expression metavariable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MVarDecl {
    pub ty: Expr,
    /// Free variables with an id at or above this bound were created after the
    /// metavariable and may not occur in its assignment.
    pub scope: u64,
    pub assignment: Option<Expr>,
}

/// Metavariable declarations and assignments.
///
/// Cloned wholesale to save elaboration state; see `MetaCtx::save_state`.
#[derive(Debug, Clone, Default)]
pub struct MetavarContext {
    mvars: BTreeMap<MVarId, MVarDecl>,
    levels: BTreeMap<LMVarId, Option<Level>>,
}

impl MetavarContext {
    pub fn declare(&mut self, id: MVarId, ty: Expr, scope: u64) {
        self.mvars.insert(
            id,
            MVarDecl {
                ty,
                scope,
                assignment: None,
            },
        );
    }

    pub fn declare_level(&mut self, id: LMVarId) {
        self.levels.insert(id, None);
    }

    pub fn get(&self, id: MVarId) -> Option<&MVarDecl> {
        self.mvars.get(&id)
    }

    pub fn assignment(&self, id: MVarId) -> Option<&Expr> {
        self.mvars.get(&id).and_then(|d| d.assignment.as_ref())
    }

    pub fn assign(&mut self, id: MVarId, value: Expr) {
        if let Some(decl) = self.mvars.get_mut(&id) {
            debug_assert!(decl.assignment.is_none(), "metavariable {} assigned twice", id);
            decl.assignment = Some(value);
        }
    }

    pub fn level_assignment(&self, id: LMVarId) -> Option<Level> {
        self.levels.get(&id).cloned().flatten()
    }

    pub fn assign_level(&mut self, id: LMVarId, value: Level) {
        self.levels.insert(id, Some(value));
    }

    /// Replace assigned level metavariables in `l`, transitively.
    pub fn instantiate_level(&self, l: &Level) -> Level {
        if !l.has_mvar() {
            return l.clone();
        }
        l.replace(&mut |sub| match sub {
            Level::MVar(m) => self.level_assignment(*m).map(|v| self.instantiate_level(&v)),
            _ => None,
        })
    }
}
