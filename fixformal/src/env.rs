//! Append-only store of global declarations.
//!
//! Role
//! - Holds axioms, definitions and theorems by name.
//! - Shared by every elaboration context through a cheap-to-clone handle; the
//!   map is guarded by a `parking_lot::RwLock` and entries are never mutated or
//!   removed once inserted.
//!
//! Definitions are unfolded by `whnf`; theorems and axioms never are.

use std::{collections::BTreeMap, sync::Arc};

use parking_lot::RwLock;
use strum::EnumIs;

use crate::{
    error::{MetaError, MetaResult},
    expr::Expr,
    level::Level,
    name::Name,
};

#[derive(Debug, Clone, PartialEq, Eq, EnumIs)]
pub enum ConstantKind {
    Axiom,
    /// Delta-reducible definition. `height` orders unfolding in lazy delta
    /// reduction: a definition is higher than every definition its value uses.
    Definition { value: Expr, height: u32 },
    Theorem { value: Expr },
}

/// A declaration as stored in the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstantInfo {
    pub name: Name,
    pub level_params: Vec<Name>,
    pub ty: Expr,
    pub kind: ConstantKind,
}

impl ConstantInfo {
    pub fn axiom(name: impl Into<Name>, level_params: Vec<Name>, ty: Expr) -> Self {
        Self {
            name: name.into(),
            level_params,
            ty,
            kind: ConstantKind::Axiom,
        }
    }

    /// A definition; the height is computed when it is added to an environment.
    pub fn definition(name: impl Into<Name>, level_params: Vec<Name>, ty: Expr, value: Expr) -> Self {
        Self {
            name: name.into(),
            level_params,
            ty,
            kind: ConstantKind::Definition { value, height: 0 },
        }
    }

    pub fn theorem(name: impl Into<Name>, level_params: Vec<Name>, ty: Expr, value: Expr) -> Self {
        Self {
            name: name.into(),
            level_params,
            ty,
            kind: ConstantKind::Theorem { value },
        }
    }

    pub fn value(&self) -> Option<&Expr> {
        match &self.kind {
            ConstantKind::Axiom => None,
            ConstantKind::Definition { value, .. } | ConstantKind::Theorem { value } => Some(value),
        }
    }

    /// Unfolding height, `None` for non-definitions.
    pub fn height(&self) -> Option<u32> {
        match &self.kind {
            ConstantKind::Definition { height, .. } => Some(*height),
            _ => None,
        }
    }

    /// Type instantiated at the given universe arguments.
    pub fn instantiate_type(&self, levels: &[Level]) -> MetaResult<Expr> {
        self.check_level_arity(levels)?;
        Ok(self.ty.instantiate_level_params(&self.level_params, levels))
    }

    /// Value instantiated at the given universe arguments.
    pub fn instantiate_value(&self, levels: &[Level]) -> MetaResult<Option<Expr>> {
        self.check_level_arity(levels)?;
        Ok(self
            .value()
            .map(|v| v.instantiate_level_params(&self.level_params, levels)))
    }

    fn check_level_arity(&self, levels: &[Level]) -> MetaResult<()> {
        if levels.len() != self.level_params.len() {
            return Err(MetaError::LevelArity {
                name: self.name.clone(),
                expected: self.level_params.len(),
                found: levels.len(),
            });
        }
        Ok(())
    }
}

/// Shared handle on the declaration store.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    decls: Arc<RwLock<BTreeMap<Name, Arc<ConstantInfo>>>>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn find(&self, name: &Name) -> Option<Arc<ConstantInfo>> {
        self.decls.read().get(name).cloned()
    }

    pub fn get(&self, name: &Name) -> MetaResult<Arc<ConstantInfo>> {
        self.find(name)
            .ok_or_else(|| MetaError::UnknownConstant(name.clone()))
    }

    pub fn contains(&self, name: &Name) -> bool {
        self.decls.read().contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.decls.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.decls.read().is_empty()
    }

    /// Insert a declaration without checking it.
    ///
    /// Definitions get their unfolding height assigned here. Callers that need
    /// the value checked go through `MetaCtx::add_decl`.
    pub fn insert_unchecked(&self, mut info: ConstantInfo) -> MetaResult<Arc<ConstantInfo>> {
        if let ConstantKind::Definition { value, height } = &mut info.kind {
            *height = self.definition_height(value);
        }

        let mut decls = self.decls.write();
        if decls.contains_key(&info.name) {
            return Err(MetaError::AlreadyDeclared(info.name));
        }
        let info = Arc::new(info);
        decls.insert(info.name.clone(), info.clone());
        log::trace!("declared '{}'", info.name);
        Ok(info)
    }

    fn definition_height(&self, value: &Expr) -> u32 {
        let decls = self.decls.read();
        let mut height = 0;
        value.find(&mut |e| {
            if let Expr::Const(n, _) = e {
                if let Some(h) = decls.get(n).and_then(|c| c.height()) {
                    height = height.max(h + 1);
                }
            }
            false
        });
        height
    }

    /// Names of every declaration, in lexicographic order.
    pub fn names(&self) -> Vec<Name> {
        self.decls.read().keys().cloned().collect()
    }
}
