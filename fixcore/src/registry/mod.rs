//! Metadata recorded when a group of functions is compiled into a fixpoint.
//!
//! The registry is written once per compiled group and only read afterwards:
//! derivations look a function up by name and never modify its entry.

mod fixed_params;

use std::{collections::BTreeMap, sync::Arc};

use fixformal::name::Name;
use parking_lot::RwLock;
use strum::{Display, EnumIs};

use crate::{
    error::{DeriveError, DeriveResult},
    magic::{POSTFIX_COINDUCT, POSTFIX_FIXPOINT_INDUCT, POSTFIX_INDUCT},
};

pub use fixed_params::FixedParamPerm;

/// How the order of a group member's codomain was chosen when compiling it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIs)]
pub enum OrderKind {
    /// Least fixpoint of a flat order, read upwards from `none`.
    #[strum(serialize = "inductive")]
    Inductive,
    /// Greatest fixpoint, read downwards.
    #[strum(serialize = "coinductive")]
    Coinductive,
    /// Fixpoint over an arbitrary complete lattice.
    #[strum(serialize = "lattice-theoretic")]
    LatticeTheoretic,
}

impl OrderKind {
    /// Postfix of the single-function principle derived for this kind.
    pub fn postfix(self) -> &'static str {
        match self {
            OrderKind::Inductive => POSTFIX_INDUCT,
            OrderKind::Coinductive => POSTFIX_COINDUCT,
            OrderKind::LatticeTheoretic => POSTFIX_FIXPOINT_INDUCT,
        }
    }
}

/// Registry entry of a group of co-defined functions, members in registration
/// order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixpointInfo {
    pub decl_names: Vec<Name>,
    pub fixed_param_perms: Vec<FixedParamPerm>,
    pub kinds: Vec<OrderKind>,
    /// One unfolding equation per member.
    pub eqn_lemmas: Vec<Name>,
}

impl FixpointInfo {
    pub fn len(&self) -> usize {
        self.decl_names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decl_names.is_empty()
    }

    pub fn is_mutual(&self) -> bool {
        self.len() > 1
    }

    pub fn member_index(&self, name: &Name) -> Option<usize> {
        self.decl_names.iter().position(|n| n == name)
    }

    /// Index of the first lattice-theoretic member.
    pub fn lattice_member(&self) -> Option<usize> {
        self.kinds.iter().position(|k| k.is_lattice_theoretic())
    }

    fn validate(&self) -> DeriveResult<()> {
        let n = self.len();
        if n == 0
            || self.fixed_param_perms.len() != n
            || self.kinds.len() != n
            || self.eqn_lemmas.len() != n
        {
            return Err(DeriveError::invariant(
                "malformed fixpoint group",
                format!("{:?}", self.decl_names),
            ));
        }
        let fixed = self.fixed_param_perms[0].num_fixed();
        if let Some(i) = self
            .fixed_param_perms
            .iter()
            .position(|p| p.num_fixed() != fixed)
        {
            return Err(DeriveError::invariant(
                "group members disagree on the number of fixed parameters",
                self.decl_names[i].to_string(),
            ));
        }
        Ok(())
    }
}

/// Append-only map from every member name to its group.
#[derive(Debug, Default)]
pub struct FixpointRegistry {
    entries: RwLock<BTreeMap<Name, Arc<FixpointInfo>>>,
}

impl FixpointRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a compiled group under each of its member names.
    ///
    /// Fails without inserting anything if one of the names is already taken.
    pub fn register(&self, info: FixpointInfo) -> DeriveResult<Arc<FixpointInfo>> {
        info.validate()?;
        let mut entries = self.entries.write();
        if let Some(taken) = info.decl_names.iter().find(|n| entries.contains_key(*n)) {
            return Err(DeriveError::AlreadyRegistered(taken.clone()));
        }
        let info = Arc::new(info);
        for name in &info.decl_names {
            entries.insert(name.clone(), info.clone());
        }
        log::debug!(
            "registered fixpoint group [{}]",
            info.decl_names
                .iter()
                .map(Name::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        );
        Ok(info)
    }

    /// `None` when `name` was not compiled as a fixpoint.
    pub fn lookup(&self, name: &Name) -> Option<Arc<FixpointInfo>> {
        self.entries.read().get(name).cloned()
    }

    pub fn contains(&self, name: &Name) -> bool {
        self.entries.read().contains_key(name)
    }
}
