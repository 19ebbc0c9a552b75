//! Identifiers for free variables and metavariables.
//!
//! Role
//! - `FVarId` names a local hypothesis introduced by a telescope.
//! - `MVarId` names an expression hole to be solved by unification.
//! - `LMVarId` names a universe level hole.
//!
//! All three are plain `u64` newtypes handed out by a monotonically increasing
//! counter, so comparing ids also compares creation order.

use std::fmt;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(u64);

        impl $name {
            /// Create from a raw numeric id.
            pub fn new_from_raw(id: u64) -> Self {
                Self(id)
            }

            /// Get the raw numeric id.
            pub fn raw(&self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }
    };
}

define_id!(
    /// Free variable (local hypothesis) identifier.
    FVarId,
    "_fvar."
);
define_id!(
    /// Expression metavariable identifier.
    MVarId,
    "?m."
);
define_id!(
    /// Universe level metavariable identifier.
    LMVarId,
    "?u."
);

/// Counter producing fresh identifiers of every kind.
#[derive(Debug, Clone, Default)]
pub struct IdGen {
    next: u64,
}

impl IdGen {
    fn bump(&mut self) -> u64 {
        let id = self.next;
        self.next += 1;
        id
    }

    pub fn fvar(&mut self) -> FVarId {
        FVarId(self.bump())
    }

    pub fn mvar(&mut self) -> MVarId {
        MVarId(self.bump())
    }

    pub fn level_mvar(&mut self) -> LMVarId {
        LMVarId(self.bump())
    }

    /// The id the next call will hand out. Every id created so far is below it.
    pub fn watermark(&self) -> u64 {
        self.next
    }
}
