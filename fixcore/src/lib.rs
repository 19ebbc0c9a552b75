//! Induction and partial-correctness principles for functions compiled as
//! fixpoints over chain-complete partial orders.
//!
//! A group of co-defined functions is compiled into a single `fix` application
//! over the product of their orders and recorded in a [`registry::FixpointRegistry`].
//! From that record the crate derives, on demand, the theorems
//! `<f>.induct`, `<f>.coinduct`, `<f>.mutual_induct`, `<f>.fixpoint_induct`
//! and `<f>.partial_correctness`, and adds them to the environment.
//! Most consumers will only interact with [`realize::Realizer`].
//!
//! Example
//! ```
//! use std::sync::Arc;
//! use fixcore::prelude::*;
//!
//! let env = Environment::new();
//! install_builtins(&env).unwrap();
//! install_order_library(&env).unwrap();
//!
//! let registry = Arc::new(FixpointRegistry::new());
//! let realizer = Realizer::new(env, registry, DeriveOptions::default());
//! // Nothing is registered, so nothing is reserved.
//! let name = Name::new("f.induct");
//! assert!(!realizer.is_reserved(&name));
//! assert!(realizer.realize(&name).unwrap().is_none());
//! ```

pub mod admissible;
pub mod config;
pub mod error;
pub mod group;
pub mod induction;
pub mod magic;
pub mod order;
pub mod partial_correctness;
pub mod pprod;
pub mod realize;
pub mod registry;
pub mod shape;
#[cfg(any(test, feature = "test-utils"))]
pub mod tests_utils;
pub mod trace;
pub mod unfold;

pub extern crate chrono;

pub mod prelude {
    //! Convenient re-exports for end users.
    pub use crate::config::DeriveOptions;
    pub use crate::error::{DeriveError, DeriveResult};
    pub use crate::order::install_order_library;
    pub use crate::realize::{DerivationStrategy, Realizer};
    pub use crate::registry::{FixedParamPerm, FixpointInfo, FixpointRegistry, OrderKind};
    pub use fixformal::prelude::*;
}
