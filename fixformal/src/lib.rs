//! Fixformal: a small dependently typed term language and the elaborator that
//! fixpoint proof synthesis is written against.
//!
//! Terms follow the usual locally nameless discipline: bound variables are de
//! Bruijn indices, free variables are opaque ids that live in a local context,
//! and holes are metavariables solved by unification.
//!
//! Role
//!  - [`env::Environment`] stores axioms, definitions and theorems.
//!  - [`meta::MetaCtx`] opens and closes telescopes, infers types, decides
//!    definitional equality and elaborates applications with omitted
//!    arguments.
//!  - [`builtins`] declares the prelude every derivation relies on (`PProd`,
//!    `And`, `Or`, `Eq`, `Option`, `id`).
//!
//! Performance
//!  - Expressions are immutable trees of `Arc` nodes; cloning is cheap and
//!    rewriting shares unchanged subtrees.
//!  - Universe arguments are stored inline (`smallvec`) since constants rarely
//!    carry more than two.
//!
//! Example
//! ```
//! use fixformal::prelude::*;
//!
//! let env = Environment::new();
//! install_builtins(&env).unwrap();
//!
//! let mut ctx = MetaCtx::new(env);
//! let p = ctx.mk_local_decl("p", BinderInfo::Default, Expr::prop());
//! let q = ctx.mk_local_decl("q", BinderInfo::Default, Expr::prop());
//! let p_and_q = ctx.mk_and(&p, &q);
//! let h = ctx.mk_local_decl("h", BinderInfo::Default, p_and_q);
//!
//! let left = ctx.mk_and_left(&h).unwrap();
//! let ty = ctx.infer_type(&left).unwrap();
//! assert!(ctx.is_def_eq(&ty, &p).unwrap());
//! ```

/// Builtin prelude and term builders for it.
pub mod builtins;
/// Global declarations.
pub mod env;
/// Errors raised by the environment and the elaborator.
pub mod error;
/// Expressions, binders and pretty-printing.
pub mod expr;
/// Universe levels.
pub mod level;
/// Local and metavariable contexts.
pub mod local;
/// The elaboration context.
pub mod meta;
/// Hierarchical names.
pub mod name;
/// Free variable and metavariable identifiers.
pub mod variable;

pub mod prelude {
    //! Convenient re-exports for end users.
    //!
    //! - Terms, levels and names
    //! - The environment and the elaboration context
    //! - Pretty-printing via `PrettyExpr`
    pub use crate::builtins::{install_builtins, names};
    pub use crate::env::{ConstantInfo, ConstantKind, Environment};
    pub use crate::error::{MetaError, MetaResult};
    pub use crate::expr::{BinderInfo, Expr, LevelVec, pretty::PrettyExpr};
    pub use crate::level::Level;
    pub use crate::meta::MetaCtx;
    pub use crate::name::Name;
    pub use crate::variable::{FVarId, MVarId};
}
