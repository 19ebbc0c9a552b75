use thiserror::Error;

use crate::{name::Name, variable::FVarId};

/// Failures reported by the environment and the elaborator.
///
/// Terms are stored already rendered so that errors stay `Send` and outlive
/// the context that produced them.
#[derive(Debug, Error)]
pub enum MetaError {
    #[error("unknown constant '{0}'")]
    UnknownConstant(Name),

    #[error("unknown free variable '{0}'")]
    UnknownFVar(FVarId),

    #[error("'{0}' has already been declared")]
    AlreadyDeclared(Name),

    #[error("constant '{name}' expects {expected} universe arguments, got {found}")]
    LevelArity {
        name: Name,
        expected: usize,
        found: usize,
    },

    #[error("loose bound variable #{0} encountered")]
    LooseBVar(u32),

    #[error("function expected, got\n  {term}\nof type\n  {ty}")]
    FunctionExpected { term: String, ty: String },

    #[error("type expected, got\n  {term}")]
    TypeExpected { term: String },

    #[error(
        "application type mismatch in\n  {app}\nargument\n  {arg}\nhas type\n  {arg_ty}\nbut is expected to have type\n  {expected}"
    )]
    AppTypeMismatch {
        app: String,
        arg: String,
        arg_ty: String,
        expected: String,
    },

    #[error("declaration '{name}' has type\n  {expected}\nbut its value has type\n  {found}")]
    DeclTypeMismatch {
        name: Name,
        expected: String,
        found: String,
    },

    #[error("declaration '{name}' contains unassigned metavariables:\n  {term}")]
    UnassignedMVars { name: Name, term: String },

    #[error("declaration '{name}' mentions free variables:\n  {term}")]
    FreeVariables { name: Name, term: String },

    #[error("declaration '{name}' uses undeclared universe parameter '{param}'")]
    UndeclaredLevelParam { name: Name, param: Name },

    #[error("failed to elaborate '{name}': could not synthesize argument #{index}")]
    AppElabFailed { name: Name, index: usize },

    #[error("'{term}' has type\n  {ty}\nwhich is not an application of '{expected}'")]
    StructureExpected {
        expected: Name,
        term: String,
        ty: String,
    },

    #[error("failed to elaborate '{name}': too many arguments")]
    AppTooManyArgs { name: Name },
}

pub type MetaResult<T> = Result<T, MetaError>;
