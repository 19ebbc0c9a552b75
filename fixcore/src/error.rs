use fixformal::{error::MetaError, name::Name};
use thiserror::Error;

/// Failures of a derivation.
///
/// Three families matter to callers:
/// - applicability errors ([`DeriveError::NotAFixpoint`],
///   [`DeriveError::NotApplicable`], [`DeriveError::LatticeTheoretic`]) are
///   caused by the request itself;
/// - [`DeriveError::InvariantViolation`] means the compiled fixpoint does not
///   have the shape this crate relies on, which is a bug;
/// - [`DeriveError::Derivation`] wraps a term the elaborator rejected, also a
///   bug.
#[derive(Debug, Error)]
pub enum DeriveError {
    #[error("'{0}' is not defined by a fixpoint")]
    NotAFixpoint(Name),

    #[error("'{0}' is already registered as a fixpoint")]
    AlreadyRegistered(Name),

    #[error("cannot derive '{name}.{postfix}': {reason}")]
    NotApplicable {
        name: Name,
        postfix: String,
        reason: String,
    },

    #[error(
        "'{0}' is defined over a complete lattice; its approximation relation cannot be unfolded"
    )]
    LatticeTheoretic(Name),

    #[error("assertion violation: {message}\n  {term}\nplease report this issue")]
    InvariantViolation { message: String, term: String },

    #[error("cannot derive '{principle}': {source}\n(please report this issue)")]
    Derivation {
        principle: Name,
        #[source]
        source: MetaError,
    },

    #[error(transparent)]
    Meta(#[from] MetaError),

    #[error("failed to parse options file '{file}': {message}")]
    Config { file: String, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DeriveError {
    pub fn invariant(message: impl Into<String>, term: impl Into<String>) -> Self {
        DeriveError::InvariantViolation {
            message: message.into(),
            term: term.into(),
        }
    }

    /// Rewrap elaborator failures raised while building `principle`; every
    /// other error is returned unchanged.
    pub fn in_principle(self, principle: &Name) -> Self {
        match self {
            DeriveError::Meta(source) => DeriveError::Derivation {
                principle: principle.clone(),
                source,
            },
            other => other,
        }
    }
}

pub type DeriveResult<T> = Result<T, DeriveError>;
