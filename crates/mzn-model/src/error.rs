use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T, E = ModelError> = std::result::Result<T, E>;

/// Failures that stop model construction.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("failed to parse {source_name}: {message}")]
    Parse {
        source_name: String,
        message: String,
    },

    #[error("model has more than one solve item: `{first}` and `{second}`")]
    DuplicateSolve { first: String, second: String },

    #[error("`{name}` is already declared as a type or enum")]
    DuplicateType { name: String },

    #[error("`{name}` is declared more than once")]
    Redeclared { name: String },

    #[error("`{name}` is redeclared returning `{found}`, previously `{expected}`")]
    ConflictingTypes {
        name: String,
        expected: String,
        found: String,
    },

    #[error("reassigned variable `{name}`")]
    Reassigned { name: String },

    #[error("recursive include of {}: {chain}", path.display())]
    RecursiveInclude { path: PathBuf, chain: String },

    #[error("could not complete the declaration of `{name}`: {message}")]
    Completion { name: String, message: String },

    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Problems that are recorded but do not stop model construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelWarning {
    /// No candidate file exists for an include. The item is kept and
    /// written out unchanged.
    UnresolvedInclude { path: String },
}

impl fmt::Display for ModelWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelWarning::UnresolvedInclude { path } => {
                write!(f, "include \"{path}\" not found; passing it through")
            }
        }
    }
}
