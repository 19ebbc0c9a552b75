use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{
    error::{DeriveError, DeriveResult},
    magic::ENV_CONFIG_PATH,
};

/// Options controlling derivations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeriveOptions {
    /// Trace classes to record, e.g. `trace.fixpoint.induction`.
    pub trace: Vec<String>,
    /// Line width used when rendering terms in traces and diagnostics.
    pub pretty_width: usize,
    /// Re-check every emitted declaration with the kernel before adding it.
    pub check_declarations: bool,
}

impl Default for DeriveOptions {
    fn default() -> Self {
        Self {
            trace: Vec::new(),
            pretty_width: 100,
            check_declarations: true,
        }
    }
}

impl DeriveOptions {
    /// Options with the given trace classes enabled.
    pub fn with_trace<I, S>(classes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            trace: classes.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn is_traced(&self, class: &str) -> bool {
        self.trace.iter().any(|c| c == class)
    }

    /// Get the default path to the options file.
    pub fn default_path() -> PathBuf {
        // Check if the environment variable is set
        if let Ok(config_path) = std::env::var(ENV_CONFIG_PATH) {
            return config_path.into();
        }

        let mut path = PathBuf::new();

        #[cfg(target_os = "windows")]
        {
            if let Ok(appdata) = std::env::var("APPDATA") {
                path.push(appdata);
            }
        }
        #[cfg(not(target_os = "windows"))]
        {
            if let Ok(xdg_config_home) = std::env::var("XDG_CONFIG_HOME") {
                path.push(xdg_config_home);
            } else if let Ok(home) = std::env::var("HOME") {
                path.push(home);
                path.push(".config");
            }
        }

        path.push("fixcore");
        path.push("options.toml");
        path
    }

    /// Load options from a TOML file.
    pub fn load_from_toml(path: &Path) -> DeriveResult<Self> {
        let toml_str = std::fs::read_to_string(path)?;
        Self::from_toml_str(&toml_str).map_err(|e| match e {
            DeriveError::Config { message, .. } => DeriveError::Config {
                file: path.display().to_string(),
                message,
            },
            other => other,
        })
    }

    pub fn from_toml_str(toml_str: &str) -> DeriveResult<Self> {
        toml::from_str(toml_str).map_err(|e| DeriveError::Config {
            file: "<string>".to_string(),
            message: e.to_string(),
        })
    }

    /// Save options to a TOML file, creating parent directories as needed.
    pub fn save_to_toml(&self, path: &Path) -> DeriveResult<()> {
        let toml_str = toml::to_string(self).map_err(|e| DeriveError::Config {
            file: path.display().to_string(),
            message: e.to_string(),
        })?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, toml_str)?;
        Ok(())
    }
}
