use std::{
    env, fs,
    path::{Path, PathBuf},
};

use mindevc_utils::{
    hash::is_sha256_hex,
    path::{resolve_path, xdg_config_home},
};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::{
    error::{ConfigError, Result},
    tools::{default_install_tools, default_tools, ToolConfig, ToolRegistry},
};

/// Env var naming an explicit config file.
pub const CONFIG_ENV: &str = "MINDEVC_CONFIG";
pub const CACHE_DIR_ENV: &str = "MINDEVC_CACHE_DIR";
pub const INSTALL_TOOLS_ENV: &str = "MINDEVC_INSTALL_TOOLS";

pub const CONFIG_FILE_NAME: &str = "mindevc.toml";
pub const DEFAULT_CACHE_DIR: &str = "~/.cache/mindevc";
pub const DEFAULT_REMOTE_WORKDIR: &str = "/opt/mindevc";

/// Settings for the container the toolchain is installed into.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RemoteConfig {
    /// Root directory of the toolchain inside the container.
    /// Default: /opt/mindevc
    pub workdir: String,

    /// User that owns the toolchain inside the container.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            workdir: DEFAULT_REMOTE_WORKDIR.to_string(),
            user: None,
        }
    }
}

/// Application's configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// Directory holding downloads and extracted tools. `~` and `$VAR` are expanded.
    /// Default: ~/.cache/mindevc
    pub cache_dir: String,

    /// Tools installed by `mindevc tools` when none are named.
    pub install_tools: Vec<String>,

    pub remote: RemoteConfig,

    /// Tool registry. Entries here replace built-in entries with the same name.
    pub tools: ToolRegistry,

    /// File the configuration was read from, if any.
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

/// On-disk shape of the config file; every field is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    cache_dir: Option<String>,
    install_tools: Option<Vec<String>>,
    remote: Option<RemoteFile>,
    #[serde(default)]
    tools: ToolRegistry,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RemoteFile {
    workdir: Option<String>,
    user: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}

impl Config {
    /// The built-in configuration.
    pub fn default_config() -> Self {
        Self {
            cache_dir: DEFAULT_CACHE_DIR.to_string(),
            install_tools: default_install_tools(),
            remote: RemoteConfig::default(),
            tools: default_tools(),
            source: None,
        }
    }

    /// Loads the configuration.
    ///
    /// `explicit` (from `--config`) wins, then `$MINDEVC_CONFIG`, then the first existing file
    /// from [`config_candidates`]. Without any file the built-in defaults are used.
    /// Environment overrides are applied last and the result is validated.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let explicit = explicit
            .map(Path::to_path_buf)
            .or_else(|| env::var_os(CONFIG_ENV).map(PathBuf::from));

        let path = match explicit {
            Some(path) => Some(path),
            None => {
                let cwd = env::current_dir().map_err(|err| {
                    ConfigError::ReadFailed {
                        path: PathBuf::from("."),
                        source: err,
                    }
                })?;
                find_config_file(&cwd)
            }
        };

        let mut config = match path {
            Some(path) => Self::from_file(&path)?,
            None => {
                debug!("no config file found, using built-in defaults");
                Self::default_config()
            }
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Reads a config file and layers it over the built-in defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|err| {
            ConfigError::ReadFailed {
                path: path.to_path_buf(),
                source: err,
            }
        })?;

        let mut config = Self::from_toml_str(&content)?;
        config.source = Some(path.to_path_buf());
        debug!("loaded config from {}", path.display());
        Ok(config)
    }

    /// Parses TOML and layers it over the built-in defaults.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: ConfigFile = toml::from_str(content)?;
        let mut config = Self::default_config();
        config.merge(file);
        Ok(config)
    }

    fn merge(&mut self, file: ConfigFile) {
        if let Some(cache_dir) = file.cache_dir {
            self.cache_dir = cache_dir;
        }
        if let Some(install_tools) = file.install_tools {
            self.install_tools = install_tools;
        }
        if let Some(remote) = file.remote {
            if let Some(workdir) = remote.workdir {
                self.remote.workdir = workdir;
            }
            if remote.user.is_some() {
                self.remote.user = remote.user;
            }
        }
        for (name, tool) in file.tools {
            trace!("registry entry `{}` from config file", name);
            self.tools.insert(name, tool);
        }
    }

    /// Applies `MINDEVC_CACHE_DIR` and `MINDEVC_INSTALL_TOOLS`.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(cache_dir) = env::var(CACHE_DIR_ENV) {
            if !cache_dir.trim().is_empty() {
                self.cache_dir = cache_dir;
            }
        }
        if let Ok(tools) = env::var(INSTALL_TOOLS_ENV) {
            self.install_tools = tools
                .split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(String::from)
                .collect();
        }
    }

    /// Checks that every archive declares a SHA-256 hex digest.
    pub fn validate(&self) -> Result<()> {
        for (name, tool) in &self.tools {
            for (arch, spec) in &tool.archives {
                if !is_sha256_hex(&spec.hash) {
                    return Err(ConfigError::InvalidDigest {
                        tool: name.clone(),
                        arch: arch.to_string(),
                        digest: spec.hash.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Resolved cache directory.
    pub fn cache_dir(&self) -> Result<PathBuf> {
        Ok(resolve_path(&self.cache_dir)?)
    }

    pub fn tool(&self, name: &str) -> Option<&ToolConfig> {
        self.tools.get(name)
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

/// Config file locations searched when no explicit file is given, in priority order.
pub fn config_candidates(cwd: &Path) -> Vec<PathBuf> {
    vec![
        cwd.join(format!(".{CONFIG_FILE_NAME}")),
        cwd.join(".devcontainer").join(CONFIG_FILE_NAME),
        xdg_config_home().join(CONFIG_FILE_NAME),
    ]
}

/// First existing file from [`config_candidates`].
pub fn find_config_file(cwd: &Path) -> Option<PathBuf> {
    config_candidates(cwd).into_iter().find(|path| {
        let found = path.is_file();
        trace!("config candidate {}: {}", path.display(), found);
        found
    })
}
