use std::{env, path::PathBuf};

use nix::unistd::{getuid, User};

use crate::error::{PathError, PathResult};

pub trait PathResolver {
    /// Resolves a path string that may contain environment variables
    ///
    /// This method expands environment variables in the format `$VAR` or `${VAR}`, resolves tilde
    /// (`~`) to the user's home directory when it appears at the start of the path, and converts
    /// relative paths to absolute paths based on the current working directory.
    ///
    /// # Errors
    ///
    /// * [`PathError::Empty`] if the path is empty
    /// * [`PathError::CurrentDir`] if the current directory cannot be determined
    /// * [`PathError::MissingEnvVar`] if the environment variables are undefined
    ///
    /// # Example
    ///
    /// ```
    /// use mindevc_utils::error::PathResult;
    /// use mindevc_utils::path::{PathResolver, SystemPathResolver};
    ///
    /// fn main() -> PathResult<()> {
    ///     let resolver = SystemPathResolver;
    ///     let resolved = resolver.resolve_path("~/.cache/mindevc")?;
    ///     assert!(resolved.is_absolute());
    ///     Ok(())
    /// }
    /// ```
    fn resolve_path(&self, path: &str) -> PathResult<PathBuf>;

    /// Returns the user's home directory
    ///
    /// Checks `HOME` first and falls back to the home directory recorded in the user
    /// database for the current uid.
    fn home_dir(&self) -> PathBuf;

    /// Returns `XDG_CONFIG_HOME`, defaulting to `$HOME/.config`
    fn xdg_config_home(&self) -> PathBuf;

    /// Returns `XDG_CACHE_HOME`, defaulting to `$HOME/.cache`
    fn xdg_cache_home(&self) -> PathBuf;
}

/// The default [`PathResolver`] implementation using environment variables and filesystem calls.
pub struct SystemPathResolver;

impl PathResolver for SystemPathResolver {
    fn resolve_path(&self, path: &str) -> PathResult<PathBuf> {
        let path = path.trim();

        if path.is_empty() {
            return Err(PathError::Empty);
        }

        let resolved = self.expand_variables(path)?;
        let path_buf = PathBuf::from(resolved);

        if path_buf.is_absolute() {
            Ok(path_buf)
        } else {
            env::current_dir()
                .map(|cwd| cwd.join(path_buf))
                .map_err(|err| PathError::CurrentDir { source: err })
        }
    }

    fn home_dir(&self) -> PathBuf {
        env::var("HOME").map(PathBuf::from).unwrap_or_else(|_| {
            User::from_uid(getuid())
                .ok()
                .flatten()
                .map(|user| user.dir)
                .unwrap_or_else(|| PathBuf::from("/"))
        })
    }

    fn xdg_config_home(&self) -> PathBuf {
        env::var("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| self.home_dir().join(".config"))
    }

    fn xdg_cache_home(&self) -> PathBuf {
        env::var("XDG_CACHE_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| self.home_dir().join(".cache"))
    }
}

impl SystemPathResolver {
    fn expand_variables(&self, path: &str) -> PathResult<String> {
        let mut result = String::with_capacity(path.len());
        let mut chars = path.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '$' => {
                    if chars.peek() == Some(&'{') {
                        chars.next();
                        let var_name = self.consume_until(&mut chars, '}')?;
                        self.expand_env_var(&var_name, &mut result, path)?;
                    } else {
                        let var_name = self.consume_var_name(&mut chars);
                        if var_name.is_empty() {
                            result.push('$');
                        } else {
                            self.expand_env_var(&var_name, &mut result, path)?;
                        }
                    }
                }
                '~' if result.is_empty() => result.push_str(&self.home_dir().to_string_lossy()),
                _ => result.push(c),
            }
        }

        Ok(result)
    }

    fn consume_until(
        &self,
        chars: &mut std::iter::Peekable<std::str::Chars>,
        delimiter: char,
    ) -> PathResult<String> {
        let mut var_name = String::new();

        for c in chars.by_ref() {
            if c == delimiter {
                return Ok(var_name);
            }
            var_name.push(c);
        }

        Err(PathError::UnclosedVariable {
            input: format!("${{{var_name}"),
        })
    }

    fn consume_var_name(&self, chars: &mut std::iter::Peekable<std::str::Chars>) -> String {
        let mut var_name = String::new();

        while let Some(&c) = chars.peek() {
            if c.is_alphanumeric() || c == '_' {
                var_name.push(c);
                chars.next();
            } else {
                break;
            }
        }

        var_name
    }

    fn expand_env_var(&self, var_name: &str, result: &mut String, original: &str) -> PathResult<()> {
        match var_name {
            "HOME" => result.push_str(&self.home_dir().to_string_lossy()),
            "XDG_CONFIG_HOME" => result.push_str(&self.xdg_config_home().to_string_lossy()),
            "XDG_CACHE_HOME" => result.push_str(&self.xdg_cache_home().to_string_lossy()),
            _ => {
                let value = env::var(var_name).map_err(|_| {
                    PathError::MissingEnvVar {
                        input: original.into(),
                        var: var_name.into(),
                    }
                })?;
                result.push_str(&value);
            }
        }
        Ok(())
    }
}

/// Resolves a path string using the system path resolver.
///
/// See [`PathResolver::resolve_path`] for detailed documentation.
pub fn resolve_path(path: &str) -> PathResult<PathBuf> {
    SystemPathResolver.resolve_path(path)
}

/// Returns the user's home directory using the system path resolver.
pub fn home_dir() -> PathBuf {
    SystemPathResolver.home_dir()
}

/// Returns the user's config directory using the system path resolver.
pub fn xdg_config_home() -> PathBuf {
    SystemPathResolver.xdg_config_home()
}

/// Returns the user's cache directory using the system path resolver.
pub fn xdg_cache_home() -> PathBuf {
    SystemPathResolver.xdg_cache_home()
}

#[cfg(test)]
mod tests {
    use serial_test::serial;

    use super::*;

    fn with_vars<F: FnOnce()>(vars: &[(&str, &str)], f: F) {
        for (key, value) in vars {
            env::set_var(key, value);
        }
        f();
        for (key, _) in vars {
            env::remove_var(key);
        }
    }

    #[test]
    #[serial]
    fn test_expand_variables_simple() {
        with_vars(&[("MINDEVC_TEST_VAR", "test_value")], || {
            let result = SystemPathResolver
                .expand_variables("$MINDEVC_TEST_VAR/path")
                .unwrap();
            assert_eq!(result, "test_value/path");
        });
    }

    #[test]
    #[serial]
    fn test_expand_variables_braced() {
        with_vars(&[("MINDEVC_TEST_VAR", "braced")], || {
            let result = SystemPathResolver
                .expand_variables("/opt/${MINDEVC_TEST_VAR}_dir")
                .unwrap();
            assert_eq!(result, "/opt/braced_dir");
        });
    }

    #[test]
    #[serial]
    fn test_expand_variables_missing() {
        env::remove_var("MINDEVC_SURELY_UNSET");
        let err = SystemPathResolver
            .expand_variables("$MINDEVC_SURELY_UNSET/x")
            .unwrap_err();
        assert!(matches!(err, PathError::MissingEnvVar { ref var, .. } if var == "MINDEVC_SURELY_UNSET"));
    }

    #[test]
    fn test_expand_variables_unclosed() {
        let err = SystemPathResolver.expand_variables("${HOME").unwrap_err();
        assert!(matches!(err, PathError::UnclosedVariable { .. }));
    }

    #[test]
    fn test_lone_dollar_is_literal() {
        assert_eq!(SystemPathResolver.expand_variables("a$/b").unwrap(), "a$/b");
    }

    #[test]
    #[serial]
    fn test_resolve_tilde() {
        with_vars(&[("HOME", "/home/mindevc")], || {
            let resolved = resolve_path("~/.cache/mindevc").unwrap();
            assert_eq!(resolved, PathBuf::from("/home/mindevc/.cache/mindevc"));
        });
    }

    #[test]
    fn test_resolve_relative_is_absolute() {
        let resolved = resolve_path("relative/dir").unwrap();
        assert!(resolved.is_absolute());
        assert!(resolved.ends_with("relative/dir"));
    }

    #[test]
    fn test_resolve_empty() {
        assert!(matches!(resolve_path("   "), Err(PathError::Empty)));
    }

    #[test]
    #[serial]
    fn test_xdg_dirs_fall_back_to_home() {
        env::remove_var("XDG_CONFIG_HOME");
        env::remove_var("XDG_CACHE_HOME");
        with_vars(&[("HOME", "/home/mindevc")], || {
            assert_eq!(xdg_config_home(), PathBuf::from("/home/mindevc/.config"));
            assert_eq!(xdg_cache_home(), PathBuf::from("/home/mindevc/.cache"));
        });
    }
}
