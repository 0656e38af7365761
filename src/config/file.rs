//! The node config file: a flat `KEY=VALUE` file that must stay valid Bash.
//!
//! Every registered option is written in registry order under a comment
//! naming it. Options at their default are written commented out, so the
//! file doubles as documentation of what can be set. Keys this program
//! does not know are carried over verbatim.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::ConfigError;
use super::defaults::ALWAYS_WRITE;
use crate::options::{Env, OptionRegistry, assign};
use crate::time::{Clock, iso_timestamp};

/// Parses `KEY=VALUE` lines.
///
/// Blank lines, `#` comments and lines without `=` are skipped. Keys and
/// values are trimmed; a repeated key keeps its first position and last
/// value.
#[must_use]
pub fn parse(content: &str) -> Vec<(String, String)> {
    let mut entries: Vec<(String, String)> = Vec::new();
    for line in content.lines().map(str::trim) {
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let (key, value) = (key.trim(), value.trim());
        match entries.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value.to_string(),
            None => entries.push((key.to_string(), value.to_string())),
        }
    }
    entries
}

/// An existing or future config file.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    path: PathBuf,
    current: Vec<(String, String)>,
    extras: Vec<(String, String)>,
}

impl ConfigFile {
    /// A config file at `path` with nothing loaded.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            current: Vec::new(),
            extras: Vec::new(),
        }
    }

    /// Reads the file at `path`. A missing file loads as empty.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::FileRead`] if the file exists but cannot be
    /// read.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let mut file = Self::new(path);
        match std::fs::read_to_string(&file.path) {
            Ok(content) => {
                file.current = parse(&content);
                tracing::debug!(
                    "Loaded {} values from {}",
                    file.current.len(),
                    file.path.display()
                );
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!("No config file at {}", file.path.display());
            }
            Err(source) => {
                return Err(ConfigError::FileRead {
                    path: file.path,
                    source,
                });
            }
        }
        Ok(file)
    }

    /// Location of the file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Entries read from disk, in file order.
    #[must_use]
    pub fn current(&self) -> &[(String, String)] {
        &self.current
    }

    /// Value read for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.current
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Entries no registered option claims, kept for rewriting.
    #[must_use]
    pub fn extras(&self) -> &[(String, String)] {
        &self.extras
    }

    /// Assigns every loaded value to its option; unknown keys become
    /// extras.
    pub fn apply(&mut self, registry: &mut OptionRegistry, env: &mut Env<'_>) {
        self.extras.clear();
        for (key, value) in &self.current {
            match registry.get_mut(key) {
                Some(option) => assign(option, value, env),
                None => {
                    tracing::debug!("Keeping unknown config variable {key}");
                    self.extras.push((key.clone(), value.clone()));
                }
            }
        }
    }

    /// File content for the options in `registry`.
    #[must_use]
    pub fn render(&self, registry: &OptionRegistry, forced: bool, generated_at: &str) -> String {
        let refs = registry.references();
        let mut out = String::from(
            "# DBNode config file\n\
             # File must be valid Bash with comment, blank lines and variable definitions only.\n\n",
        );
        out.push_str(&format!("# Config File Generated at: {generated_at}\n"));
        if forced {
            out.push_str("# This file generated with --force\n");
        }
        for option in registry.iter() {
            let meta = option.meta();
            let commented =
                option.is_default() && !ALWAYS_WRITE.contains(&meta.variable_name.as_str());
            out.push_str(&format!("# {}:\n", meta.long_description));
            out.push_str(&format!(
                "{}{}={}\n",
                if commented { "#" } else { "" },
                meta.variable_name,
                option.config_string(&refs)
            ));
        }
        if !self.extras.is_empty() {
            out.push_str("# Extra Config Variables:\n");
            for (key, value) in &self.extras {
                out.push_str(&format!("{key}={value}\n"));
            }
        }
        out
    }

    /// Writes the file atomically, creating its directory if needed.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::FileWrite`] on any I/O failure.
    pub fn write(
        &self,
        registry: &OptionRegistry,
        forced: bool,
        clock: &dyn Clock,
    ) -> Result<(), ConfigError> {
        let content = self.render(registry, forced, &iso_timestamp(clock));
        let write_error = |source| ConfigError::FileWrite {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(write_error)?;
            }
        }

        // dbnode.conf -> dbnode.conf.tmp
        let temp_path = PathBuf::from(format!("{}.tmp", self.path.display()));
        std::fs::write(&temp_path, content).map_err(write_error)?;
        std::fs::rename(&temp_path, &self.path).map_err(write_error)?;

        tracing::info!("Config written to {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
#[path = "file_tests.rs"]
mod tests;
