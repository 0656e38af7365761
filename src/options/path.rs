//! Filesystem path options with `$VARIABLE` references.
//!
//! A path value may refer to other path options by variable name, e.g.
//! `$DATA_PATH/log`. References are expanded at check time from the
//! registry's [`References`] snapshot, so the stored value keeps tracking
//! the option it points at.

use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use super::{ConfigOption, Env, OptionMeta, References, Status, ValueError, Verdict};

#[cfg(test)]
#[path = "path_tests.rs"]
mod tests;

/// Deepest reference chain followed before giving up.
pub const MAX_REFERENCE_DEPTH: usize = 8;

static VARIABLE: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"\$([a-zA-Z_][a-zA-Z0-9_]*)"));

/// Error expanding `$VARIABLE` references.
#[derive(Debug, Clone, Error)]
pub enum PathError {
    /// The reference leads back to itself or nests too deeply.
    #[error("Circular variable reference to ${variable} found in ${within}")]
    Circular {
        /// Variable that closed the cycle
        variable: String,
        /// Option whose value holds the reference
        within: String,
    },

    /// The reference names no path option.
    #[error("Reference to ${variable} in ${within} cannot be resolved")]
    Unresolved {
        /// Unknown variable
        variable: String,
        /// Option whose value holds the reference
        within: String,
    },

    /// The reference pattern failed to compile.
    #[error("Invalid variable pattern: {0}")]
    Pattern(#[from] regex::Error),
}

fn variable_pattern() -> Result<&'static Regex, PathError> {
    VARIABLE.as_ref().map_err(|e| PathError::Pattern(e.clone()))
}

/// Expands every `$VARIABLE` in `raw`, the value of option `within`.
///
/// Fails closed: a cycle, an unknown name, or a chain deeper than
/// [`MAX_REFERENCE_DEPTH`] is an error, never a partial expansion.
///
/// # Errors
///
/// Returns [`PathError::Circular`] or [`PathError::Unresolved`].
pub fn resolve_path(raw: &str, within: &str, refs: &References) -> Result<String, PathError> {
    let mut chain = vec![within.to_string()];
    expand(raw, within, refs, &mut chain)
}

fn expand(
    raw: &str,
    within: &str,
    refs: &References,
    chain: &mut Vec<String>,
) -> Result<String, PathError> {
    let pattern = variable_pattern()?;
    let mut expanded = String::with_capacity(raw.len());
    let mut last = 0;
    for captures in pattern.captures_iter(raw) {
        let (Some(whole), Some(name)) = (captures.get(0), captures.get(1)) else {
            continue;
        };
        let name = name.as_str();
        if chain.iter().any(|seen| seen == name) || chain.len() > MAX_REFERENCE_DEPTH {
            return Err(PathError::Circular {
                variable: name.to_string(),
                within: within.to_string(),
            });
        }
        let target = refs.path(name).ok_or_else(|| PathError::Unresolved {
            variable: name.to_string(),
            within: within.to_string(),
        })?;

        expanded.push_str(&raw[last..whole.start()]);
        chain.push(name.to_string());
        expanded.push_str(&expand(target, name, refs, chain)?);
        chain.pop();
        last = whole.end();
    }
    expanded.push_str(&raw[last..]);
    Ok(expanded)
}

/// Variable names referenced directly by `raw`.
fn referenced_variables(raw: &str) -> Vec<String> {
    variable_pattern().map_or_else(
        |_| Vec::new(),
        |pattern| {
            pattern
                .captures_iter(raw)
                .filter_map(|c| c.get(1).map(|m| m.as_str().to_string()))
                .collect()
        },
    )
}

/// Expands `~` and makes `raw` absolute, lexically.
///
/// Values that start with a reference are returned untouched.
fn absolutize(raw: &str) -> Result<String, ValueError> {
    if raw.starts_with('$') {
        return Ok(raw.to_string());
    }
    let expanded = match raw.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => {
            let home = dirs::home_dir()
                .ok_or_else(|| ValueError::invalid(raw, "path (no home directory)"))?;
            home.join(rest.trim_start_matches('/'))
        }
        _ => PathBuf::from(raw),
    };
    let absolute = if expanded.is_absolute() {
        expanded
    } else {
        std::env::current_dir()
            .map_err(|_| ValueError::invalid(raw, "path (no working directory)"))?
            .join(expanded)
    };
    Ok(normalize(&absolute).to_string_lossy().into_owned())
}

fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}

/// Whether a path option names a directory or a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind {
    /// The path itself is a directory.
    Directory,
    /// The path is a file; its parent directory must exist.
    File,
}

/// Optional filesystem requirements.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathRequirements {
    /// Free space wanted on the containing filesystem, in GiB.
    pub min_free_gib: Option<u64>,
    /// Recommended filesystem types; empty means any.
    pub valid_fs: Vec<String>,
}

/// A directory or file path.
#[derive(Debug, Clone)]
pub struct PathOption {
    meta: OptionMeta,
    status: Status,
    kind: PathKind,
    requirements: PathRequirements,
    default: String,
    value: String,
    created_dir: bool,
}

impl PathOption {
    /// Creates the option at `default`. Directory options get a "Path"
    /// description suffix.
    #[must_use]
    pub fn new(
        mut meta: OptionMeta,
        kind: PathKind,
        default: &str,
        requirements: PathRequirements,
    ) -> Self {
        if kind == PathKind::Directory {
            meta.suffix("Path");
        }
        Self {
            meta,
            status: Status::default(),
            kind,
            requirements,
            default: default.to_string(),
            value: default.to_string(),
            created_dir: false,
        }
    }

    /// Stored value, references unexpanded.
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.value
    }

    /// Fully expanded path.
    ///
    /// # Errors
    ///
    /// Returns [`PathError`] for cyclic or unknown references.
    pub fn resolved(&self, refs: &References) -> Result<PathBuf, PathError> {
        resolve_path(&self.value, &self.meta.variable_name, refs).map(PathBuf::from)
    }

    /// Directory that must exist: the path itself, or a file's parent.
    fn directory_of(&self, path: &Path) -> PathBuf {
        match self.kind {
            PathKind::Directory => path.to_path_buf(),
            PathKind::File => path.parent().map_or_else(|| PathBuf::from("/"), Path::to_path_buf),
        }
    }

    fn ask_to_mkdir(&mut self, dir: &Path, env: &mut Env<'_>, refs: &References) -> Verdict {
        let inherited = referenced_variables(&self.value)
            .iter()
            .any(|variable| refs.created_dir(variable));
        let approved = inherited
            || env.mode.yes
            || confirm(
                env,
                &format!(
                    "{}: {} not found, attempt to create?",
                    self.meta.long_description,
                    dir.display()
                ),
                true,
            );
        if !approved {
            return Verdict::reject(format!(
                "{}: {} does not exist. Please choose another path.",
                self.meta.long_description,
                dir.display()
            ));
        }

        tracing::info!("Creating directory: {}", dir.display());
        match fs::create_dir_all(dir) {
            Ok(()) => {
                self.created_dir = true;
                Verdict::Accepted
            }
            Err(e) => Verdict::reject(format!("Unable to create {}: {e}", dir.display())),
        }
    }

    fn check_existing(&self, path: &Path, env: &mut Env<'_>) -> Verdict {
        let Ok(metadata) = fs::symlink_metadata(path) else {
            return Verdict::Accepted;
        };
        if metadata.file_type().is_symlink() {
            return Verdict::Accepted;
        }
        match self.kind {
            PathKind::File if metadata.is_dir() => Verdict::reject(format!(
                "Found a directory at {} instead of a file as expected. \
                 Please choose another path.",
                path.display()
            )),
            PathKind::File => {
                let overwrite = env.mode.yes
                    || confirm(
                        env,
                        &format!("File exists at {} - overwrite?", path.display()),
                        false,
                    );
                if overwrite {
                    Verdict::Accepted
                } else {
                    Verdict::reject(format!("Keeping existing file at {}", path.display()))
                }
            }
            PathKind::Directory if !metadata.is_dir() => Verdict::reject(format!(
                "Found a file at {} instead of a directory as expected. \
                 Please choose another path.",
                path.display()
            )),
            PathKind::Directory => Verdict::Accepted,
        }
    }

    fn check_free_space(&self, path: &Path, dir: &Path, env: &Env<'_>) -> Verdict {
        let Some(min_gib) = self.requirements.min_free_gib else {
            return Verdict::Accepted;
        };
        let available = match env.disks.available_bytes(dir) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!("Unable to measure free space on {}: {e}", dir.display());
                return Verdict::Accepted;
            }
        };
        if available >= min_gib << 30 {
            return Verdict::Accepted;
        }
        if env.mode.force {
            #[allow(clippy::cast_precision_loss)]
            let free_gib = available as f64 / f64::from(1u32 << 30);
            tracing::warn!(
                "Insufficient free space ({free_gib:.1} GiB) on {}. \
                 Database operations will be limited. Recommend {min_gib} GiB or more.",
                path.display()
            );
            return Verdict::Accepted;
        }
        Verdict::reject(format!(
            "Insufficient free space on {} - Expected at least {min_gib} GiB. \
             Choose a new path for {} or re-run with --force to skip this check.",
            path.display(),
            self.meta.description
        ))
    }

    fn check_fs_type(&self, path: &Path, dir: &Path, env: &mut Env<'_>) -> Verdict {
        let valid = &self.requirements.valid_fs;
        if valid.is_empty() {
            return Verdict::Accepted;
        }
        let fs_type = env.disks.fs_type(dir).unwrap_or_else(|e| {
            tracing::debug!("Filesystem type lookup failed for {}: {e}", dir.display());
            None
        });
        if fs_type.as_ref().is_some_and(|t| valid.contains(t)) {
            return Verdict::Accepted;
        }

        let shown = fs_type.as_deref().unwrap_or("unknown");
        tracing::warn!(
            "Filesystem type `{shown}` on {} is not recommended for {}. Recommend {}.",
            path.display(),
            self.meta.description,
            valid.join(" or ")
        );
        if env.mode.wizard && !env.mode.force {
            let accept = confirm(
                env,
                "Accept current settings? Enter 'No' to choose another path.",
                false,
            );
            if !accept {
                return Verdict::reject(format!(
                    "Filesystem type `{shown}` on {} was not accepted",
                    path.display()
                ));
            }
        }
        Verdict::Accepted
    }
}

/// Asks a yes/no question; unreadable input counts as "no".
fn confirm(env: &mut Env<'_>, question: &str, default: bool) -> bool {
    env.prompter.confirm(question, default).unwrap_or_else(|e| {
        tracing::debug!("No answer to '{question}': {e}");
        false
    })
}

impl ConfigOption for PathOption {
    fn meta(&self) -> &OptionMeta {
        &self.meta
    }

    fn status(&self) -> &Status {
        &self.status
    }

    fn status_mut(&mut self) -> &mut Status {
        &mut self.status
    }

    fn set_value(&mut self, raw: &str, _env: &mut Env<'_>) -> Result<(), ValueError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(ValueError::invalid(raw, "path"));
        }
        self.value = absolutize(raw)?;
        self.status.mark_set();
        Ok(())
    }

    fn reset_to_default(&mut self) {
        self.value.clone_from(&self.default);
    }

    fn is_default(&self) -> bool {
        self.value == self.default
    }

    fn value_string(&self) -> String {
        self.value.clone()
    }

    fn default_string(&self) -> String {
        self.default.clone()
    }

    fn check(&mut self, env: &mut Env<'_>, refs: &References) -> Verdict {
        let path = match self.resolved(refs) {
            Ok(path) => path,
            Err(e) => {
                return Verdict::reject(format!(
                    "{e}. Unable to determine a path for {}.",
                    self.meta.long_description
                ));
            }
        };
        if !path.is_absolute() {
            return Verdict::reject(format!(
                "{}: {} is not an absolute path.",
                self.meta.long_description,
                path.display()
            ));
        }

        let dir = self.directory_of(&path);
        if !dir.exists() {
            let verdict = self.ask_to_mkdir(&dir, env, refs);
            if verdict != Verdict::Accepted {
                return verdict;
            }
        }

        let verdict = self.check_existing(&path, env);
        if verdict != Verdict::Accepted {
            return verdict;
        }
        let verdict = self.check_free_space(&path, &dir, env);
        if verdict != Verdict::Accepted {
            return verdict;
        }
        self.check_fs_type(&path, &dir, env)
    }

    fn config_string(&self, refs: &References) -> String {
        self.resolved(refs).map_or_else(
            |_| self.value.clone(),
            |path| path.to_string_lossy().into_owned(),
        )
    }

    fn publish(&self, refs: &mut References) {
        refs.add_path(&self.meta.variable_name, &self.value, self.created_dir);
    }

    fn prompt_text(&self, _env: &mut Env<'_>, refs: &References) -> String {
        format!(
            "Please enter a path for {} [Default: {}]: ",
            self.meta.long_description,
            resolve_path(&self.default, &self.meta.variable_name, refs)
                .unwrap_or_else(|_| self.default.clone())
        )
    }
}
