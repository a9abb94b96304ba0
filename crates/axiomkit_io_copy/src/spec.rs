//! Copy-target models and top-level error types.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;

use crate::conf::C_HOOK_DEFAULT;

////////////////////////////////////////////////////////////////////////////////
// #region EnumsInit

/// Rename callback: `(name_without_extension, extension_without_dot) -> new_basename`.
pub type FnCopyRename = Arc<dyn Fn(&str, &str) -> String + Send + Sync>;

/// Content transform callback applied to regular files only.
pub type FnCopyTransform = Arc<dyn Fn(&[u8]) -> Vec<u8> + Send + Sync>;

/// How the destination basename is derived from the matched path.
#[derive(Clone)]
pub enum EnumCopyRename {
    /// Use this basename for every matched path.
    Literal(String),
    /// Compute the basename from the matched path's stem and extension.
    Function(FnCopyRename),
}

impl EnumCopyRename {
    /// Wrap a closure as [`EnumCopyRename::Function`].
    pub fn function<F>(func: F) -> Self
    where
        F: Fn(&str, &str) -> String + Send + Sync + 'static,
    {
        Self::Function(Arc::new(func))
    }

    /// Derive the final basename for `name_file`.
    ///
    /// An empty literal keeps the original basename.
    pub fn apply(&self, name_file: &str) -> String {
        match self {
            Self::Literal(c_name) if c_name.is_empty() => name_file.to_string(),
            Self::Literal(c_name) => c_name.clone(),
            Self::Function(func) => {
                let (c_stem, c_ext) = split_name_extension(name_file);
                func(c_stem, c_ext)
            }
        }
    }
}

impl fmt::Debug for EnumCopyRename {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(c_name) => f.debug_tuple("Literal").field(c_name).finish(),
            Self::Function(_) => f.write_str("Function(<fn>)"),
        }
    }
}

impl From<&str> for EnumCopyRename {
    fn from(value: &str) -> Self {
        Self::Literal(value.to_string())
    }
}

impl From<String> for EnumCopyRename {
    fn from(value: String) -> Self {
        Self::Literal(value)
    }
}

/// Split `name.ext` into (`name`, `ext`). Leading-dot names have no extension.
pub(crate) fn split_name_extension(name_file: &str) -> (&str, &str) {
    match name_file.rfind('.') {
        Some(0) | None => (name_file, ""),
        Some(n_idx) => (&name_file[..n_idx], &name_file[n_idx + 1..]),
    }
}

/// A scalar or a list, normalized with [`EnumOneOrMany::into_vec`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum EnumOneOrMany<T> {
    /// Single value.
    One(T),
    /// Ordered values.
    Many(Vec<T>),
}

impl<T> EnumOneOrMany<T> {
    /// Canonical ordered sequence.
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Self::One(value) => vec![value],
            Self::Many(values) => values,
        }
    }
}

impl<T> Default for EnumOneOrMany<T> {
    fn default() -> Self {
        Self::Many(Vec::new())
    }
}

impl<T> From<Vec<T>> for EnumOneOrMany<T> {
    fn from(values: Vec<T>) -> Self {
        Self::Many(values)
    }
}

impl From<&str> for EnumOneOrMany<String> {
    fn from(value: &str) -> Self {
        Self::One(value.to_string())
    }
}

impl From<String> for EnumOneOrMany<String> {
    fn from(value: String) -> Self {
        Self::One(value)
    }
}

impl From<Vec<&str>> for EnumOneOrMany<String> {
    fn from(values: Vec<&str>) -> Self {
        Self::Many(values.into_iter().map(str::to_string).collect())
    }
}

impl<const N: usize> From<[&str; N]> for EnumOneOrMany<String> {
    fn from(values: [&str; N]) -> Self {
        Self::Many(values.iter().map(|v| v.to_string()).collect())
    }
}

impl From<&str> for EnumOneOrMany<PathBuf> {
    fn from(value: &str) -> Self {
        Self::One(PathBuf::from(value))
    }
}

impl From<&Path> for EnumOneOrMany<PathBuf> {
    fn from(value: &Path) -> Self {
        Self::One(value.to_path_buf())
    }
}

impl From<PathBuf> for EnumOneOrMany<PathBuf> {
    fn from(value: PathBuf) -> Self {
        Self::One(value)
    }
}

impl From<&PathBuf> for EnumOneOrMany<PathBuf> {
    fn from(value: &PathBuf) -> Self {
        Self::One(value.clone())
    }
}

impl From<Vec<&str>> for EnumOneOrMany<PathBuf> {
    fn from(values: Vec<&str>) -> Self {
        Self::Many(values.into_iter().map(PathBuf::from).collect())
    }
}

impl<const N: usize> From<[&str; N]> for EnumOneOrMany<PathBuf> {
    fn from(values: [&str; N]) -> Self {
        Self::Many(values.iter().map(PathBuf::from).collect())
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Options

/// Passthrough options for the glob-matching and filesystem collaborators.
///
/// Every field is optional so plugin-level defaults and per-target overrides
/// can be layered with [`SpecCopyExtraOptions::merge`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SpecCopyExtraOptions {
    /// Base directory for relative patterns.
    #[serde(rename = "cwd")]
    pub path_cwd: Option<PathBuf>,
    /// Extra exclusion globs.
    #[serde(rename = "ignore")]
    pub patterns_ignore: Option<Vec<String>>,
    /// Let wildcards match dot-entries.
    #[serde(rename = "dot")]
    pub if_dot: Option<bool>,
    /// Case-sensitive pattern matching.
    #[serde(rename = "case_sensitive")]
    pub if_case_sensitive: Option<bool>,
    /// Follow symlinked directories while matching.
    #[serde(rename = "follow_symlinks")]
    pub if_follow_symlinks: Option<bool>,
    /// Maximum traversal depth below a pattern's static base.
    #[serde(rename = "deep")]
    pub depth_limit: Option<usize>,

    /// Replace existing destination files.
    #[serde(rename = "overwrite")]
    pub if_overwrite: Option<bool>,
    /// Fail when a destination file exists and overwrite is off.
    #[serde(rename = "error_on_exist")]
    pub if_error_on_exist: Option<bool>,
    /// Copy symlink targets instead of recreating links.
    #[serde(rename = "dereference")]
    pub if_dereference: Option<bool>,
    /// Carry access/modification times over to copies.
    #[serde(rename = "preserve_timestamps")]
    pub if_preserve_timestamps: Option<bool>,
    /// Carry extended attributes over to copies (Linux only).
    #[serde(rename = "preserve_xattrs")]
    pub if_preserve_xattrs: Option<bool>,
}

impl SpecCopyExtraOptions {
    /// Merge two option sets; non-`None` values of `other` win.
    pub fn merge(&self, other: &SpecCopyExtraOptions) -> SpecCopyExtraOptions {
        SpecCopyExtraOptions {
            path_cwd: other.path_cwd.clone().or_else(|| self.path_cwd.clone()),
            patterns_ignore: other
                .patterns_ignore
                .clone()
                .or_else(|| self.patterns_ignore.clone()),
            if_dot: other.if_dot.or(self.if_dot),
            if_case_sensitive: other.if_case_sensitive.or(self.if_case_sensitive),
            if_follow_symlinks: other.if_follow_symlinks.or(self.if_follow_symlinks),
            depth_limit: other.depth_limit.or(self.depth_limit),
            if_overwrite: other.if_overwrite.or(self.if_overwrite),
            if_error_on_exist: other.if_error_on_exist.or(self.if_error_on_exist),
            if_dereference: other.if_dereference.or(self.if_dereference),
            if_preserve_timestamps: other
                .if_preserve_timestamps
                .or(self.if_preserve_timestamps),
            if_preserve_xattrs: other.if_preserve_xattrs.or(self.if_preserve_xattrs),
        }
    }

    /// Concrete options for the glob-matching collaborator.
    pub fn to_glob_options(&self) -> SpecGlobOptions {
        let spec_default = SpecGlobOptions::default();
        SpecGlobOptions {
            path_cwd: self.path_cwd.clone(),
            patterns_ignore: self.patterns_ignore.clone().unwrap_or_default(),
            if_dot: self.if_dot.unwrap_or(spec_default.if_dot),
            if_case_sensitive: self
                .if_case_sensitive
                .unwrap_or(spec_default.if_case_sensitive),
            if_follow_symlinks: self
                .if_follow_symlinks
                .unwrap_or(spec_default.if_follow_symlinks),
            depth_limit: self.depth_limit,
        }
    }

    /// Concrete options for the filesystem collaborator.
    pub fn to_fs_options(&self) -> SpecFsOptions {
        let spec_default = SpecFsOptions::default();
        SpecFsOptions {
            if_overwrite: self.if_overwrite.unwrap_or(spec_default.if_overwrite),
            if_error_on_exist: self
                .if_error_on_exist
                .unwrap_or(spec_default.if_error_on_exist),
            if_dereference: self.if_dereference.unwrap_or(spec_default.if_dereference),
            if_preserve_timestamps: self
                .if_preserve_timestamps
                .unwrap_or(spec_default.if_preserve_timestamps),
            if_preserve_xattrs: self
                .if_preserve_xattrs
                .unwrap_or(spec_default.if_preserve_xattrs),
        }
    }
}

/// Resolved glob-matching options.
///
/// Directories are never expanded into their contents and both files and
/// directories are matched; neither is configurable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecGlobOptions {
    /// Base directory for relative patterns (process cwd when `None`).
    pub path_cwd: Option<PathBuf>,
    /// Extra exclusion globs.
    pub patterns_ignore: Vec<String>,
    /// Let wildcards match dot-entries.
    pub if_dot: bool,
    /// Case-sensitive pattern matching.
    pub if_case_sensitive: bool,
    /// Follow symlinked directories while matching.
    pub if_follow_symlinks: bool,
    /// Maximum traversal depth below a pattern's static base.
    pub depth_limit: Option<usize>,
}

impl Default for SpecGlobOptions {
    fn default() -> Self {
        Self {
            path_cwd: None,
            patterns_ignore: Vec::new(),
            if_dot: false,
            if_case_sensitive: true,
            if_follow_symlinks: true,
            depth_limit: None,
        }
    }
}

/// Resolved filesystem copy/write options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecFsOptions {
    /// Replace existing destination files.
    pub if_overwrite: bool,
    /// Fail when a destination file exists and overwrite is off.
    pub if_error_on_exist: bool,
    /// Copy symlink targets instead of recreating links.
    pub if_dereference: bool,
    /// Carry access/modification times over to copies.
    pub if_preserve_timestamps: bool,
    /// Carry extended attributes over to copies (Linux only).
    pub if_preserve_xattrs: bool,
}

impl Default for SpecFsOptions {
    fn default() -> Self {
        Self {
            if_overwrite: true,
            if_error_on_exist: false,
            if_dereference: false,
            if_preserve_timestamps: false,
            if_preserve_xattrs: false,
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Targets

/// One declarative copy target: glob patterns, destinations, optional rename/transform.
#[derive(Clone, Default)]
pub struct SpecCopyTarget {
    /// Source glob patterns (`!pattern` excludes).
    pub patterns_src: Vec<String>,
    /// Destination directories; every match is copied into each of them.
    pub paths_dest: Vec<PathBuf>,
    /// Optional basename override.
    pub rename: Option<EnumCopyRename>,
    /// Optional content transform for regular files.
    pub transform: Option<FnCopyTransform>,
    /// Per-target passthrough options (override plugin defaults).
    pub spec_extra: SpecCopyExtraOptions,
}

impl SpecCopyTarget {
    /// Build a target from one-or-many patterns and one-or-many destinations.
    pub fn new<S, D>(src: S, dest: D) -> Self
    where
        S: Into<EnumOneOrMany<String>>,
        D: Into<EnumOneOrMany<PathBuf>>,
    {
        Self {
            patterns_src: src.into().into_vec(),
            paths_dest: dest.into().into_vec(),
            ..Self::default()
        }
    }

    /// Set the rename rule.
    pub fn with_rename(mut self, rename: impl Into<EnumCopyRename>) -> Self {
        self.rename = Some(rename.into());
        self
    }

    /// Set a rename closure.
    pub fn with_rename_fn<F>(mut self, func: F) -> Self
    where
        F: Fn(&str, &str) -> String + Send + Sync + 'static,
    {
        self.rename = Some(EnumCopyRename::function(func));
        self
    }

    /// Set a content transform.
    pub fn with_transform<F>(mut self, func: F) -> Self
    where
        F: Fn(&[u8]) -> Vec<u8> + Send + Sync + 'static,
    {
        self.transform = Some(Arc::new(func));
        self
    }

    /// Set per-target passthrough options.
    pub fn with_extra(mut self, spec_extra: SpecCopyExtraOptions) -> Self {
        self.spec_extra = spec_extra;
        self
    }
}

impl fmt::Debug for SpecCopyTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpecCopyTarget")
            .field("src", &self.patterns_src)
            .field("dest", &self.paths_dest)
            .field("rename", &self.rename)
            .field("transform", &self.transform.as_ref().map(|_| "<fn>"))
            .field("extra", &self.spec_extra)
            .finish()
    }
}

/// One concrete copy unit produced by the resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecCopyOperation {
    /// Matched file or directory.
    pub path_src: PathBuf,
    /// `destination_dir/final_basename`.
    pub path_dst: PathBuf,
    /// Transformed bytes; when set they are written instead of copying `path_src`.
    pub content: Option<Vec<u8>>,
    /// Merged plugin + target filesystem options.
    pub spec_fs_options: SpecFsOptions,
}

impl SpecCopyOperation {
    /// Whether this operation writes transformed content.
    pub fn is_transformed(&self) -> bool {
        self.content.is_some()
    }
}

/// Plugin construction options.
#[derive(Debug, Clone)]
pub struct SpecCopyPluginOptions {
    /// Copy targets, resolved in order.
    pub targets: Vec<SpecCopyTarget>,
    /// Lifecycle event the plugin attaches to.
    pub hook: String,
    /// Resolve and copy only on the first hook invocation.
    pub if_copy_once: bool,
    /// Emit per-operation and summary lines.
    pub if_verbose: bool,
    /// Passthrough defaults for every target.
    pub spec_defaults: SpecCopyExtraOptions,
}

impl Default for SpecCopyPluginOptions {
    fn default() -> Self {
        Self {
            targets: Vec::new(),
            hook: C_HOOK_DEFAULT.to_string(),
            if_copy_once: false,
            if_verbose: false,
            spec_defaults: SpecCopyExtraOptions::default(),
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Errors

/// Errors that stop a hook invocation.
#[derive(Debug, thiserror::Error)]
pub enum CopyTargetsError {
    /// Malformed copy target.
    #[error("{target} {reason}")]
    InvalidTarget {
        /// Printed form of the offending target.
        target: String,
        /// What is wrong with it.
        reason: String,
    },
    /// Source pattern failed to compile.
    #[error("Invalid glob pattern `{pattern}`: {source}")]
    InvalidPattern {
        /// Offending pattern.
        pattern: String,
        /// Compilation error.
        #[source]
        source: globset::Error,
    },
    /// Traversal failed while matching.
    #[error("Failed to walk {}: {source}", .path.display())]
    Walk {
        /// Directory being walked.
        path: PathBuf,
        /// Traversal error.
        #[source]
        source: walkdir::Error,
    },
    /// Read, write or copy failed.
    #[error("I/O failure at {}: {source}", .path.display())]
    Io {
        /// Path involved in the failed call.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
    /// Destination exists and overwriting is disallowed.
    #[error("Destination already exists: {}", .0.display())]
    DestinationExists(PathBuf),
    /// Configuration file could not be read or parsed.
    #[error("Invalid copy configuration {}: {message}", .path.display())]
    Config {
        /// Configuration source.
        path: PathBuf,
        /// Parse or read failure.
        message: String,
    },
}

impl CopyTargetsError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn invalid_target(target: impl fmt::Debug, reason: &str) -> Self {
        Self::InvalidTarget {
            target: format!("{target:?}"),
            reason: reason.to_string(),
        }
    }

    /// Configuration-class failure (as opposed to I/O).
    pub fn is_config_error(&self) -> bool {
        matches!(self, Self::InvalidTarget { .. } | Self::Config { .. })
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
