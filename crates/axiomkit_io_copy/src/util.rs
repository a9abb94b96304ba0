//! Glob-matching and filesystem collaborators with their default implementations.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use globset::{GlobBuilder, GlobMatcher, GlobSet, GlobSetBuilder};
use walkdir::WalkDir;

use crate::spec::{CopyTargetsError, SpecFsOptions, SpecGlobOptions};

////////////////////////////////////////////////////////////////////////////////
// #region Collaborators

/// Glob-matching collaborator.
///
/// Matched directories are returned as single entries; their contents are
/// only returned when a pattern matches them too.
pub trait PathMatcher {
    /// Expand `patterns` into matched paths, in deterministic order.
    fn match_paths(
        &self,
        patterns: &[String],
        spec_glob_options: &SpecGlobOptions,
    ) -> Result<Vec<PathBuf>, CopyTargetsError>;
}

/// Filesystem collaborator used by the resolver and executor.
pub trait CopyFileSystem {
    /// Whether `path` is a directory.
    ///
    /// Symlinks are followed, so a link to a directory counts as a directory
    /// and gets a plain recursive copy even when a transform is set. An
    /// `lstat`-style check would treat the link itself as a file instead.
    fn is_directory(&self, path: &Path) -> bool;
    /// Read a whole file.
    fn read_file(&self, path: &Path) -> Result<Vec<u8>, CopyTargetsError>;
    /// Copy a file or directory tree, creating missing parent directories.
    fn copy_recursive(
        &self,
        path_src: &Path,
        path_dst: &Path,
        spec_fs_options: &SpecFsOptions,
    ) -> Result<(), CopyTargetsError>;
    /// Write `content` to `path`, creating missing parent directories.
    fn write_file_creating_dirs(
        &self,
        path: &Path,
        content: &[u8],
        spec_fs_options: &SpecFsOptions,
    ) -> Result<(), CopyTargetsError>;
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region PatternMatching

/// [`PathMatcher`] backed by `globset` + `walkdir`.
#[derive(Debug, Default, Clone, Copy)]
pub struct GlobsetPathMatcher;

impl PathMatcher for GlobsetPathMatcher {
    fn match_paths(
        &self,
        patterns: &[String],
        spec_glob_options: &SpecGlobOptions,
    ) -> Result<Vec<PathBuf>, CopyTargetsError> {
        let (l_positive, mut l_exclude) = split_negated_patterns(patterns);
        l_exclude.extend(spec_glob_options.patterns_ignore.iter().cloned());
        let globset_exclude = compile_glob_set(&l_exclude, spec_glob_options)?;

        let mut l_matched = Vec::new();
        let mut set_seen = HashSet::new();
        for pattern in &l_positive {
            for path_matched in match_one_pattern(pattern, &globset_exclude, spec_glob_options)? {
                if set_seen.insert(path_matched.clone()) {
                    l_matched.push(path_matched);
                }
            }
        }
        Ok(l_matched)
    }
}

fn normalize_pattern(pattern: &str) -> &str {
    let mut c_pattern = pattern;
    while let Some(c_rest) = c_pattern.strip_prefix("./") {
        c_pattern = c_rest;
    }
    c_pattern
}

fn split_negated_patterns(patterns: &[String]) -> (Vec<String>, Vec<String>) {
    let mut l_positive = Vec::new();
    let mut l_negative = Vec::new();
    for pattern in patterns {
        match pattern.strip_prefix('!') {
            Some(c_negated) => l_negative.push(normalize_pattern(c_negated).to_string()),
            None => l_positive.push(normalize_pattern(pattern).to_string()),
        }
    }
    (l_positive, l_negative)
}

fn has_glob_meta(segment: &str) -> bool {
    segment.contains(['*', '?', '[', '{'])
}

fn compile_glob(
    pattern: &str,
    spec_glob_options: &SpecGlobOptions,
) -> Result<globset::Glob, CopyTargetsError> {
    GlobBuilder::new(pattern)
        .literal_separator(true)
        .case_insensitive(!spec_glob_options.if_case_sensitive)
        .build()
        .map_err(|e| CopyTargetsError::InvalidPattern {
            pattern: pattern.to_string(),
            source: e,
        })
}

fn compile_matcher(
    pattern: &str,
    spec_glob_options: &SpecGlobOptions,
) -> Result<GlobMatcher, CopyTargetsError> {
    Ok(compile_glob(pattern, spec_glob_options)?.compile_matcher())
}

fn compile_glob_set(
    patterns: &[String],
    spec_glob_options: &SpecGlobOptions,
) -> Result<GlobSet, CopyTargetsError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(compile_glob(pattern, spec_glob_options)?);
    }
    builder.build().map_err(|e| CopyTargetsError::InvalidPattern {
        pattern: patterns.join(", "),
        source: e,
    })
}

/// Leading pattern segments without glob metacharacters.
fn derive_static_prefix(pattern: &str) -> Vec<&str> {
    pattern
        .split('/')
        .take_while(|segment| !has_glob_meta(segment))
        .collect()
}

fn pattern_mentions_dot(pattern: &str) -> bool {
    pattern
        .split('/')
        .any(|segment| segment.starts_with('.') && segment != "." && segment != "..")
}

fn is_hidden_name(name: &std::ffi::OsStr) -> bool {
    name.to_string_lossy().starts_with('.')
}

fn join_slash(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy().to_string())
        .collect::<Vec<_>>()
        .join("/")
}

fn derive_output_path(c_candidate: &str, spec_glob_options: &SpecGlobOptions) -> PathBuf {
    match &spec_glob_options.path_cwd {
        Some(path_cwd) => path_cwd.join(c_candidate),
        None => PathBuf::from(c_candidate),
    }
}

fn match_one_pattern(
    pattern: &str,
    globset_exclude: &GlobSet,
    spec_glob_options: &SpecGlobOptions,
) -> Result<Vec<PathBuf>, CopyTargetsError> {
    if pattern.is_empty() {
        return Ok(Vec::new());
    }

    if !has_glob_meta(pattern) {
        let c_literal = pattern.trim_end_matches('/');
        let path_literal = derive_output_path(c_literal, spec_glob_options);
        if fs::symlink_metadata(&path_literal).is_err() || globset_exclude.is_match(c_literal) {
            return Ok(Vec::new());
        }
        return Ok(vec![path_literal]);
    }

    let matcher = compile_matcher(pattern, spec_glob_options)?;
    let l_prefix = derive_static_prefix(pattern);
    let c_prefix = l_prefix.join("/");
    let b_is_absolute = pattern.starts_with('/');
    let path_walk_root = match (c_prefix.is_empty(), b_is_absolute) {
        (true, true) => PathBuf::from("/"),
        (true, false) => spec_glob_options
            .path_cwd
            .clone()
            .unwrap_or_else(|| PathBuf::from(".")),
        (false, _) => derive_output_path(&c_prefix, spec_glob_options),
    };
    if !path_walk_root.is_dir() {
        return Ok(Vec::new());
    }

    let b_skip_hidden = !spec_glob_options.if_dot && !pattern_mentions_dot(pattern);
    let mut walker = WalkDir::new(&path_walk_root)
        .min_depth(1)
        .follow_links(spec_glob_options.if_follow_symlinks)
        .sort_by_file_name();
    if let Some(depth_limit) = spec_glob_options.depth_limit {
        walker = walker.max_depth(depth_limit);
    }

    let mut l_matched = Vec::new();
    let iter_entries = walker.into_iter().filter_entry(|entry| {
        entry.depth() == 0 || !(b_skip_hidden && is_hidden_name(entry.file_name()))
    });
    for entry_res in iter_entries {
        let entry = match entry_res {
            Ok(v) => v,
            Err(e) if e.io_error().is_some_and(|err| err.kind() == io::ErrorKind::NotFound) => {
                continue;
            }
            Err(e) => {
                return Err(CopyTargetsError::Walk {
                    path: path_walk_root.clone(),
                    source: e,
                });
            }
        };

        let Ok(path_rel) = entry.path().strip_prefix(&path_walk_root) else {
            continue;
        };
        let c_rel = join_slash(path_rel);
        let c_candidate = if c_prefix.is_empty() && b_is_absolute {
            format!("/{c_rel}")
        } else if c_prefix.is_empty() {
            c_rel
        } else {
            format!("{c_prefix}/{c_rel}")
        };

        if matcher.is_match(&c_candidate) && !globset_exclude.is_match(&c_candidate) {
            l_matched.push(derive_output_path(&c_candidate, spec_glob_options));
        }
    }
    Ok(l_matched)
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region FileSystem

/// [`CopyFileSystem`] backed by `std::fs`, `filetime` and `xattr`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdCopyFileSystem;

impl CopyFileSystem for StdCopyFileSystem {
    fn is_directory(&self, path: &Path) -> bool {
        fs::metadata(path).is_ok_and(|meta| meta.is_dir())
    }

    fn read_file(&self, path: &Path) -> Result<Vec<u8>, CopyTargetsError> {
        fs::read(path).map_err(|e| CopyTargetsError::io(path, e))
    }

    fn copy_recursive(
        &self,
        path_src: &Path,
        path_dst: &Path,
        spec_fs_options: &SpecFsOptions,
    ) -> Result<(), CopyTargetsError> {
        if normalize_path(path_src) == normalize_path(path_dst) {
            return Err(CopyTargetsError::io(
                path_dst,
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    "Source and destination must not be the same.",
                ),
            ));
        }
        if self.is_directory(path_src) && is_nested_within(path_dst, path_src) {
            return Err(CopyTargetsError::io(
                path_dst,
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!(
                        "Cannot copy {} to a subdirectory of itself",
                        path_src.display()
                    ),
                ),
            ));
        }
        create_parent_dirs(path_dst)?;
        copy_entry(path_src, path_dst, spec_fs_options)
    }

    fn write_file_creating_dirs(
        &self,
        path: &Path,
        content: &[u8],
        _spec_fs_options: &SpecFsOptions,
    ) -> Result<(), CopyTargetsError> {
        create_parent_dirs(path)?;
        fs::write(path, content).map_err(|e| CopyTargetsError::io(path, e))
    }
}

fn create_parent_dirs(path: &Path) -> Result<(), CopyTargetsError> {
    match path.parent() {
        Some(path_parent) if !path_parent.as_os_str().is_empty() => {
            fs::create_dir_all(path_parent).map_err(|e| CopyTargetsError::io(path_parent, e))
        }
        _ => Ok(()),
    }
}

fn normalize_path(path: &Path) -> PathBuf {
    if let Ok(resolved) = fs::canonicalize(path) {
        return resolved;
    }
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(path)
}

/// `path_inner` lies strictly below `path_outer`.
fn is_nested_within(path_inner: &Path, path_outer: &Path) -> bool {
    let path_outer_resolved = normalize_path(path_outer);
    let path_inner_resolved = match path_inner.parent() {
        Some(path_parent) if !path_parent.as_os_str().is_empty() => {
            normalize_path(path_parent).join(path_inner.file_name().unwrap_or_default())
        }
        _ => normalize_path(path_inner),
    };
    path_inner_resolved != path_outer_resolved
        && path_inner_resolved.starts_with(&path_outer_resolved)
}

fn copy_entry(
    path_src: &Path,
    path_dst: &Path,
    spec_fs_options: &SpecFsOptions,
) -> Result<(), CopyTargetsError> {
    let meta_src = if spec_fs_options.if_dereference {
        fs::metadata(path_src)
    } else {
        fs::symlink_metadata(path_src)
    }
    .map_err(|e| CopyTargetsError::io(path_src, e))?;

    let cfg_file_type = meta_src.file_type();
    if cfg_file_type.is_symlink() {
        copy_symlink(path_src, path_dst, spec_fs_options)
    } else if cfg_file_type.is_dir() {
        copy_directory(path_src, path_dst, spec_fs_options)
    } else if cfg_file_type.is_file() {
        copy_file(path_src, path_dst, spec_fs_options)
    } else {
        Err(CopyTargetsError::io(
            path_src,
            io::Error::other(format!(
                "Cannot copy special file: {}",
                path_src.display()
            )),
        ))
    }
}

fn copy_directory(
    path_src: &Path,
    path_dst: &Path,
    spec_fs_options: &SpecFsOptions,
) -> Result<(), CopyTargetsError> {
    fs::create_dir_all(path_dst).map_err(|e| CopyTargetsError::io(path_dst, e))?;

    let mut l_entries = fs::read_dir(path_src)
        .map_err(|e| CopyTargetsError::io(path_src, e))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| CopyTargetsError::io(path_src, e))?;
    l_entries.sort_by_key(|entry| entry.file_name());

    for entry in l_entries {
        copy_entry(
            &entry.path(),
            &path_dst.join(entry.file_name()),
            spec_fs_options,
        )?;
    }
    Ok(())
}

/// Apply the overwrite policy to an existing destination.
///
/// Returns `false` when the copy should be skipped.
fn should_copy_over_existing(
    path_dst: &Path,
    spec_fs_options: &SpecFsOptions,
) -> Result<bool, CopyTargetsError> {
    let meta_dst = match fs::symlink_metadata(path_dst) {
        Ok(v) => v,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(true),
        Err(e) => return Err(CopyTargetsError::io(path_dst, e)),
    };

    if !spec_fs_options.if_overwrite {
        if spec_fs_options.if_error_on_exist {
            return Err(CopyTargetsError::DestinationExists(path_dst.to_path_buf()));
        }
        return Ok(false);
    }
    if meta_dst.is_dir() {
        return Err(CopyTargetsError::io(
            path_dst,
            io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("Cannot overwrite directory {} with a file", path_dst.display()),
            ),
        ));
    }
    if meta_dst.file_type().is_symlink() {
        fs::remove_file(path_dst).map_err(|e| CopyTargetsError::io(path_dst, e))?;
    }
    Ok(true)
}

fn copy_file(
    path_src: &Path,
    path_dst: &Path,
    spec_fs_options: &SpecFsOptions,
) -> Result<(), CopyTargetsError> {
    if !should_copy_over_existing(path_dst, spec_fs_options)? {
        return Ok(());
    }
    fs::copy(path_src, path_dst).map_err(|e| CopyTargetsError::io(path_dst, e))?;
    if spec_fs_options.if_preserve_timestamps {
        apply_timestamps(path_src, path_dst).map_err(|e| CopyTargetsError::io(path_dst, e))?;
    }
    if spec_fs_options.if_preserve_xattrs {
        copy_xattrs(path_src, path_dst);
    }
    Ok(())
}

fn copy_symlink(
    path_src: &Path,
    path_dst: &Path,
    spec_fs_options: &SpecFsOptions,
) -> Result<(), CopyTargetsError> {
    if !should_copy_over_existing(path_dst, spec_fs_options)? {
        return Ok(());
    }
    let target = fs::read_link(path_src).map_err(|e| CopyTargetsError::io(path_src, e))?;
    create_symbolic_link(path_src, &target, path_dst).map_err(|e| CopyTargetsError::io(path_dst, e))
}

fn create_symbolic_link(path_src: &Path, target: &Path, path_dst: &Path) -> io::Result<()> {
    #[cfg(unix)]
    {
        let _ = path_src;
        std::os::unix::fs::symlink(target, path_dst)
    }
    #[cfg(windows)]
    {
        use std::os::windows::fs::{symlink_dir, symlink_file};
        if path_src.is_dir() {
            symlink_dir(target, path_dst)
        } else {
            symlink_file(target, path_dst)
        }
    }
    #[cfg(not(any(unix, windows)))]
    {
        let _ = (path_src, target, path_dst);
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "Symbolic links are unsupported on this platform",
        ))
    }
}

fn apply_timestamps(path_src: &Path, path_dst: &Path) -> io::Result<()> {
    use filetime::{FileTime, set_file_times};

    let stat_src = fs::metadata(path_src)?;
    let file_time_access = FileTime::from_last_access_time(&stat_src);
    let file_time_modify = FileTime::from_last_modification_time(&stat_src);
    set_file_times(path_dst, file_time_access, file_time_modify)
}

#[cfg(target_os = "linux")]
fn copy_xattrs(path_src: &Path, path_dst: &Path) {
    let iter_xattr_names = match xattr::list(path_src) {
        Ok(v) => v,
        Err(e) => {
            log::debug!("Skip xattrs of {} ({e})", path_src.display());
            return;
        }
    };

    for name in iter_xattr_names {
        let Some(raw_value) = xattr::get(path_src, &name).ok().flatten() else {
            continue;
        };
        if let Err(e) = xattr::set(path_dst, &name, &raw_value) {
            log::debug!(
                "Failed to set xattr {} on {} ({e})",
                name.to_string_lossy(),
                path_dst.display()
            );
        }
    }
}

#[cfg(not(target_os = "linux"))]
fn copy_xattrs(_path_src: &Path, _path_dst: &Path) {}

// #endregion
////////////////////////////////////////////////////////////////////////////////
