//! Copy-target validation and resolution into concrete operations.

use std::path::{Component, Path, PathBuf};

use crate::conf::{C_REASON_MISSING_SRC_DEST, derive_transform_on_directory_warning};
use crate::report::CopyReporter;
use crate::spec::{CopyTargetsError, SpecCopyExtraOptions, SpecCopyOperation, SpecCopyTarget};
use crate::util::{CopyFileSystem, PathMatcher};

/// Operations and diagnostics produced by resolution.
#[derive(Debug, Default, Clone)]
pub struct SpecResolvedTargets {
    /// Operations in target -> match -> destination order.
    pub operations: Vec<SpecCopyOperation>,
    /// Non-fatal warnings (transform requested on a directory).
    pub warnings: Vec<String>,
    /// Number of targets resolved.
    pub cnt_targets: u64,
    /// Number of matched source paths.
    pub cnt_matched: u64,
}

impl SpecResolvedTargets {
    fn extend(&mut self, other: SpecResolvedTargets) {
        self.operations.extend(other.operations);
        self.warnings.extend(other.warnings);
        self.cnt_targets += other.cnt_targets;
        self.cnt_matched += other.cnt_matched;
    }
}

/// Reject a target without usable `src` or `dest`.
pub fn validate_target(target: &SpecCopyTarget) -> Result<(), CopyTargetsError> {
    let b_missing_src =
        target.patterns_src.is_empty() || target.patterns_src.iter().any(|p| p.is_empty());
    let b_missing_dest = target.paths_dest.is_empty()
        || target.paths_dest.iter().any(|p| p.as_os_str().is_empty());
    if b_missing_src || b_missing_dest {
        return Err(CopyTargetsError::invalid_target(
            target,
            C_REASON_MISSING_SRC_DEST,
        ));
    }
    Ok(())
}

/// Validate every target before any of them is resolved.
pub fn validate_targets(targets: &[SpecCopyTarget]) -> Result<(), CopyTargetsError> {
    targets.iter().try_for_each(validate_target)
}

fn derive_basename(path_matched: &Path) -> String {
    match path_matched.file_name() {
        Some(name) => name.to_string_lossy().to_string(),
        None => path_matched.display().to_string(),
    }
}

/// Renamed basename as a path relative to its destination directory.
///
/// Root and prefix components are dropped so the result always stays under
/// the destination.
fn derive_relative_name(c_name_final: &str) -> PathBuf {
    Path::new(c_name_final)
        .components()
        .filter(|component| !matches!(component, Component::RootDir | Component::Prefix(_)))
        .collect()
}

/// Resolve one target into operations.
///
/// `spec_defaults` are the plugin-level passthrough options; the target's own
/// options win on conflict. Warnings go to `reporter` as soon as they arise
/// and are also kept in the result.
pub fn resolve_target<M, F, R>(
    target: &SpecCopyTarget,
    spec_defaults: &SpecCopyExtraOptions,
    path_matcher: &M,
    copy_fs: &F,
    reporter: &mut R,
) -> Result<SpecResolvedTargets, CopyTargetsError>
where
    M: PathMatcher + ?Sized,
    F: CopyFileSystem + ?Sized,
    R: CopyReporter + ?Sized,
{
    validate_target(target)?;

    let spec_extra = spec_defaults.merge(&target.spec_extra);
    let l_matched = path_matcher.match_paths(&target.patterns_src, &spec_extra.to_glob_options())?;
    let spec_fs_options = spec_extra.to_fs_options();

    let mut spec_resolved = SpecResolvedTargets {
        cnt_targets: 1,
        cnt_matched: l_matched.len() as u64,
        ..Default::default()
    };

    for path_matched in l_matched {
        let c_name = derive_basename(&path_matched);
        let c_name_final = match &target.rename {
            Some(rename) => rename.apply(&c_name),
            None => c_name,
        };
        let path_name_final = derive_relative_name(&c_name_final);

        let mut content = None;
        if let Some(transform) = &target.transform {
            if copy_fs.is_directory(&path_matched) {
                let warning = derive_transform_on_directory_warning(&path_matched);
                reporter.on_warning(&warning);
                spec_resolved.warnings.push(warning);
            } else {
                let raw_content = copy_fs.read_file(&path_matched)?;
                content = Some(transform(&raw_content));
            }
        }

        for path_dest in &target.paths_dest {
            spec_resolved.operations.push(SpecCopyOperation {
                path_src: path_matched.clone(),
                path_dst: path_dest.join(&path_name_final),
                content: content.clone(),
                spec_fs_options,
            });
        }
    }

    log::debug!(
        "Resolved {:?}: matched={} operations={}",
        target.patterns_src,
        spec_resolved.cnt_matched,
        spec_resolved.operations.len()
    );
    Ok(spec_resolved)
}

/// Validate all targets, then resolve them in order.
pub fn resolve_targets<M, F, R>(
    targets: &[SpecCopyTarget],
    spec_defaults: &SpecCopyExtraOptions,
    path_matcher: &M,
    copy_fs: &F,
    reporter: &mut R,
) -> Result<SpecResolvedTargets, CopyTargetsError>
where
    M: PathMatcher + ?Sized,
    F: CopyFileSystem + ?Sized,
    R: CopyReporter + ?Sized,
{
    validate_targets(targets)?;

    let mut spec_resolved = SpecResolvedTargets::default();
    for (idx_target, target) in targets.iter().enumerate() {
        log::debug!("Resolving target #{idx_target}");
        spec_resolved.extend(resolve_target(
            target,
            spec_defaults,
            path_matcher,
            copy_fs,
            reporter,
        )?);
    }
    Ok(spec_resolved)
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::path::{Path, PathBuf};

    use super::{resolve_target, resolve_targets, validate_target};
    use crate::conf::C_REASON_MISSING_SRC_DEST;
    use crate::report::RecordingCopyReporter;
    use crate::spec::{
        CopyTargetsError, SpecCopyExtraOptions, SpecCopyTarget, SpecGlobOptions,
    };
    use crate::util::{GlobsetPathMatcher, PathMatcher, StdCopyFileSystem};

    fn write_text(path: &Path, txt: &str) {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent");
        }
        std::fs::write(path, txt).expect("write text");
    }

    fn defaults_for(tmp: &tempfile::TempDir) -> SpecCopyExtraOptions {
        SpecCopyExtraOptions {
            path_cwd: Some(tmp.path().to_path_buf()),
            ..Default::default()
        }
    }

    /// Records every pattern list it is asked to match.
    #[derive(Default)]
    struct RecordingMatcher {
        l_calls: RefCell<Vec<Vec<String>>>,
    }

    impl PathMatcher for RecordingMatcher {
        fn match_paths(
            &self,
            patterns: &[String],
            _spec_glob_options: &SpecGlobOptions,
        ) -> Result<Vec<PathBuf>, CopyTargetsError> {
            self.l_calls.borrow_mut().push(patterns.to_vec());
            Ok(Vec::new())
        }
    }

    #[test]
    fn three_pngs_resolve_to_plain_copies() {
        let tmp = tempfile::tempdir().expect("tempdir");
        for c_name in ["a.png", "b.png", "c.png"] {
            write_text(&tmp.path().join("assets").join(c_name), "png");
        }
        write_text(&tmp.path().join("assets/readme.md"), "md");

        let target = SpecCopyTarget::new("assets/*.png", "build/img");
        let spec_resolved = resolve_target(
            &target,
            &defaults_for(&tmp),
            &GlobsetPathMatcher,
            &StdCopyFileSystem,
            &mut RecordingCopyReporter::default(),
        )
        .expect("resolve");

        assert_eq!(spec_resolved.operations.len(), 3);
        let l_dst = spec_resolved
            .operations
            .iter()
            .map(|op| op.path_dst.clone())
            .collect::<Vec<_>>();
        assert_eq!(
            l_dst,
            vec![
                PathBuf::from("build/img/a.png"),
                PathBuf::from("build/img/b.png"),
                PathBuf::from("build/img/c.png"),
            ]
        );
        assert!(spec_resolved.operations.iter().all(|op| op.content.is_none()));
    }

    #[test]
    fn empty_match_is_not_an_error() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let target = SpecCopyTarget::new("nothing/*.txt", "out");
        let spec_resolved = resolve_target(
            &target,
            &defaults_for(&tmp),
            &GlobsetPathMatcher,
            &StdCopyFileSystem,
            &mut RecordingCopyReporter::default(),
        )
        .expect("resolve");
        assert!(spec_resolved.operations.is_empty());
        assert_eq!(spec_resolved.cnt_targets, 1);
    }

    #[test]
    fn each_destination_gets_one_operation_in_order() {
        let tmp = tempfile::tempdir().expect("tempdir");
        write_text(&tmp.path().join("a.txt"), "a");
        write_text(&tmp.path().join("b.txt"), "b");

        let target = SpecCopyTarget::new("*.txt", ["d1", "d2", "d3"]);
        let spec_resolved = resolve_target(
            &target,
            &defaults_for(&tmp),
            &GlobsetPathMatcher,
            &StdCopyFileSystem,
            &mut RecordingCopyReporter::default(),
        )
        .expect("resolve");

        let l_dst = spec_resolved
            .operations
            .iter()
            .map(|op| op.path_dst.to_string_lossy().to_string())
            .collect::<Vec<_>>();
        assert_eq!(
            l_dst,
            vec!["d1/a.txt", "d2/a.txt", "d3/a.txt", "d1/b.txt", "d2/b.txt", "d3/b.txt"]
        );
    }

    #[test]
    fn rename_function_and_literal_set_basename() {
        let tmp = tempfile::tempdir().expect("tempdir");
        write_text(&tmp.path().join("a.txt"), "a");
        write_text(&tmp.path().join("b.txt"), "b");

        let target_fn =
            SpecCopyTarget::new("a.txt", "out").with_rename_fn(|name, _ext| format!("{name}.bak"));
        let spec_resolved = resolve_target(
            &target_fn,
            &defaults_for(&tmp),
            &GlobsetPathMatcher,
            &StdCopyFileSystem,
            &mut RecordingCopyReporter::default(),
        )
        .expect("resolve");
        assert_eq!(spec_resolved.operations[0].path_dst, PathBuf::from("out/a.bak"));

        let target_literal = SpecCopyTarget::new("*.txt", "out").with_rename("fixed.txt");
        let spec_resolved = resolve_target(
            &target_literal,
            &defaults_for(&tmp),
            &GlobsetPathMatcher,
            &StdCopyFileSystem,
            &mut RecordingCopyReporter::default(),
        )
        .expect("resolve");
        assert_eq!(spec_resolved.operations.len(), 2);
        assert!(
            spec_resolved
                .operations
                .iter()
                .all(|op| op.path_dst == Path::new("out/fixed.txt"))
        );
    }

    #[test]
    fn rename_function_receives_stem_and_extension() {
        let tmp = tempfile::tempdir().expect("tempdir");
        write_text(&tmp.path().join("bundle.min.js"), "js");

        let target = SpecCopyTarget::new("*.js", "out")
            .with_rename_fn(|name, ext| format!("{ext}-{name}"));
        let spec_resolved = resolve_target(
            &target,
            &defaults_for(&tmp),
            &GlobsetPathMatcher,
            &StdCopyFileSystem,
            &mut RecordingCopyReporter::default(),
        )
        .expect("resolve");
        assert_eq!(
            spec_resolved.operations[0].path_dst,
            PathBuf::from("out/js-bundle.min")
        );
    }

    #[test]
    fn transform_fills_content_for_files() {
        let tmp = tempfile::tempdir().expect("tempdir");
        write_text(&tmp.path().join("index.html"), "<p>hi</p>");

        let target = SpecCopyTarget::new("index.html", ["dist", "www"])
            .with_transform(|raw| raw.to_ascii_uppercase());
        let spec_resolved = resolve_target(
            &target,
            &defaults_for(&tmp),
            &GlobsetPathMatcher,
            &StdCopyFileSystem,
            &mut RecordingCopyReporter::default(),
        )
        .expect("resolve");

        assert_eq!(spec_resolved.operations.len(), 2);
        for spec_operation in &spec_resolved.operations {
            assert_eq!(spec_operation.content.as_deref(), Some(&b"<P>HI</P>"[..]));
        }
        assert!(spec_resolved.warnings.is_empty());
    }

    #[test]
    fn transform_on_directory_warns_and_keeps_plain_copy() {
        let tmp = tempfile::tempdir().expect("tempdir");
        write_text(&tmp.path().join("public/a.txt"), "a");

        let target =
            SpecCopyTarget::new("public", "dist").with_transform(|raw| raw.to_ascii_uppercase());
        let mut reporter = RecordingCopyReporter::default();
        let spec_resolved = resolve_target(
            &target,
            &defaults_for(&tmp),
            &GlobsetPathMatcher,
            &StdCopyFileSystem,
            &mut reporter,
        )
        .expect("resolve");

        assert_eq!(spec_resolved.operations.len(), 1);
        assert!(spec_resolved.operations[0].content.is_none());
        assert_eq!(spec_resolved.operations[0].path_dst, PathBuf::from("dist/public"));
        assert_eq!(spec_resolved.warnings.len(), 1);
        assert!(spec_resolved.warnings[0].contains("only works on files"));
        assert_eq!(reporter.l_events, vec![format!("warn:{}", spec_resolved.warnings[0])]);
    }

    #[cfg(unix)]
    #[test]
    fn warning_is_reported_before_a_later_target_fails() {
        let tmp = tempfile::tempdir().expect("tempdir");
        write_text(&tmp.path().join("public/a.txt"), "a");
        std::os::unix::fs::symlink(tmp.path().join("missing.txt"), tmp.path().join("broken"))
            .expect("symlink");

        let l_targets = vec![
            SpecCopyTarget::new("public", "dist").with_transform(|raw| raw.to_vec()),
            SpecCopyTarget::new("broken", "dist").with_transform(|raw| raw.to_vec()),
        ];
        let mut reporter = RecordingCopyReporter::default();
        let err = resolve_targets(
            &l_targets,
            &defaults_for(&tmp),
            &GlobsetPathMatcher,
            &StdCopyFileSystem,
            &mut reporter,
        )
        .expect_err("broken symlink cannot be read");

        assert!(matches!(err, CopyTargetsError::Io { .. }));
        assert_eq!(reporter.l_events.len(), 1);
        assert!(reporter.l_events[0].starts_with("warn:`transform` option only works on files"));
    }

    #[test]
    fn absolute_rename_stays_under_destination() {
        let tmp = tempfile::tempdir().expect("tempdir");
        write_text(&tmp.path().join("a.txt"), "a");

        let l_cases = [
            (
                SpecCopyTarget::new("a.txt", "build").with_rename("/etc/a.txt"),
                "build/etc/a.txt",
            ),
            (
                SpecCopyTarget::new("a.txt", "build")
                    .with_rename_fn(|name, ext| format!("/{name}.{ext}")),
                "build/a.txt",
            ),
        ];
        for (target, c_expected) in l_cases {
            let spec_resolved = resolve_target(
                &target,
                &defaults_for(&tmp),
                &GlobsetPathMatcher,
                &StdCopyFileSystem,
                &mut RecordingCopyReporter::default(),
            )
            .expect("resolve");
            assert_eq!(spec_resolved.operations[0].path_dst, PathBuf::from(c_expected));
        }
    }

    #[test]
    fn target_options_override_plugin_defaults() {
        let tmp = tempfile::tempdir().expect("tempdir");
        write_text(&tmp.path().join("a.txt"), "a");

        let spec_defaults = SpecCopyExtraOptions {
            if_overwrite: Some(false),
            ..defaults_for(&tmp)
        };
        let target = SpecCopyTarget::new("a.txt", "out").with_extra(SpecCopyExtraOptions {
            if_overwrite: Some(true),
            if_preserve_timestamps: Some(true),
            ..Default::default()
        });
        let spec_resolved = resolve_target(
            &target,
            &spec_defaults,
            &GlobsetPathMatcher,
            &StdCopyFileSystem,
            &mut RecordingCopyReporter::default(),
        )
        .expect("resolve");

        let spec_fs_options = spec_resolved.operations[0].spec_fs_options;
        assert!(spec_fs_options.if_overwrite);
        assert!(spec_fs_options.if_preserve_timestamps);
    }

    #[test]
    fn target_without_src_is_rejected() {
        let target = SpecCopyTarget::new(Vec::<String>::new(), "out");
        let err = validate_target(&target).expect_err("must fail");
        match err {
            CopyTargetsError::InvalidTarget { target, reason } => {
                assert!(target.contains("SpecCopyTarget"));
                assert_eq!(reason, C_REASON_MISSING_SRC_DEST);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(validate_target(&SpecCopyTarget::new("a", "")).is_err());
    }

    #[test]
    fn invalid_target_stops_before_any_resolution() {
        let l_targets = vec![
            SpecCopyTarget::new("first/*", "out"),
            SpecCopyTarget::new(Vec::<String>::new(), "out"),
            SpecCopyTarget::new("last/*", "out"),
        ];
        let path_matcher = RecordingMatcher::default();
        let err = resolve_targets(
            &l_targets,
            &SpecCopyExtraOptions::default(),
            &path_matcher,
            &StdCopyFileSystem,
            &mut RecordingCopyReporter::default(),
        )
        .expect_err("must fail");

        assert!(err.is_config_error());
        assert!(path_matcher.l_calls.borrow().is_empty());
    }

    #[test]
    fn targets_resolve_in_declaration_order() {
        let l_targets = vec![
            SpecCopyTarget::new("b/*", "out"),
            SpecCopyTarget::new(["a/*", "!a/x"], "out"),
        ];
        let path_matcher = RecordingMatcher::default();
        let spec_resolved = resolve_targets(
            &l_targets,
            &SpecCopyExtraOptions::default(),
            &path_matcher,
            &StdCopyFileSystem,
            &mut RecordingCopyReporter::default(),
        )
        .expect("resolve");

        assert_eq!(spec_resolved.cnt_targets, 2);
        assert_eq!(
            *path_matcher.l_calls.borrow(),
            vec![
                vec!["b/*".to_string()],
                vec!["a/*".to_string(), "!a/x".to_string()],
            ]
        );
    }
}
