//! Copy plugin constants and configuration-file loading.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::spec::{
    CopyTargetsError, EnumCopyRename, EnumOneOrMany, SpecCopyExtraOptions, SpecCopyPluginOptions,
    SpecCopyTarget,
};

/// Plugin name reported to the host.
pub const C_PLUGIN_NAME: &str = "copy";
/// Lifecycle event used when none is configured.
pub const C_HOOK_DEFAULT: &str = "buildEnd";

/// Header printed before the first copied entry.
pub const C_MSG_HEADER: &str = "copied:";
/// Notice printed when nothing matched.
pub const C_MSG_NOTHING_TO_COPY: &str = "no items to copy";
/// Suffix for entries written from transformed content.
pub const C_MSG_TRANSFORMED_SUFFIX: &str = " (transformed)";

/// Target is not a table/object.
pub const C_REASON_NOT_OBJECT: &str = "target must be an object";
/// Target lacks `src` or `dest`.
pub const C_REASON_MISSING_SRC_DEST: &str = "target must have \"src\" and \"dest\" properties";
/// `rename` has an unsupported type.
pub const C_REASON_INVALID_RENAME: &str =
    "target's \"rename\" property must be a string or a function";

const C_ORIGIN_INLINE: &str = "<inline>";

/// Warning for a transform requested on a matched directory.
pub fn derive_transform_on_directory_warning(path_src: &Path) -> String {
    format!(
        "`transform` option only works on files, not on directories (received {})",
        path_src.display()
    )
}

////////////////////////////////////////////////////////////////////////////////
// #region ConfigFile

#[derive(Debug, Deserialize)]
struct RawCopyPluginOptions {
    #[serde(default)]
    targets: Vec<toml::Value>,
    hook: Option<String>,
    #[serde(default)]
    copy_once: bool,
    #[serde(default)]
    verbose: bool,
    #[serde(flatten)]
    spec_defaults: SpecCopyExtraOptions,
}

#[derive(Debug, Deserialize)]
struct RawCopyTarget {
    #[serde(default)]
    src: EnumOneOrMany<String>,
    #[serde(default)]
    dest: EnumOneOrMany<PathBuf>,
    rename: Option<toml::Value>,
    #[serde(flatten)]
    spec_extra: SpecCopyExtraOptions,
}

/// Read plugin options from a TOML file.
///
/// Missing `src`/`dest` are accepted here and rejected when the hook runs.
pub fn load_plugin_options(path: impl AsRef<Path>) -> Result<SpecCopyPluginOptions, CopyTargetsError> {
    let path_conf = path.as_ref();
    let c_text = std::fs::read_to_string(path_conf).map_err(|e| CopyTargetsError::Config {
        path: path_conf.to_path_buf(),
        message: e.to_string(),
    })?;
    parse_with_origin(&c_text, path_conf)
}

/// Parse plugin options from TOML text.
pub fn parse_plugin_options_toml(c_text: &str) -> Result<SpecCopyPluginOptions, CopyTargetsError> {
    parse_with_origin(c_text, Path::new(C_ORIGIN_INLINE))
}

fn parse_with_origin(
    c_text: &str,
    path_origin: &Path,
) -> Result<SpecCopyPluginOptions, CopyTargetsError> {
    let raw_options: RawCopyPluginOptions =
        toml::from_str(c_text).map_err(|e| CopyTargetsError::Config {
            path: path_origin.to_path_buf(),
            message: e.to_string(),
        })?;

    let mut l_targets = Vec::with_capacity(raw_options.targets.len());
    for value_target in raw_options.targets {
        l_targets.push(convert_target(value_target, path_origin)?);
    }

    Ok(SpecCopyPluginOptions {
        targets: l_targets,
        hook: raw_options
            .hook
            .unwrap_or_else(|| C_HOOK_DEFAULT.to_string()),
        if_copy_once: raw_options.copy_once,
        if_verbose: raw_options.verbose,
        spec_defaults: raw_options.spec_defaults,
    })
}

fn convert_target(
    value_target: toml::Value,
    path_origin: &Path,
) -> Result<SpecCopyTarget, CopyTargetsError> {
    if !value_target.is_table() {
        return Err(CopyTargetsError::InvalidTarget {
            target: value_target.to_string(),
            reason: C_REASON_NOT_OBJECT.to_string(),
        });
    }
    let c_target = value_target.to_string();
    let raw_target: RawCopyTarget =
        value_target
            .try_into()
            .map_err(|e: toml::de::Error| CopyTargetsError::Config {
                path: path_origin.to_path_buf(),
                message: e.to_string(),
            })?;

    let rename = match raw_target.rename {
        None => None,
        Some(toml::Value::String(c_name)) => Some(EnumCopyRename::Literal(c_name)),
        Some(_) => {
            return Err(CopyTargetsError::InvalidTarget {
                target: c_target,
                reason: C_REASON_INVALID_RENAME.to_string(),
            });
        }
    };

    Ok(SpecCopyTarget {
        patterns_src: raw_target.src.into_vec(),
        paths_dest: raw_target.dest.into_vec(),
        rename,
        transform: None,
        spec_extra: raw_target.spec_extra,
    })
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::{
        C_HOOK_DEFAULT, C_REASON_INVALID_RENAME, C_REASON_NOT_OBJECT, load_plugin_options,
        parse_plugin_options_toml,
    };
    use crate::spec::{CopyTargetsError, EnumCopyRename};

    #[test]
    fn empty_config_uses_defaults() {
        let spec_options = parse_plugin_options_toml("").expect("parse");
        assert_eq!(spec_options.hook, C_HOOK_DEFAULT);
        assert!(!spec_options.if_copy_once);
        assert!(!spec_options.if_verbose);
        assert!(spec_options.targets.is_empty());
    }

    #[test]
    fn config_parses_targets_and_passthrough_options() {
        let c_text = r#"
hook = "writeBundle"
copy_once = true
verbose = true
overwrite = false
dot = true

[[targets]]
src = "assets/*.png"
dest = ["build/img", "dist/img"]
rename = "logo.png"

[[targets]]
src = ["static/**", "!static/tmp/**"]
dest = "build/static"
overwrite = true
deep = 2
"#;
        let spec_options = parse_plugin_options_toml(c_text).expect("parse");
        assert_eq!(spec_options.hook, "writeBundle");
        assert!(spec_options.if_copy_once);
        assert!(spec_options.if_verbose);
        assert_eq!(spec_options.spec_defaults.if_overwrite, Some(false));
        assert_eq!(spec_options.spec_defaults.if_dot, Some(true));

        let target_first = &spec_options.targets[0];
        assert_eq!(target_first.patterns_src, vec!["assets/*.png".to_string()]);
        assert_eq!(
            target_first.paths_dest,
            vec![PathBuf::from("build/img"), PathBuf::from("dist/img")]
        );
        assert!(matches!(
            target_first.rename,
            Some(EnumCopyRename::Literal(ref c_name)) if c_name == "logo.png"
        ));

        let target_second = &spec_options.targets[1];
        assert_eq!(target_second.patterns_src.len(), 2);
        assert_eq!(target_second.spec_extra.if_overwrite, Some(true));
        assert_eq!(target_second.spec_extra.depth_limit, Some(2));
    }

    #[test]
    fn missing_src_is_deferred_to_invocation() {
        let spec_options = parse_plugin_options_toml("[[targets]]\ndest = \"out\"\n").expect("parse");
        assert!(spec_options.targets[0].patterns_src.is_empty());
    }

    #[test]
    fn non_table_target_is_rejected() {
        let err = parse_plugin_options_toml("targets = [\"assets/*\"]\n").expect_err("must fail");
        match err {
            CopyTargetsError::InvalidTarget { target, reason } => {
                assert_eq!(target, "\"assets/*\"");
                assert_eq!(reason, C_REASON_NOT_OBJECT);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn non_string_rename_is_rejected() {
        let c_text = "[[targets]]\nsrc = \"a\"\ndest = \"b\"\nrename = 42\n";
        let err = parse_plugin_options_toml(c_text).expect_err("must fail");
        assert!(matches!(
            err,
            CopyTargetsError::InvalidTarget { ref reason, .. } if reason == C_REASON_INVALID_RENAME
        ));
    }

    #[test]
    fn malformed_toml_is_config_error() {
        let err = parse_plugin_options_toml("hook = ").expect_err("must fail");
        assert!(matches!(err, CopyTargetsError::Config { .. }));
        assert!(err.is_config_error());
    }

    #[test]
    fn load_from_file_reads_config() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path_conf = tmp.path().join("copy.toml");
        std::fs::write(&path_conf, "hook = \"generateBundle\"\n").expect("write config");

        let spec_options = load_plugin_options(&path_conf).expect("load");
        assert_eq!(spec_options.hook, "generateBundle");

        let err = load_plugin_options(tmp.path().join("missing.toml")).expect_err("must fail");
        assert!(matches!(err, CopyTargetsError::Config { .. }));
    }
}
