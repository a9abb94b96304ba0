//! `axiomkit_io_copy` v1:
//! Build-hook copy engine: glob-matched sources copied (or transformed and
//! written) into one or more destination directories.
//!
//! Modules:
//! - `spec`    : targets/options/operations/errors
//! - `conf`    : constants and configuration-file loading
//! - `resolve` : target validation and resolution into operations
//! - `copy`    : sequential operation execution
//! - `report`  : run-time report model and reporters
//! - `hook`    : plugin, once-only gate and lifecycle host
//! - `util`    : glob-matching and filesystem collaborators

pub mod conf;
pub mod copy;
pub mod hook;
pub mod report;
pub mod resolve;
pub mod spec;
mod util;

pub use conf::{
    C_HOOK_DEFAULT, C_PLUGIN_NAME, load_plugin_options, parse_plugin_options_toml,
};
pub use copy::execute_operations;
pub use hook::{BuildPlugin, CopyPlugin, PluginHost};
pub use report::{
    CopyReporter, LogCopyReporter, ReportCopy, ReportCopyBuilder, SpecCopyEntry,
    format_copied_line,
};
pub use resolve::{SpecResolvedTargets, resolve_target, resolve_targets, validate_target};
pub use spec::{
    CopyTargetsError, EnumCopyRename, EnumOneOrMany, FnCopyRename, FnCopyTransform,
    SpecCopyExtraOptions, SpecCopyOperation, SpecCopyPluginOptions, SpecCopyTarget,
    SpecFsOptions, SpecGlobOptions,
};
pub use util::{CopyFileSystem, GlobsetPathMatcher, PathMatcher, StdCopyFileSystem};
