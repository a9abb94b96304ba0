//! Build-lifecycle attachment: the copy plugin, its once-only gate and a
//! minimal host that dispatches named hooks.

use crate::conf::C_PLUGIN_NAME;
use crate::copy::execute_into;
use crate::report::{CopyReporter, LogCopyReporter, ReportCopy, ReportCopyBuilder};
use crate::resolve::resolve_targets;
use crate::spec::{CopyTargetsError, SpecCopyPluginOptions};
use crate::util::{CopyFileSystem, GlobsetPathMatcher, PathMatcher, StdCopyFileSystem};

/// A plugin attached to one named lifecycle event.
pub trait BuildPlugin {
    /// Plugin name.
    fn name(&self) -> &str;
    /// Lifecycle event this plugin handles.
    fn hook_name(&self) -> &str;
    /// Handle the event; the host waits for completion.
    fn run_hook(&mut self) -> Result<ReportCopy, CopyTargetsError>;
}

/// Copy plugin: resolves every target and executes the resulting operations
/// each time its hook fires.
///
/// With `if_copy_once`, only the first successful invocation does any work.
/// The latch is set even when nothing matched, so a once-only plugin attached
/// to a hook that fires before its sources exist never copies them.
pub struct CopyPlugin<M = GlobsetPathMatcher, F = StdCopyFileSystem, R = LogCopyReporter> {
    spec_options: SpecCopyPluginOptions,
    path_matcher: M,
    copy_fs: F,
    reporter: R,
    b_copied: bool,
}

impl CopyPlugin {
    /// Plugin with the default glob matcher, filesystem and log reporter.
    pub fn new(spec_options: SpecCopyPluginOptions) -> Self {
        let reporter = LogCopyReporter {
            if_verbose: spec_options.if_verbose,
        };
        Self::with_collaborators(spec_options, GlobsetPathMatcher, StdCopyFileSystem, reporter)
    }
}

impl<M, F, R> CopyPlugin<M, F, R>
where
    M: PathMatcher,
    F: CopyFileSystem,
    R: CopyReporter,
{
    /// Plugin with explicit collaborators.
    pub fn with_collaborators(
        spec_options: SpecCopyPluginOptions,
        path_matcher: M,
        copy_fs: F,
        reporter: R,
    ) -> Self {
        Self {
            spec_options,
            path_matcher,
            copy_fs,
            reporter,
            b_copied: false,
        }
    }

    /// Construction options.
    pub fn options(&self) -> &SpecCopyPluginOptions {
        &self.spec_options
    }

    /// Whether a non-skipped invocation has completed.
    pub fn has_copied(&self) -> bool {
        self.b_copied
    }

    /// The reporter receiving progress notifications.
    pub fn reporter(&self) -> &R {
        &self.reporter
    }

    /// Run one hook invocation: resolve all targets, then execute in order.
    pub fn run(&mut self) -> Result<ReportCopy, CopyTargetsError> {
        let mut builder_cp_report = ReportCopyBuilder::default();
        if self.spec_options.if_copy_once && self.b_copied {
            log::debug!("Copy targets already processed once; skipping");
            builder_cp_report.mark_skipped_once();
            return Ok(builder_cp_report.build());
        }

        let spec_resolved = resolve_targets(
            &self.spec_options.targets,
            &self.spec_options.spec_defaults,
            &self.path_matcher,
            &self.copy_fs,
            &mut self.reporter,
        )?;
        builder_cp_report.add_targets(spec_resolved.cnt_targets);
        builder_cp_report.add_matched(spec_resolved.cnt_matched);
        for warning in spec_resolved.warnings {
            builder_cp_report.add_warning(warning);
        }

        execute_into(
            &spec_resolved.operations,
            &self.copy_fs,
            &mut self.reporter,
            &mut builder_cp_report,
        )?;
        self.b_copied = true;

        let report = builder_cp_report.build();
        log::debug!("{report}");
        Ok(report)
    }
}

impl<M, F, R> BuildPlugin for CopyPlugin<M, F, R>
where
    M: PathMatcher,
    F: CopyFileSystem,
    R: CopyReporter,
{
    fn name(&self) -> &str {
        C_PLUGIN_NAME
    }

    fn hook_name(&self) -> &str {
        &self.spec_options.hook
    }

    fn run_hook(&mut self) -> Result<ReportCopy, CopyTargetsError> {
        self.run()
    }
}

/// Minimal build host: plugins register once and run when their hook fires.
#[derive(Default)]
pub struct PluginHost {
    l_plugins: Vec<Box<dyn BuildPlugin>>,
}

impl PluginHost {
    /// Attach a plugin.
    pub fn register<P>(&mut self, plugin: P) -> &mut Self
    where
        P: BuildPlugin + 'static,
    {
        self.l_plugins.push(Box::new(plugin));
        self
    }

    /// Names of the registered plugins, in registration order.
    pub fn plugin_names(&self) -> Vec<&str> {
        self.l_plugins.iter().map(|p| p.name()).collect()
    }

    /// Fire `hook_name`: run every attached plugin in registration order,
    /// stopping at the first failure.
    pub fn emit(&mut self, hook_name: &str) -> Result<Vec<ReportCopy>, CopyTargetsError> {
        let mut l_reports = Vec::new();
        for plugin in self
            .l_plugins
            .iter_mut()
            .filter(|p| p.hook_name() == hook_name)
        {
            log::debug!("Running plugin `{}` on `{hook_name}`", plugin.name());
            l_reports.push(plugin.run_hook()?);
        }
        Ok(l_reports)
    }
}
