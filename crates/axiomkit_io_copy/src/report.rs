//! Copy report models, mutable report builder and console reporting.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use axiomkit_log::{paint_notice, paint_strong, paint_success};

use crate::conf::{C_MSG_HEADER, C_MSG_NOTHING_TO_COPY, C_MSG_TRANSFORMED_SUFFIX};
use crate::spec::SpecCopyOperation;

/// One completed copy/write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecCopyEntry {
    /// Matched source path.
    pub path_src: PathBuf,
    /// Written destination path.
    pub path_dst: PathBuf,
    /// Destination was written from transformed content.
    pub if_transformed: bool,
}

impl From<&SpecCopyOperation> for SpecCopyEntry {
    fn from(spec_operation: &SpecCopyOperation) -> Self {
        Self {
            path_src: spec_operation.path_src.clone(),
            path_dst: spec_operation.path_dst.clone(),
            if_transformed: spec_operation.is_transformed(),
        }
    }
}

/// Aggregate counters and diagnostics for one hook invocation.
#[derive(Debug, Default, Clone)]
pub struct ReportCopy {
    /// Number of resolved copy targets.
    pub cnt_targets: u64,
    /// Number of matched source paths across all targets.
    pub cnt_matched: u64,
    /// Number of planned operations (matches x destinations).
    pub cnt_planned: u64,
    /// Number of operations committed.
    pub cnt_copied: u64,
    /// Number of committed operations written from transformed content.
    pub cnt_transformed: u64,
    /// Invocation skipped because the once-only latch was already set.
    pub if_skipped_once: bool,
    /// Non-fatal warnings collected during resolution.
    pub warnings: Vec<String>,
    /// Committed operations, in execution order.
    pub entries: Vec<SpecCopyEntry>,
}

impl ReportCopy {
    /// Number of collected warnings.
    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    /// Machine-readable counters.
    pub fn to_dict(&self) -> BTreeMap<String, u64> {
        let mut dict_counts = BTreeMap::new();
        dict_counts.insert("cnt_targets".to_string(), self.cnt_targets);
        dict_counts.insert("cnt_matched".to_string(), self.cnt_matched);
        dict_counts.insert("cnt_planned".to_string(), self.cnt_planned);
        dict_counts.insert("cnt_copied".to_string(), self.cnt_copied);
        dict_counts.insert("cnt_transformed".to_string(), self.cnt_transformed);
        dict_counts.insert("cnt_warnings".to_string(), self.warning_count() as u64);
        dict_counts
    }

    /// Human-readable one-line summary.
    pub fn format(&self, prefix: &str) -> String {
        if self.if_skipped_once {
            return format!("{prefix} skipped (already copied once)");
        }
        let dict_counts = self.to_dict();
        format!(
            "{prefix} targets={} matched={} planned={} copied={} transformed={} warnings={}",
            dict_counts["cnt_targets"],
            dict_counts["cnt_matched"],
            dict_counts["cnt_planned"],
            dict_counts["cnt_copied"],
            dict_counts["cnt_transformed"],
            dict_counts["cnt_warnings"]
        )
    }
}

impl fmt::Display for ReportCopy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format("[COPY]"))
    }
}

/// Mutable accumulator for copy statistics.
#[derive(Debug, Default, Clone)]
pub struct ReportCopyBuilder {
    report: ReportCopy,
}

impl ReportCopyBuilder {
    /// Count resolved targets.
    pub fn add_targets(&mut self, value: u64) {
        self.report.cnt_targets += value;
    }

    /// Count matched source paths.
    pub fn add_matched(&mut self, value: u64) {
        self.report.cnt_matched += value;
    }

    /// Count planned operations.
    pub fn add_planned(&mut self, value: u64) {
        self.report.cnt_planned += value;
    }

    /// Record one committed operation.
    pub fn add_copied(&mut self, spec_entry: SpecCopyEntry) {
        self.report.cnt_copied += 1;
        if spec_entry.if_transformed {
            self.report.cnt_transformed += 1;
        }
        self.report.entries.push(spec_entry);
    }

    /// Add warning message.
    pub fn add_warning(&mut self, warning: String) {
        self.report.warnings.push(warning);
    }

    /// Mark the invocation as skipped by the once-only latch.
    pub fn mark_skipped_once(&mut self) {
        self.report.if_skipped_once = true;
    }

    /// Finalize builder into immutable report.
    pub fn build(self) -> ReportCopy {
        self.report
    }
}

////////////////////////////////////////////////////////////////////////////////
// #region Reporter

/// Receives progress notifications while a hook invocation runs.
pub trait CopyReporter {
    /// Non-fatal resolution warning.
    fn on_warning(&mut self, warning: &str);
    /// Emitted once before the first operation.
    fn on_header(&mut self);
    /// Emitted after each committed operation.
    fn on_copied(&mut self, spec_entry: &SpecCopyEntry);
    /// Emitted when no operation was planned.
    fn on_nothing_to_copy(&mut self);
}

/// Line printed for one committed operation.
pub fn format_copied_line(spec_entry: &SpecCopyEntry) -> String {
    let c_suffix = if spec_entry.if_transformed {
        C_MSG_TRANSFORMED_SUFFIX
    } else {
        ""
    };
    paint_success(&format!(
        "  {} → {}{c_suffix}",
        paint_strong(&spec_entry.path_src.display().to_string()),
        paint_strong(&spec_entry.path_dst.display().to_string()),
    ))
}

/// [`CopyReporter`] writing through the `log` facade.
///
/// Warnings are always logged; progress lines only when verbose.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogCopyReporter {
    /// Emit header, per-operation and nothing-to-copy lines.
    pub if_verbose: bool,
}

impl CopyReporter for LogCopyReporter {
    fn on_warning(&mut self, warning: &str) {
        log::warn!("{}", paint_notice(warning));
    }

    fn on_header(&mut self) {
        if self.if_verbose {
            log::info!("{}", paint_success(C_MSG_HEADER));
        }
    }

    fn on_copied(&mut self, spec_entry: &SpecCopyEntry) {
        if self.if_verbose {
            log::info!("{}", format_copied_line(spec_entry));
        }
    }

    fn on_nothing_to_copy(&mut self) {
        if self.if_verbose {
            log::info!("{}", paint_notice(C_MSG_NOTHING_TO_COPY));
        }
    }
}

/// Reporter that keeps plain-text events, for assertions.
#[cfg(test)]
#[derive(Debug, Default, Clone)]
pub(crate) struct RecordingCopyReporter {
    pub(crate) l_events: Vec<String>,
}

#[cfg(test)]
impl CopyReporter for RecordingCopyReporter {
    fn on_warning(&mut self, warning: &str) {
        self.l_events.push(format!("warn:{warning}"));
    }

    fn on_header(&mut self) {
        self.l_events.push(C_MSG_HEADER.to_string());
    }

    fn on_copied(&mut self, spec_entry: &SpecCopyEntry) {
        self.l_events.push(format!(
            "{} -> {}{}",
            spec_entry.path_src.display(),
            spec_entry.path_dst.display(),
            if spec_entry.if_transformed {
                C_MSG_TRANSFORMED_SUFFIX
            } else {
                ""
            }
        ));
    }

    fn on_nothing_to_copy(&mut self) {
        self.l_events.push(C_MSG_NOTHING_TO_COPY.to_string());
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
