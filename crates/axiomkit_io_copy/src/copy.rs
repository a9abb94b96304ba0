//! Sequential execution of resolved copy operations.

use crate::report::{CopyReporter, ReportCopy, ReportCopyBuilder, SpecCopyEntry};
use crate::spec::{CopyTargetsError, SpecCopyOperation};
use crate::util::CopyFileSystem;

/// Execute `operations` in order and return the run report.
///
/// Operations with `content` are written to their destination; the others are
/// copied recursively from their source. Missing parent directories are
/// created in both cases. The first failure aborts the remaining queue and is
/// returned as-is; operations already committed are not rolled back.
pub fn execute_operations<F, R>(
    operations: &[SpecCopyOperation],
    copy_fs: &F,
    reporter: &mut R,
) -> Result<ReportCopy, CopyTargetsError>
where
    F: CopyFileSystem + ?Sized,
    R: CopyReporter + ?Sized,
{
    let mut builder_cp_report = ReportCopyBuilder::default();
    execute_into(operations, copy_fs, reporter, &mut builder_cp_report)?;
    Ok(builder_cp_report.build())
}

pub(crate) fn execute_into<F, R>(
    operations: &[SpecCopyOperation],
    copy_fs: &F,
    reporter: &mut R,
    builder_cp_report: &mut ReportCopyBuilder,
) -> Result<(), CopyTargetsError>
where
    F: CopyFileSystem + ?Sized,
    R: CopyReporter + ?Sized,
{
    builder_cp_report.add_planned(operations.len() as u64);
    if operations.is_empty() {
        reporter.on_nothing_to_copy();
        return Ok(());
    }

    reporter.on_header();
    for spec_operation in operations {
        match &spec_operation.content {
            Some(content) => copy_fs.write_file_creating_dirs(
                &spec_operation.path_dst,
                content,
                &spec_operation.spec_fs_options,
            )?,
            None => copy_fs.copy_recursive(
                &spec_operation.path_src,
                &spec_operation.path_dst,
                &spec_operation.spec_fs_options,
            )?,
        }

        let spec_entry = SpecCopyEntry::from(spec_operation);
        reporter.on_copied(&spec_entry);
        builder_cp_report.add_copied(spec_entry);
    }
    Ok(())
}
