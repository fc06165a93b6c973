//! Report template detection from file names.

use rmm_audit_report_models::ReportTemplate;

use crate::ReportError;

/// Every template the extractor can handle.
pub const SUPPORTED_TEMPLATES: &[ReportTemplate] = &[ReportTemplate::DetailedComputerAudit];

/// Picks the template whose marker text appears in `file_name`.
///
/// # Errors
///
/// Returns [`ReportError::UnsupportedReport`] when no template matches.
pub fn detect_template(file_name: &str) -> Result<ReportTemplate, ReportError> {
    SUPPORTED_TEMPLATES
        .iter()
        .copied()
        .find(|template| file_name.contains(template.file_name_marker()))
        .ok_or_else(|| ReportError::UnsupportedReport {
            file_name: file_name.to_owned(),
        })
}
