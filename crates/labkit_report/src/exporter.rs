//! Report exporter: snapshot in, styled workbook out.

use std::fs;
use std::path::Path;

use chrono::Utc;
use labkit_io_xlsx::{
    SpecCellFormat, SpecXlsxReport, SpecXlsxSheetWriteOptions, SpecXlsxWriteOptions, XlsxWriter,
    derive_default_xlsx_formats,
};

use crate::conf::C_COLOR_HEADER_FONT;
use crate::model::SystemData;
use crate::preview::{SpecReportPreview, generate_preview_data};
use crate::sheets::build_report_sheets;
use crate::spec::{
    ReportError, SpecExportBuffer, SpecExportOutcome, SpecRenderContext, SpecReportOptions,
    SpecSheetLayout,
};
use crate::util::derive_report_filename;

/// Per-sheet writer options: fixed widths, colored bold header, mixed
/// number/placeholder columns rendered as numbers where possible.
pub fn derive_sheet_write_options(layout: &SpecSheetLayout) -> SpecXlsxSheetWriteOptions {
    let cols_integer = layout.cols_integer_or_text();
    SpecXlsxSheetWriteOptions {
        cols_integer: (!cols_integer.is_empty()).then_some(cols_integer),
        widths_col: Some(layout.widths()),
        fmt_header_patch: Some(SpecCellFormat {
            bold: Some(true),
            align: Some("center".to_string()),
            bg_color: Some(layout.color_header.to_string()),
            font_color: Some(C_COLOR_HEADER_FONT.to_string()),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Builds the lab report workbook from a [`SystemData`] snapshot.
#[derive(Debug, Clone, Default)]
pub struct ReportExporter {
    options: SpecReportOptions,
}

impl ReportExporter {
    pub fn new(options: SpecReportOptions) -> Result<Self, ReportError> {
        options.validate()?;
        Ok(Self { options })
    }

    pub fn options(&self) -> &SpecReportOptions {
        &self.options
    }

    /// Resolve "now" and the display offset for one export call.
    pub fn derive_render_context(&self) -> Result<SpecRenderContext, ReportError> {
        Ok(SpecRenderContext {
            now: self.options.now.unwrap_or_else(Utc::now),
            offset: self.options.derive_utc_offset()?,
            date_format: self.options.date_format.clone(),
        })
    }

    /// Write `<app>-Report-<YYYY-MM-DD>.xlsx` into `dir_out`, creating the directory if needed.
    pub fn export_to_xlsx(
        &self,
        data: &SystemData,
        dir_out: &Path,
    ) -> Result<SpecExportOutcome, ReportError> {
        let ctx = self.derive_render_context()?;
        let file_name = derive_report_filename(&self.options.app_name, ctx.now);

        fs::create_dir_all(dir_out).map_err(|source| ReportError::Io {
            path: dir_out.to_path_buf(),
            source,
        })?;
        let path_file_out = dir_out.join(&file_name);

        let mut writer = self.write_workbook(data, &ctx)?;
        writer.save(&path_file_out).map_err(ReportError::Xlsx)?;
        let reports = writer.report();

        tracing::info!(
            file = %path_file_out.display(),
            sheets = reports.len(),
            "report exported"
        );
        Ok(SpecExportOutcome {
            path_file_out,
            file_name,
            reports,
        })
    }

    /// Same workbook as [`Self::export_to_xlsx`], kept in memory.
    pub fn export_to_buffer(&self, data: &SystemData) -> Result<SpecExportBuffer, ReportError> {
        let ctx = self.derive_render_context()?;
        let file_name = derive_report_filename(&self.options.app_name, ctx.now);

        let mut writer = self.write_workbook(data, &ctx)?;
        let bytes = writer.save_to_buffer().map_err(ReportError::Xlsx)?;
        let reports = writer.report();

        tracing::info!(
            file = %file_name,
            sheets = reports.len(),
            bytes = bytes.len(),
            "report rendered to buffer"
        );
        Ok(SpecExportBuffer {
            file_name,
            bytes,
            reports,
        })
    }

    pub fn generate_preview_data<'a>(&self, data: &'a SystemData) -> SpecReportPreview<'a> {
        generate_preview_data(data)
    }

    fn write_workbook(
        &self,
        data: &SystemData,
        ctx: &SpecRenderContext,
    ) -> Result<XlsxWriter, ReportError> {
        let l_sheets = build_report_sheets(data, ctx, self.options.include_user_activity)?;

        let mut writer =
            XlsxWriter::new(derive_default_xlsx_formats(), SpecXlsxWriteOptions::default());
        for sheet in &l_sheets {
            writer
                .write_sheet(
                    &sheet.frame,
                    sheet.layout.sheet_name,
                    &derive_sheet_write_options(&sheet.layout),
                )
                .map_err(ReportError::Xlsx)?;
        }
        log_writer_warnings(&writer.report());
        Ok(writer)
    }
}

fn log_writer_warnings(reports: &[SpecXlsxReport]) {
    for (report, msg) in reports
        .iter()
        .flat_map(|report| report.warnings.iter().map(move |msg| (report, msg)))
    {
        let sheet = report
            .sheets
            .first()
            .map(|slice| slice.sheet_name.as_str())
            .unwrap_or_default();
        tracing::warn!(sheet, "{msg}");
    }
}
