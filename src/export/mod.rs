//! Spreadsheet export of the inspection log.
//!
//! One sheet, one row per record in id order, columns `Date, CodeA, CodeB, Result`.
//! The default output is an xlsx workbook; a `.csv` path gets the same table as CSV.

use std::{
    fmt::Write as _,
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use anyhow::{anyhow, bail, Context, Result};
use chrono::Local;
use rust_xlsxwriter::{Format, Workbook};

use crate::{db::InspectionRecord, settings::ExportSettings};

pub const COLUMNS: [&str; 4] = ["Date", "CodeA", "CodeB", "Result"];

const SHEET_NAME_MAX_CHARS: usize = 31;
const SHEET_NAME_FORBIDDEN: [char; 7] = ['[', ']', ':', '*', '?', '/', '\\'];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Xlsx,
    Csv,
}

impl ExportFormat {
    /// Picks the format from the file extension; anything but `.csv` is xlsx.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => ExportFormat::Csv,
            _ => ExportFormat::Xlsx,
        }
    }
}

/// Whether Excel accepts `name` as a worksheet name.
pub fn is_valid_sheet_name(name: &str) -> bool {
    let length = name.chars().count();
    (1..=SHEET_NAME_MAX_CHARS).contains(&length)
        && !name.contains(SHEET_NAME_FORBIDDEN)
        && !name.starts_with('\'')
        && !name.ends_with('\'')
}

fn format_date(record: &InspectionRecord, date_format: &str) -> Result<String> {
    let mut date = String::new();
    write!(
        date,
        "{}",
        record.timestamp.with_timezone(&Local).format(date_format)
    )
    .map_err(|_| anyhow!("invalid export date format {date_format:?}"))?;
    Ok(date)
}

/// Builds a workbook holding a single sheet named `sheet_name`.
///
/// The date column is rendered in local time with `date_format` (chrono
/// strftime syntax) and written as text.
pub fn build_workbook(
    records: &[InspectionRecord],
    sheet_name: &str,
    date_format: &str,
) -> Result<Workbook> {
    if !is_valid_sheet_name(sheet_name) {
        bail!("invalid worksheet name {sheet_name:?}");
    }

    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();
    let worksheet = workbook.add_worksheet();
    worksheet
        .set_name(sheet_name)
        .with_context(|| format!("failed to name worksheet {sheet_name:?}"))?;

    for (col, title) in (0u16..).zip(COLUMNS) {
        worksheet
            .write_string_with_format(0, col, title, &header)
            .context("failed to write export header")?;
    }

    for (index, record) in records.iter().enumerate() {
        let row = u32::try_from(index + 1).context("too many inspections for one worksheet")?;
        let date = format_date(record, date_format)?;
        let cells = [
            date.as_str(),
            record.code_a.as_str(),
            record.code_b.as_str(),
            record.outcome.label(),
        ];
        for (col, value) in (0u16..).zip(cells) {
            worksheet
                .write_string(row, col, value)
                .with_context(|| format!("failed to write export row for inspection {}", record.id))?;
        }
    }

    worksheet.autofit();

    Ok(workbook)
}

/// Writes `records` as CSV and returns the number of data rows.
pub fn write_csv<W: Write>(
    records: &[InspectionRecord],
    writer: W,
    date_format: &str,
) -> Result<usize> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer
        .write_record(COLUMNS)
        .context("failed to write export header")?;

    for record in records {
        let date = format_date(record, date_format)?;
        csv_writer
            .write_record([
                date.as_str(),
                record.code_a.as_str(),
                record.code_b.as_str(),
                record.outcome.label(),
            ])
            .with_context(|| format!("failed to write export row for inspection {}", record.id))?;
    }

    csv_writer.flush().context("failed to flush export")?;
    Ok(records.len())
}

/// Writes the export file at `path` and returns the number of data rows.
pub fn export_to_path(
    records: &[InspectionRecord],
    path: &Path,
    settings: &ExportSettings,
) -> Result<usize> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create export directory {}", parent.display()))?;
    }

    match ExportFormat::from_path(path) {
        ExportFormat::Xlsx => {
            let mut workbook = build_workbook(records, &settings.sheet_name, &settings.date_format)?;
            workbook
                .save(path)
                .with_context(|| format!("failed to export inspections to {}", path.display()))?;
            Ok(records.len())
        }
        ExportFormat::Csv => {
            let file = File::create(path)
                .with_context(|| format!("failed to create export file {}", path.display()))?;
            write_csv(records, BufWriter::new(file), &settings.date_format)
                .with_context(|| format!("failed to export inspections to {}", path.display()))
        }
    }
}
