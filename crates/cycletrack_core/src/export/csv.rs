//! CSV writer for the cycle history table.
//!
//! One row per record, columns matching the history view. Quoting follows
//! RFC 4180: fields containing a comma, quote, CR or LF are wrapped in quotes
//! with inner quotes doubled.

use crate::model::cycle::{CycleRecord, ISO_DATE_FORMAT};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io::Write;

pub const CSV_HEADER: [&str; 9] = [
    "ID",
    "Start Date",
    "End Date",
    "Cycle Length",
    "Period Length",
    "Symptoms",
    "Mood",
    "Flow",
    "Notes",
];

const MISSING_VALUE: &str = "N/A";
const MISSING_TEXT: &str = "None";

#[derive(Debug)]
pub enum ExportError {
    Io(std::io::Error),
}

impl Display for ExportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "export failed: {err}"),
        }
    }
}

impl Error for ExportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for ExportError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

/// Writes the header plus one line per record, in slice order.
///
/// Returns the number of data rows written.
pub fn write_csv<W: Write>(records: &[CycleRecord], mut writer: W) -> Result<usize, ExportError> {
    write_row(&mut writer, CSV_HEADER.iter().map(|column| column.to_string()))?;
    for record in records {
        write_row(&mut writer, record_fields(record))?;
    }
    writer.flush()?;
    Ok(records.len())
}

fn record_fields(record: &CycleRecord) -> [String; 9] {
    [
        record.id.to_string(),
        record.start_date.format(ISO_DATE_FORMAT).to_string(),
        record.end_date.format(ISO_DATE_FORMAT).to_string(),
        record
            .cycle_length
            .map_or_else(|| MISSING_VALUE.to_string(), |days| days.to_string()),
        record.period_length.to_string(),
        if record.symptoms.is_empty() {
            MISSING_TEXT.to_string()
        } else {
            record.symptoms.join(", ")
        },
        record.mood.clone().unwrap_or_else(|| MISSING_VALUE.to_string()),
        record
            .flow_level
            .clone()
            .unwrap_or_else(|| MISSING_VALUE.to_string()),
        record.notes.clone().unwrap_or_else(|| MISSING_TEXT.to_string()),
    ]
}

fn write_row<W: Write>(
    writer: &mut W,
    fields: impl IntoIterator<Item = String>,
) -> Result<(), ExportError> {
    let line = fields
        .into_iter()
        .map(|field| escape_field(&field))
        .collect::<Vec<_>>()
        .join(",");
    writer.write_all(line.as_bytes())?;
    writer.write_all(b"\r\n")?;
    Ok(())
}

fn escape_field(field: &str) -> String {
    if field.contains([',', '"', '\r', '\n']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::escape_field;

    #[test]
    fn plain_fields_are_not_quoted() {
        assert_eq!(escape_field("Cramps"), "Cramps");
    }

    #[test]
    fn special_characters_force_quoting() {
        assert_eq!(escape_field("Cramps, Bloating"), "\"Cramps, Bloating\"");
        assert_eq!(escape_field("said \"ouch\""), "\"said \"\"ouch\"\"\"");
        assert_eq!(escape_field("line1\nline2"), "\"line1\nline2\"");
    }
}
