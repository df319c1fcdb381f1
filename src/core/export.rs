use crate::domain::model::Record;
use crate::utils::error::{FraError, Result};
use csv::{QuoteStyle, Terminator, WriterBuilder};
use serde::{Deserialize, Serialize};

/// One exported column: display header and the record field it reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportColumn {
    pub header: String,
    pub field: String,
}

impl ExportColumn {
    pub fn new(header: &str, field: &str) -> Self {
        Self {
            header: header.to_string(),
            field: field.to_string(),
        }
    }
}

/// Column layout of the claims table export.
pub fn claim_columns() -> Vec<ExportColumn> {
    [
        ("ID", "id"),
        ("Holder", "holder"),
        ("Village", "village"),
        ("District", "district"),
        ("State", "state"),
        ("Latitude", "lat"),
        ("Longitude", "lon"),
        ("Status", "status"),
        ("Area", "area"),
        ("Tribe", "tribe"),
    ]
    .into_iter()
    .map(|(header, field)| ExportColumn::new(header, field))
    .collect()
}

/// Writes a plain header row followed by one row per record in which every
/// field is quoted and embedded quotes are doubled. Missing fields export as
/// an empty quoted string.
pub fn export_csv(records: &[Record], columns: &[ExportColumn]) -> Result<String> {
    let mut buffer = Vec::new();

    {
        let mut header = WriterBuilder::new()
            .quote_style(QuoteStyle::Necessary)
            .terminator(Terminator::Any(b'\n'))
            .from_writer(&mut buffer);
        header.write_record(columns.iter().map(|c| c.header.as_str()))?;
        header.flush()?;
    }

    {
        let mut rows = WriterBuilder::new()
            .quote_style(QuoteStyle::Always)
            .terminator(Terminator::Any(b'\n'))
            .from_writer(&mut buffer);
        for record in records {
            rows.write_record(
                columns
                    .iter()
                    .map(|c| record.field_text(&c.field).unwrap_or_default()),
            )?;
        }
        rows.flush()?;
    }

    String::from_utf8(buffer).map_err(|e| FraError::ProcessingError {
        message: format!("CSV output is not valid UTF-8: {}", e),
    })
}
