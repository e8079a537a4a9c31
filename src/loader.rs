use std::{fs::File, io, path::Path};

use eyre::{Result, WrapErr};
use tracing::warn;

use crate::models;

#[derive(Debug, Default)]
pub struct LoadedSafes {
    /// Checksummed, in file order, duplicates kept.
    pub addresses: Vec<String>,
    pub rejected: Vec<RejectedRow>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RejectedRow {
    pub line: u64,
    pub value: String,
    pub reason: String,
}

pub fn load_safes(path: &Path) -> Result<LoadedSafes> {
    let file = File::open(path).wrap_err_with(|| format!("opening safes file {}", path.display()))?;
    read_safes(file)
}

/// First line is a header. Only the first column is read; rows may have any width.
pub fn read_safes<R: io::Read>(input: R) -> Result<LoadedSafes> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(input);

    let mut loaded = LoadedSafes::default();
    // Byte records so that a row with broken UTF-8 is rejected on its own.
    for result in rdr.byte_records() {
        let record = result?;
        let field = String::from_utf8_lossy(record.get(0).unwrap_or_default());
        let raw = field.trim();
        match models::checksum_address(raw) {
            Ok(addr) => loaded.addresses.push(addr),
            Err(err) => {
                let row = RejectedRow {
                    line: record.position().map_or(0, |p| p.line()),
                    value: raw.to_string(),
                    reason: err.to_string(),
                };
                warn!(line = row.line, value = %row.value, error = %row.reason, "Invalid address format");
                loaded.rejected.push(row);
            }
        }
    }
    Ok(loaded)
}
