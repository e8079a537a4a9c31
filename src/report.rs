use std::{fs::File, io, path::{Path, PathBuf}};

use eyre::{Result, WrapErr};
use serde::Serialize;
use tracing::info;

use crate::models::{DetailRow, SummaryRow, TransactionRecord};

pub const DETAIL_HEADER: [&str; 5] = [
    "Nonce",
    "Transaction Hash",
    "Executor",
    "Fee (in Ether)",
    "Execution Date",
];

pub const SUMMARY_HEADER: [&str; 4] = ["ENS Name", "Address", "Amount", "Number of Transactions"];

#[derive(Debug, Clone)]
pub struct ReportPaths {
    pub detail: PathBuf,
    pub summary: PathBuf,
}

/// Only records carrying a nonce are reported, independently of whether they count towards fees.
pub fn detail_rows(txs: &[TransactionRecord]) -> Vec<DetailRow> {
    txs.iter().filter_map(DetailRow::from_record).collect()
}

/// The header is written even when there are no rows.
pub fn write_rows<W, T>(writer: W, header: &[&str], rows: &[T]) -> Result<()>
where
    W: io::Write,
    T: Serialize,
{
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    wtr.write_record(header)?;
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_csv<T: Serialize>(path: &Path, header: &[&str], rows: &[T]) -> Result<()> {
    let file = File::create(path).wrap_err_with(|| format!("creating {}", path.display()))?;
    write_rows(file, header, rows).wrap_err_with(|| format!("writing {}", path.display()))?;
    info!("Written data to {}", path.display());
    Ok(())
}

/// Writes both reports on blocking threads and waits for both to finish.
/// Files are written in place; an interrupted run can leave them partial.
pub async fn write_reports(
    paths: &ReportPaths,
    detail: Vec<DetailRow>,
    summary: Vec<SummaryRow>,
) -> Result<()> {
    let detail_path = paths.detail.clone();
    let detail_task = tokio::task::spawn_blocking(move || {
        write_csv(&detail_path, &DETAIL_HEADER, &detail)
    });

    let summary_path = paths.summary.clone();
    let summary_task = tokio::task::spawn_blocking(move || {
        write_csv(&summary_path, &SUMMARY_HEADER, &summary)
    });

    let (detail_written, summary_written) = tokio::try_join!(detail_task, summary_task)?;
    detail_written?;
    summary_written?;
    Ok(())
}
