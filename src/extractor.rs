use std::path::Path;

use eyre::{Result, WrapErr};
use tracing::{debug, info, warn};

use crate::aggregator::FeeSummary;
use crate::fetcher::TransactionSource;
use crate::loader;
use crate::models::TransactionRecord;
use crate::report::{self, ReportPaths};

pub struct Extraction {
    /// Every fetched record, in fetch order.
    pub transactions: Vec<TransactionRecord>,
    pub summary: FeeSummary,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunStats {
    pub safes: usize,
    pub rejected_rows: usize,
    pub transactions: usize,
    pub detail_rows: usize,
    pub executors: usize,
}

/// Fetches safes one after the other, folding each history into the summary
/// before the next safe is requested. The first fetch error aborts the run.
pub async fn collect<S: TransactionSource>(source: &S, safes: &[String]) -> Result<Extraction> {
    let mut transactions = Vec::new();
    let mut summary = FeeSummary::new();

    for safe in safes {
        info!(%safe, "Fetching transactions for safe");
        let txs = source
            .fetch_all(safe)
            .await
            .wrap_err_with(|| format!("fetching transactions for safe {safe}"))?;
        let counted = summary.extend(&txs);
        debug!(%safe, fetched = txs.len(), counted, "Safe processed");
        transactions.extend(txs);
    }

    Ok(Extraction { transactions, summary })
}

pub async fn run<S: TransactionSource>(
    source: &S,
    safes_path: &Path,
    reports: &ReportPaths,
) -> Result<RunStats> {
    let loaded = loader::load_safes(safes_path)?;
    let extraction = collect(source, &loaded.addresses).await?;
    if extraction.summary.is_empty() {
        warn!("No executed transactions with fees found");
    }

    let detail = report::detail_rows(&extraction.transactions);
    let summary = extraction.summary.rows();
    let stats = RunStats {
        safes: loaded.addresses.len(),
        rejected_rows: loaded.rejected.len(),
        transactions: extraction.transactions.len(),
        detail_rows: detail.len(),
        executors: extraction.summary.len(),
    };

    report::write_reports(reports, detail, summary).await?;
    info!(
        safes = stats.safes,
        rejected = stats.rejected_rows,
        transactions = stats.transactions,
        executors = stats.executors,
        "Export finished"
    );
    Ok(stats)
}
