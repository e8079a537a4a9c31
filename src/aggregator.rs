use std::collections::HashMap;

use crate::models::{ExecutorTotals, SummaryRow, TransactionRecord};

/// Per-executor fee totals, in the order executors were first seen.
///
/// Totals are `f64` sums taken in fetch order, so the last bits of a total
/// can differ if the same records arrive in a different order.
#[derive(Debug, Default)]
pub struct FeeSummary {
    index: HashMap<String, usize>,
    executors: Vec<(String, ExecutorTotals)>,
}

impl FeeSummary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns whether the record was counted. It needs both an executor and a fee that converts to a finite amount.
    pub fn record(&mut self, tx: &TransactionRecord) -> bool {
        let (Some(executor), Some(fee)) = (tx.credited_executor(), tx.present_fee()) else {
            return false;
        };
        let ether = fee.to_ether();
        if !ether.is_finite() {
            return false;
        }

        let slot = match self.index.get(executor) {
            Some(&i) => i,
            None => {
                self.executors.push((executor.to_string(), ExecutorTotals::default()));
                self.index.insert(executor.to_string(), self.executors.len() - 1);
                self.executors.len() - 1
            }
        };
        let totals = &mut self.executors[slot].1;
        totals.total_fee += ether;
        totals.tx_count += 1;
        true
    }

    pub fn extend<'a, I>(&mut self, txs: I) -> usize
    where
        I: IntoIterator<Item = &'a TransactionRecord>,
    {
        txs.into_iter().filter(|tx| self.record(tx)).count()
    }

    #[cfg(test)]
    pub fn get(&self, executor: &str) -> Option<&ExecutorTotals> {
        self.index.get(executor).map(|&i| &self.executors[i].1)
    }

    pub fn len(&self) -> usize {
        self.executors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.executors.is_empty()
    }

    pub fn rows(&self) -> Vec<SummaryRow> {
        self.executors
            .iter()
            .map(|(address, totals)| SummaryRow::new(address, totals))
            .collect()
    }
}
