use std::str::FromStr;

use alloy_primitives::Address;
use eyre::{Result, eyre};
use serde::{Deserialize, Serialize, Serializer};

/// Fees arrive in wei; reports are in ether.
pub const WEI_PER_ETHER: f64 = 1e18;

/// Fractional digits of the summary `Amount` column.
pub const AMOUNT_DECIMALS: usize = 18;

pub fn parse_address(s: &str) -> Result<Address> {
    Address::from_str(s).map_err(|e| eyre!("Invalid address: {} ({})", s, e))
}

/// Canonical EIP-55 form, whatever the case of the input.
pub fn checksum_address(s: &str) -> Result<String> {
    Ok(parse_address(s)?.to_checksum(None))
}

/// Raw fee as the indexer returns it: usually a decimal string, sometimes a bare number.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Wei {
    Text(String),
    Number(serde_json::Number),
}

impl Wei {
    /// Empty strings and a numeric zero count as "no fee".
    pub fn is_present(&self) -> bool {
        match self {
            Wei::Text(s) => !s.is_empty(),
            Wei::Number(n) => n.as_f64().map_or(true, |v| v != 0.0),
        }
    }

    /// NaN when the amount does not parse.
    pub fn to_ether(&self) -> f64 {
        let wei = match self {
            Wei::Text(s) => s.trim().parse::<f64>().unwrap_or(f64::NAN),
            Wei::Number(n) => n.as_f64().unwrap_or(f64::NAN),
        };
        wei / WEI_PER_ETHER
    }
}

/// Safe nonce: a JSON number, or a string from some indexer versions.
/// Written to the report as it arrived.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Nonce {
    Number(u64),
    Text(String),
}

impl From<u64> for Nonce {
    fn from(n: u64) -> Self {
        Nonce::Number(n)
    }
}

/// One entry of a safe's transaction history. Every field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TransactionRecord {
    pub nonce: Option<Nonce>,
    pub transaction_hash: Option<String>,
    pub executor: Option<String>,
    pub fee: Option<Wei>,
    pub execution_date: Option<String>,
}

impl TransactionRecord {
    pub fn credited_executor(&self) -> Option<&str> {
        self.executor.as_deref().filter(|e| !e.is_empty())
    }

    pub fn present_fee(&self) -> Option<&Wei> {
        self.fee.as_ref().filter(|f| f.is_present())
    }

    pub fn fee_in_ether(&self) -> f64 {
        self.present_fee().map_or(f64::NAN, Wei::to_ether)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ExecutorTotals {
    pub total_fee: f64,
    pub tx_count: u64,
}

/// Plain decimal notation (`0.0000055`, `1`, `NaN`), never exponent form.
fn serialize_plain_f64<S>(num: &f64, ser: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    ser.collect_str(num)
}

#[derive(Debug, Clone, Serialize)]
pub struct DetailRow {
    pub nonce: Nonce,
    pub transaction_hash: String,
    pub executor: String,
    #[serde(serialize_with = "serialize_plain_f64")]
    pub fee: f64,
    pub execution_date: String,
}

impl DetailRow {
    /// Records without a nonce never reach the detail report.
    pub fn from_record(tx: &TransactionRecord) -> Option<Self> {
        Some(Self {
            nonce: tx.nonce.clone()?,
            transaction_hash: tx.transaction_hash.clone().unwrap_or_default(),
            executor: tx.executor.clone().unwrap_or_default(),
            fee: tx.fee_in_ether(),
            execution_date: tx.execution_date.clone().unwrap_or_default(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRow {
    /// ENS resolution is not done; the column stays empty.
    pub ens_name: String,
    pub address: String,
    pub amount: String,
    pub number_of_txs: u64,
}

impl SummaryRow {
    pub fn new(address: &str, totals: &ExecutorTotals) -> Self {
        Self {
            ens_name: String::new(),
            address: address.to_string(),
            amount: format!("{:.*}", AMOUNT_DECIMALS, totals.total_fee),
            number_of_txs: totals.tx_count,
        }
    }
}
