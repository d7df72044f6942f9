use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::{collections::HashSet, fmt, path::PathBuf, str::FromStr};
use thiserror::Error;

pub type Address = String;
pub type Line = u64;

/// Layout of every timestamp we read or write, always UTC without offset.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A transfer as the aggregator sees it. An empty `From` or `To` cell (minting,
/// burning, or just a broken export) becomes `None` and that leg is skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRecord {
    pub from: Option<Address>,
    pub to: Option<Address>,
    pub value: Decimal,
    pub timestamp: NaiveDateTime,
}

/// A row straight out of the CSV export. Value and timestamp stay textual here
/// so that a bad cell can be reported with its line instead of a generic serde
/// message. Extra columns of the export are ignored, but all four of these must
/// be there: a missing `From` column is not the same as empty `From` cells.
#[derive(Debug, Deserialize)]
pub struct RawTransfer {
    #[serde(rename = "From")]
    pub from: String,
    #[serde(rename = "To")]
    pub to: String,
    #[serde(rename = "TokenValue")]
    pub value: String,
    #[serde(rename = "DateTime (UTC)")]
    pub timestamp: String,
}

impl RawTransfer {
    pub fn into_transfer(self, line: Line) -> Result<TransferRecord, RecordError> {
        let value = parse_value(&self.value).ok_or_else(|| RecordError::ValueParse {
            line,
            value: self.value.clone(),
        })?;
        let timestamp = parse_timestamp(&self.timestamp).ok_or_else(|| {
            RecordError::TimestampParse {
                line,
                value: self.timestamp.clone(),
            }
        })?;
        Ok(TransferRecord {
            from: Some(self.from).filter(|a| !a.is_empty()),
            to: Some(self.to).filter(|a| !a.is_empty()),
            value,
            timestamp,
        })
    }
}

/// Token values come either as plain decimals, possibly with `,` thousands
/// grouping as block explorers like to export them, or in scientific notation
/// for dust amounts. A comma anywhere else (`1,5`) is rejected.
fn parse_value(text: &str) -> Option<Decimal> {
    let text = if text.contains(',') {
        strip_grouping(text)?
    } else {
        text.to_owned()
    };
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .ok()
}

/// `-1,234,567.5` -> `-1234567.5`, provided every group after the first one
/// has exactly three digits and the first one has one to three.
fn strip_grouping(text: &str) -> Option<String> {
    let (int, frac) = match text.split_once('.') {
        Some((int, frac)) => (int, Some(frac)),
        None => (text, None),
    };
    let (sign, digits) = match int.strip_prefix(&['-', '+'][..]) {
        Some(rest) => (&int[..1], rest),
        None => ("", int),
    };
    let mut groups = digits.split(',');
    let first = groups.next()?;
    let all_digits = |g: &str| g.bytes().all(|b| b.is_ascii_digit());
    if !(1..=3).contains(&first.len()) || !all_digits(first) {
        return None;
    }
    let mut out = format!("{sign}{first}");
    for group in groups {
        if group.len() != 3 || !all_digits(group) {
            return None;
        }
        out.push_str(group);
    }
    if let Some(frac) = frac {
        if frac.contains(',') {
            return None;
        }
        out.push('.');
        out.push_str(frac);
    }
    Some(out)
}

/// Strictly `YYYY-MM-DD HH:mm:ss`. chrono alone would also take `2024-1-1 0:0:0`
/// or a five-digit year, so the shape is checked first.
fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    let shaped = text.len() == 19
        && text.bytes().enumerate().all(|(i, b)| match i {
            4 | 7 => b == b'-',
            10 => b == b' ',
            13 | 16 => b == b':',
            _ => b.is_ascii_digit(),
        });
    if !shaped {
        return None;
    }
    NaiveDateTime::parse_from_str(text, TIMESTAMP_FORMAT).ok()
}

/// Running state of one wallet. There's no "number of transfers" or similar
/// here, only what ends up in the output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletAccount {
    pub balance: Decimal,
    pub first_tx: NaiveDateTime,
    pub last_tx: NaiveDateTime,
}

impl WalletAccount {
    /// Fresh account for an address first seen at `timestamp`.
    pub fn seed(timestamp: NaiveDateTime) -> Self {
        Self {
            balance: Decimal::ZERO,
            first_tx: timestamp,
            last_tx: timestamp,
        }
    }

    /// Add `amount` (negative for an outgoing leg) and widen the window. `None`
    /// when the balance would overflow, in which case nothing is changed.
    pub fn apply(&mut self, amount: Decimal, timestamp: NaiveDateTime) -> Option<()> {
        self.balance = self.balance.checked_add(amount)?;
        self.touch(timestamp);
        Some(())
    }

    /// Widen the activity window so it includes `timestamp`.
    pub fn touch(&mut self, timestamp: NaiveDateTime) {
        self.first_tx = self.first_tx.min(timestamp);
        self.last_tx = self.last_tx.max(timestamp);
    }

    /// Combine with the same wallet's state from another shard. `None` on
    /// balance overflow.
    pub fn absorb(&mut self, other: &WalletAccount) -> Option<()> {
        self.balance = self.balance.checked_add(other.balance)?;
        self.touch(other.first_tx);
        self.touch(other.last_tx);
        Some(())
    }
}

/// Output row for one wallet; built from `(address, account)` just before
/// serialization so `WalletAccount` doesn't have to carry its own key.
#[derive(Debug, Serialize)]
pub struct WalletRow<'a> {
    #[serde(rename = "Address")]
    pub address: &'a str,
    #[serde(rename = "Balance")]
    pub balance: Decimal,
    #[serde(rename = "First Transaction (UTC)")]
    pub first_tx: String,
    #[serde(rename = "Last Transaction (UTC)")]
    pub last_tx: String,
}

impl<'a> WalletRow<'a> {
    pub const HEADERS: [&'static str; 4] = [
        "Address",
        "Balance",
        "First Transaction (UTC)",
        "Last Transaction (UTC)",
    ];

    pub fn new(address: &'a str, account: &WalletAccount) -> Self {
        Self {
            address,
            balance: account.balance.normalize(),
            first_tx: account.first_tx.format(TIMESTAMP_FORMAT).to_string(),
            last_tx: account.last_tx.format(TIMESTAMP_FORMAT).to_string(),
        }
    }
}

/// Addresses kept out of the accounting altogether, typically token contracts,
/// bridges and exchange hot wallets. Matching is exact.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Denylist(HashSet<Address>);

impl Denylist {
    pub fn contains(&self, address: &str) -> bool {
        self.0.contains(address)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<Address>> FromIterator<S> for Denylist {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// Closed interval, both bounds included. The bounds are taken as given: with
/// `min > max` nothing is ever in range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BalanceRange {
    pub min: Decimal,
    pub max: Decimal,
}

impl BalanceRange {
    pub fn contains(&self, balance: Decimal) -> bool {
        self.min <= balance && balance <= self.max
    }
}

impl fmt::Display for BalanceRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.min, self.max)
    }
}

/// Problems with the content of a single row.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum RecordError {
    #[error("line {line}: timestamp {value:?} doesn't match YYYY-MM-DD HH:mm:ss")]
    TimestampParse { line: Line, value: String },
    #[error("line {line}: token value {value:?} is not a decimal number")]
    ValueParse { line: Line, value: String },
    #[error("line {line}: balance of {address} overflows")]
    BalanceOverflow { line: Line, address: Address },
}

/// Everything that can make a dataset fail. Each dataset fails on its own,
/// siblings keep going.
#[derive(Error, Debug)]
pub enum Error {
    #[error("cannot open {}: {source}", .path.display())]
    SourceOpen {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("cannot read records: {0}")]
    SourceRead(#[from] csv::Error),
    #[error(transparent)]
    Record(#[from] RecordError),
    #[error("cannot write {}: {source}", .path.display())]
    SinkWrite { path: PathBuf, source: csv::Error },
    #[error("balance of {address} overflows when merging shards")]
    MergeOverflow { address: Address },
}
