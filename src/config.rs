//! Run configuration: which exports to process, who to leave out, and which
//! balance range to count.
//!
//! Everything has a compiled-in default; a few environment variables can
//! override it:
//! - `BALANCE_RANGE_MIN` (default: 1)
//! - `BALANCE_RANGE_MAX` (default: 32)
//! - `RAW_DATA_DIR` (default: ./raw_data)
//! - `RESULT_DIR` (default: ./result)

use crate::data::{BalanceRange, Denylist};
use anyhow::Context;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::{path::PathBuf, str::FromStr};

/// Token contracts and exchange wallets that would otherwise dominate every
/// report.
pub const EXCLUDED_WALLETS: [&str; 4] = [
    "0x54945180db7943c0ed0fee7edab2bd24620256bc",
    "0x1bee69b7dfffa4e2d53c2a2df135c388ad25dcd2",
    "0x93c4b944d05dfe6df7645a86cd2206016c51564d",
    "0x0fe4f44bee93503346a3ac9ee5a26b130a5796d6",
];

/// Liquid staking tokens we have exports for.
pub const TOKENS: [&str; 4] = ["cbETH", "rETH", "stETH", "swETH"];

pub const DEFAULT_RANGE: BalanceRange = BalanceRange {
    min: dec!(1),
    max: dec!(32),
};

/// One export to aggregate and where its result goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dataset {
    pub input: PathBuf,
    pub output: PathBuf,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub denylist: Denylist,
    pub range: BalanceRange,
    pub datasets: Vec<Dataset>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration, asking `lookup` for overrides. A range bound
    /// that is set but isn't a number is an error rather than a silent default.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bound = |key: &str, default: Decimal| -> anyhow::Result<Decimal> {
            match lookup(key) {
                Some(text) => Decimal::from_str(text.trim())
                    .with_context(|| format!("{key}={text:?} is not a decimal number")),
                None => Ok(default),
            }
        };
        let range = BalanceRange {
            min: bound("BALANCE_RANGE_MIN", DEFAULT_RANGE.min)?,
            max: bound("BALANCE_RANGE_MAX", DEFAULT_RANGE.max)?,
        };
        let raw_dir = PathBuf::from(lookup("RAW_DATA_DIR").unwrap_or_else(|| "./raw_data".into()));
        let result_dir = PathBuf::from(lookup("RESULT_DIR").unwrap_or_else(|| "./result".into()));
        let datasets = TOKENS
            .iter()
            .map(|token| Dataset {
                input: raw_dir.join(format!("raw-{token}.csv")),
                output: result_dir.join(format!("{token}.csv")),
            })
            .collect();

        Ok(Self {
            denylist: EXCLUDED_WALLETS.into_iter().collect(),
            range,
            datasets,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.range, DEFAULT_RANGE);
        assert_eq!(config.denylist.len(), 4);
        assert!(config
            .denylist
            .contains("0x93c4b944d05dfe6df7645a86cd2206016c51564d"));
        assert_eq!(config.datasets.len(), 4);
        assert_eq!(
            config.datasets[1],
            Dataset {
                input: PathBuf::from("./raw_data/raw-rETH.csv"),
                output: PathBuf::from("./result/rETH.csv"),
            }
        );
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("BALANCE_RANGE_MIN", "0.5"),
            ("BALANCE_RANGE_MAX", " 100 "),
            ("RAW_DATA_DIR", "/data/in"),
            ("RESULT_DIR", "/data/out"),
        ]))
        .unwrap();
        assert_eq!(
            config.range,
            BalanceRange {
                min: dec!(0.5),
                max: dec!(100)
            }
        );
        assert_eq!(config.datasets[3].input, PathBuf::from("/data/in/raw-swETH.csv"));
        assert_eq!(config.datasets[3].output, PathBuf::from("/data/out/swETH.csv"));
    }

    #[test]
    fn test_inverted_range_kept() {
        let config = Config::from_lookup(lookup(&[
            ("BALANCE_RANGE_MIN", "10"),
            ("BALANCE_RANGE_MAX", "5"),
        ]))
        .unwrap();
        assert_eq!(config.range.min, dec!(10));
        assert_eq!(config.range.max, dec!(5));
    }

    #[test]
    fn test_bad_bound() {
        let err = Config::from_lookup(lookup(&[("BALANCE_RANGE_MAX", "lots")])).unwrap_err();
        assert!(err.to_string().contains("BALANCE_RANGE_MAX"));
    }
}
