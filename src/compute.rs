use crate::{
    data::{Address, Denylist, Error, Line, RecordError, TransferRecord, WalletAccount},
    read::{read_transfers, TransferUser},
};
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use std::collections::{hash_map::Entry, HashMap};

/// Wallets of one dataset, keyed by address. One of these is owned by whoever
/// processes the dataset; nothing is shared between datasets.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Wallets {
    accounts: HashMap<Address, WalletAccount>,
}

impl Wallets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, address: &str) -> Option<&WalletAccount> {
        self.accounts.get(address)
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Address, &WalletAccount)> {
        self.accounts.iter()
    }

    /// Account for `address`, created from the record's timestamp if this is
    /// the first time we see it.
    pub fn get_or_seed(&mut self, address: &str, timestamp: NaiveDateTime) -> &mut WalletAccount {
        self.accounts
            .entry(address.to_owned())
            .or_insert_with(|| WalletAccount::seed(timestamp))
    }

    /// Merge wallets folded from another shard of the same dataset: balances
    /// add up, activity windows widen.
    pub fn merge(mut self, other: Wallets) -> Result<Wallets, Error> {
        for (address, account) in other.accounts {
            match self.accounts.entry(address) {
                Entry::Occupied(mut entry) => {
                    if entry.get_mut().absorb(&account).is_none() {
                        return Err(Error::MergeOverflow {
                            address: entry.key().clone(),
                        });
                    }
                }
                Entry::Vacant(entry) => {
                    entry.insert(account);
                }
            }
        }
        Ok(self)
    }
}

/// Counters worth a log line once a dataset is folded.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AggregateStats {
    pub records: u64,
    /// Legs with no address at all (mint/burn or empty cell).
    pub empty_legs: u64,
    /// Legs dropped because the address is on the denylist.
    pub denied_legs: u64,
}

/// Folds transfers into `Wallets`. The result is only reachable through
/// `finish`, which consumes the aggregator, so a half-read dataset never
/// leaks out.
#[derive(Debug)]
pub struct Aggregator<'a> {
    denylist: &'a Denylist,
    wallets: Wallets,
    stats: AggregateStats,
}

impl<'a> Aggregator<'a> {
    pub fn new(denylist: &'a Denylist) -> Self {
        Self {
            denylist,
            wallets: Wallets::new(),
            stats: AggregateStats::default(),
        }
    }

    pub fn finish(self) -> (Wallets, AggregateStats) {
        (self.wallets, self.stats)
    }

    fn apply_leg(
        &mut self,
        line: Line,
        address: Option<&str>,
        amount: Decimal,
        timestamp: NaiveDateTime,
    ) -> Result<(), RecordError> {
        let Some(address) = address else {
            self.stats.empty_legs += 1;
            return Ok(());
        };
        if self.denylist.contains(address) {
            self.stats.denied_legs += 1;
            return Ok(());
        }
        self.wallets
            .get_or_seed(address, timestamp)
            .apply(amount, timestamp)
            .ok_or_else(|| RecordError::BalanceOverflow {
                line,
                address: address.to_owned(),
            })
    }
}

/// Each leg is applied on its own, so a self-transfer debits and credits the
/// same wallet and nets out to zero.
impl TransferUser for Aggregator<'_> {
    fn use_transfer(&mut self, line: Line, transfer: TransferRecord) -> Result<(), Error> {
        self.stats.records += 1;
        self.apply_leg(line, transfer.from.as_deref(), -transfer.value, transfer.timestamp)?;
        self.apply_leg(line, transfer.to.as_deref(), transfer.value, transfer.timestamp)?;
        Ok(())
    }
}

/// Fold an in-memory (or lazily produced) sequence of transfers. Errors are
/// located by 1-based position in the sequence.
pub fn fold<I>(transfers: I, denylist: &Denylist) -> Result<Wallets, Error>
where
    I: IntoIterator<Item = TransferRecord>,
{
    let mut aggregator = Aggregator::new(denylist);
    for (position, transfer) in (1..).zip(transfers) {
        aggregator.use_transfer(position, transfer)?;
    }
    Ok(aggregator.finish().0)
}

/// Fold a whole CSV export. Either every row made it in, or we get an error
/// and no wallets at all.
pub fn aggregate<R: std::io::Read>(
    reader: R,
    denylist: &Denylist,
) -> Result<(Wallets, AggregateStats), Error> {
    let mut aggregator = Aggregator::new(denylist);
    read_transfers(reader, &mut aggregator)?;
    Ok(aggregator.finish())
}
