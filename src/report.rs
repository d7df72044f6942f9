use crate::{compute::Wallets, data::BalanceRange};

/// How many wallets end up with a balance inside `range`, bounds included.
pub fn count_in_range(wallets: &Wallets, range: &BalanceRange) -> usize {
    wallets
        .iter()
        .filter(|(_, account)| range.contains(account.balance))
        .count()
}
