mod compute;
mod config;
mod data;
mod read;
mod report;
mod run;
mod write;

pub use self::{
    compute::{aggregate, fold, AggregateStats, Aggregator, Wallets},
    config::{Config, Dataset, DEFAULT_RANGE, EXCLUDED_WALLETS, TOKENS},
    data::{
        Address, BalanceRange, Denylist, Error, Line, RecordError, TransferRecord, WalletAccount,
        TIMESTAMP_FORMAT,
    },
    read::{read_transfers, TransferUser},
    report::count_in_range,
    run::{process_dataset, DatasetReport},
    write::{write_wallets, write_wallets_to},
};
