use crate::{
    compute::aggregate,
    config::{Config, Dataset},
    data::Error,
    report::count_in_range,
    write::write_wallets_to,
};
use log::{debug, info};
use std::{fs::File, io::BufReader};

/// What a successful dataset run produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DatasetReport {
    pub wallets: usize,
    pub in_range: usize,
}

/// Read, fold, write and count one dataset. Nothing is written unless the whole
/// export was read.
pub fn process_dataset(dataset: &Dataset, config: &Config) -> Result<DatasetReport, Error> {
    let file = File::open(&dataset.input).map_err(|source| Error::SourceOpen {
        path: dataset.input.clone(),
        source,
    })?;
    let (wallets, stats) = aggregate(BufReader::new(file), &config.denylist)?;
    debug!(
        "{}: {} records, {} empty legs, {} denylisted legs",
        dataset.input.display(),
        stats.records,
        stats.empty_legs,
        stats.denied_legs
    );

    write_wallets_to(&dataset.output, &wallets)?;
    info!("Data written to {} successfully.", dataset.output.display());

    let in_range = count_in_range(&wallets, &config.range);
    info!(
        "File: {} - Wallets in range {}: {in_range}",
        dataset.output.display(),
        config.range
    );
    Ok(DatasetReport {
        wallets: wallets.len(),
        in_range,
    })
}
