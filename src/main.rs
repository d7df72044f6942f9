use log::{error, info};
use wallet_balances::{process_dataset, Config};

fn main() -> Result<(), anyhow::Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::from_env()?;
    info!(
        "Processing {} datasets, {} excluded wallets, range {}",
        config.datasets.len(),
        config.denylist.len(),
        config.range
    );

    // Datasets don't depend on each other: a failed one is reported and the
    // rest still run.
    let mut failed = 0;
    for dataset in &config.datasets {
        match process_dataset(dataset, &config) {
            Ok(report) => info!(
                "{}: {} wallets, {} in range",
                dataset.input.display(),
                report.wallets,
                report.in_range
            ),
            Err(e) => {
                error!("Dataset {} failed: {e}", dataset.input.display());
                failed += 1;
            }
        }
    }
    if failed > 0 {
        anyhow::bail!("{failed} of {} datasets failed", config.datasets.len());
    }
    Ok(())
}
