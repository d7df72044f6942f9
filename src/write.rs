use crate::{
    compute::Wallets,
    data::{Error, WalletRow},
};
use std::{fs, io::BufWriter, path::Path};

/// Basic CSV exporter for `Wallets`. The header goes out even when there are
/// no wallets, so an empty result is still a well-formed table.
pub fn write_wallets<W: std::io::Write>(
    writer: W,
    wallets: &Wallets,
) -> Result<(), csv::Error> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    wtr.write_record(WalletRow::HEADERS)?;
    for (address, account) in wallets.iter() {
        wtr.serialize(WalletRow::new(address, account))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write `wallets` to `path`, creating its directory if needed. Only the write
/// is redone when this is retried, the wallets are already folded.
pub fn write_wallets_to(path: &Path, wallets: &Wallets) -> Result<(), Error> {
    let sink_err = |source: csv::Error| Error::SinkWrite {
        path: path.to_owned(),
        source,
    };
    if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(dir).map_err(|e| sink_err(e.into()))?;
    }
    let file = fs::File::create(path).map_err(|e| sink_err(e.into()))?;
    write_wallets(BufWriter::new(file), wallets).map_err(sink_err)
}

#[cfg(test)]
mod tests {
    use super::{write_wallets, write_wallets_to};
    use crate::{
        compute::{fold, Wallets},
        data::{Denylist, Error, TransferRecord},
    };
    use chrono::NaiveDateTime;
    use rust_decimal_macros::dec;

    fn at(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, crate::data::TIMESTAMP_FORMAT).unwrap()
    }

    #[test]
    fn write_single_wallet() {
        let wallets = fold(
            [TransferRecord {
                from: None,
                to: Some("0xb".into()),
                value: dec!(7.50),
                timestamp: at("2024-01-02 03:04:05"),
            }],
            &Denylist::default(),
        )
        .unwrap();
        let mut out = vec![];
        write_wallets(&mut out, &wallets).unwrap();
        assert_eq!(
            std::str::from_utf8(&out).unwrap(),
            "\
Address,Balance,First Transaction (UTC),Last Transaction (UTC)
0xb,7.5,2024-01-02 03:04:05,2024-01-02 03:04:05
"
        );
    }

    #[test]
    fn write_negative_and_zero() {
        let wallets = fold(
            [
                TransferRecord {
                    from: Some("0xa".into()),
                    to: None,
                    value: dec!(7),
                    timestamp: at("2024-01-01 00:00:00"),
                },
                TransferRecord {
                    from: Some("0xc".into()),
                    to: Some("0xc".into()),
                    value: dec!(1.000),
                    timestamp: at("2024-01-01 00:00:00"),
                },
            ],
            &Denylist::default(),
        )
        .unwrap();
        let mut out = vec![];
        write_wallets(&mut out, &wallets).unwrap();
        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("0xa,-7,2024-01-01 00:00:00,2024-01-01 00:00:00\n"));
        assert!(out.contains("0xc,0,2024-01-01 00:00:00,2024-01-01 00:00:00\n"));
    }

    #[test]
    fn write_empty() {
        let mut out = vec![];
        write_wallets(&mut out, &Wallets::new()).unwrap();
        assert_eq!(
            out,
            b"Address,Balance,First Transaction (UTC),Last Transaction (UTC)\n"
        );
    }

    #[test]
    fn write_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("result").join("rETH.csv");
        write_wallets_to(&path, &Wallets::new()).unwrap();
        assert!(path.is_file());
    }

    #[test]
    fn write_unwritable_path() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("result");
        std::fs::write(&blocker, b"not a directory").unwrap();
        let err = write_wallets_to(&blocker.join("rETH.csv"), &Wallets::new()).unwrap_err();
        assert!(matches!(err, Error::SinkWrite { .. }));
    }
}
