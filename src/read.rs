use crate::data::{Error, Line, RawTransfer, TransferRecord};

/// Trait for doing something with a `TransferRecord` read from a CSV export
/// (or produced from elsewhere). The aggregator implements it, and so does the
/// mock collector in the tests below to check what the parser produces.
/// `line` locates the transfer in its source for error reporting.
pub trait TransferUser {
    fn use_transfer(&mut self, line: Line, transfer: TransferRecord) -> Result<(), Error>;
}

/// CSV importer for token transfer exports. Stops at the first bad row: a
/// dataset with an unreadable row is not aggregated at all.
pub fn read_transfers<R: std::io::Read, U: TransferUser>(
    reader: R,
    user: &mut U,
) -> Result<(), Error> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = rdr.headers()?.clone();
    let mut record = csv::StringRecord::new();
    while rdr.read_record(&mut record)? {
        let line = record.position().map_or(0, |pos| pos.line());
        let raw: RawTransfer = record.deserialize(Some(&headers))?;
        user.use_transfer(line, raw.into_transfer(line)?)?;
    }
    Ok(())
}
