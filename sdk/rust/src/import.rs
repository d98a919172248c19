//! CSV parsing for bulk task import.
//!
//! The expected layout is a header line followed by `title,description`
//! rows. Quoting follows RFC 4180, so quoted fields may hold commas, line
//! breaks and doubled quotes.

use csv::ReaderBuilder;

use crate::client::NewTask;

/// Parse CSV text into tasks.
///
/// The first line is a header and is skipped, as are empty lines and rows
/// with fewer than two columns. Columns after the second are ignored.
pub fn parse_tasks_csv(text: &str) -> Result<Vec<NewTask>, csv::Error> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut tasks = Vec::new();
    for record in reader.records() {
        let record = record?;
        if let (Some(title), Some(description)) = (record.get(0), record.get(1)) {
            tasks.push(NewTask::new(title, description));
        }
    }
    Ok(tasks)
}
