use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;
use tracing::{debug, info};

use super::dates::{parse_date, parse_flag};
use super::labels::{campaign_label, payment_method_label};
use super::{DataError, DataResult, DonorFeatures, TrainingRecord};

/// Columns every training CSV must carry. Other columns are ignored.
pub const REQUIRED_COLUMNS: [&str; 10] = [
    "total_donations",
    "total_amount",
    "avg_donation",
    "frequency",
    "last_donation_date",
    "preferred_payment_method",
    "recurring_donor",
    "campaign",
    "predicted_donation",
    "next_donation_date",
];

/// Load a training dataset from a CSV file on disk
pub fn load_training_file(path: &Path) -> DataResult<Vec<TrainingRecord>> {
    info!("Loading training data from {}", path.display());
    let file = File::open(path)?;
    load_training_csv(file)
}

/// Load a training dataset from any CSV source with a header row
pub fn load_training_csv<R: Read>(source: R) -> DataResult<Vec<TrainingRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(source);

    let headers = reader.headers()?.clone();
    let index = column_index(&headers)?;

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        let line = row.position().map(|p| p.line()).unwrap_or_default();
        records.push(parse_row(&row, &index, line)?);
    }

    if records.is_empty() {
        return Err(DataError::Empty);
    }

    debug!(rows = records.len(), "Parsed training rows");
    Ok(records)
}

fn column_index(headers: &StringRecord) -> DataResult<HashMap<&'static str, usize>> {
    let mut index = HashMap::new();
    let mut missing = Vec::new();

    for column in REQUIRED_COLUMNS {
        match headers.iter().position(|h| h.trim() == column) {
            Some(pos) => {
                index.insert(column, pos);
            }
            None => missing.push(column.to_string()),
        }
    }

    if !missing.is_empty() {
        return Err(DataError::MissingColumns(missing));
    }
    Ok(index)
}

struct RowReader<'a> {
    row: &'a StringRecord,
    index: &'a HashMap<&'static str, usize>,
    line: u64,
}

impl<'a> RowReader<'a> {
    fn raw(&self, column: &'static str) -> &'a str {
        self.index
            .get(column)
            .and_then(|&pos| self.row.get(pos))
            .unwrap_or("")
    }

    fn number(&self, column: &'static str) -> DataResult<f64> {
        let raw = self.raw(column);
        raw.parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| DataError::parse_error(self.line, column, format!("'{}' is not a number", raw)))
    }

    fn date(&self, column: &'static str) -> DataResult<chrono::NaiveDate> {
        let raw = self.raw(column);
        parse_date(raw)
            .ok_or_else(|| DataError::parse_error(self.line, column, format!("'{}' is not a date", raw)))
    }

    fn flag(&self, column: &'static str) -> DataResult<bool> {
        let raw = self.raw(column);
        parse_flag(raw)
            .ok_or_else(|| DataError::parse_error(self.line, column, format!("'{}' is not a boolean", raw)))
    }

    fn label(&self, column: &'static str) -> DataResult<&'a str> {
        let raw = self.raw(column);
        if raw.trim().is_empty() {
            return Err(DataError::parse_error(self.line, column, "empty label"));
        }
        Ok(raw)
    }
}

fn parse_row(
    row: &StringRecord,
    index: &HashMap<&'static str, usize>,
    line: u64,
) -> DataResult<TrainingRecord> {
    let r = RowReader { row, index, line };

    Ok(TrainingRecord {
        features: DonorFeatures {
            total_donations: r.number("total_donations")?,
            total_amount: r.number("total_amount")?,
            avg_donation: r.number("avg_donation")?,
            frequency: r.number("frequency")?,
            last_donation_date: r.date("last_donation_date")?,
            preferred_payment_method: payment_method_label(r.label("preferred_payment_method")?),
            recurring_donor: r.flag("recurring_donor")?,
            campaign: campaign_label(r.label("campaign")?),
        },
        predicted_donation: r.number("predicted_donation")?,
        next_donation_date: r.date("next_donation_date")?,
    })
}
