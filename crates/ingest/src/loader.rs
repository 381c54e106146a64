//! CSV loading with per-row data-quality checks. A bad row becomes a
//! `RowError`; the rest of the file still loads.

use perks_core::{Flight, Hotel, PerkResult, RowError, Session, SessionRow, User};
use serde::de::DeserializeOwned;
use std::io::Read;
use std::path::Path;
use tracing::{info, warn};

/// A parsed record and the line it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct LineRecord<T> {
    pub line: u64,
    pub value: T,
}

/// Outcome of loading one source.
#[derive(Debug, Clone)]
pub struct LoadReport<T> {
    pub source: String,
    pub records: Vec<LineRecord<T>>,
    pub errors: Vec<RowError>,
}

impl<T> LoadReport<T> {
    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.records.iter().map(|r| &r.value)
    }

    pub fn into_values(self) -> Vec<T> {
        self.records.into_iter().map(|r| r.value).collect()
    }
}

/// Row-level checks applied after parsing.
pub trait Validate {
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

fn check_fraction(name: &str, value: Option<f64>) -> Result<(), String> {
    match value {
        Some(v) if !(0.0..=1.0).contains(&v) => Err(format!("{name} {v} is outside [0, 1]")),
        _ => Ok(()),
    }
}

fn check_span(
    start: &chrono::NaiveDateTime,
    end: &chrono::NaiveDateTime,
) -> Result<(), String> {
    if end < start {
        Err(format!("session_end {end} is before session_start {start}"))
    } else {
        Ok(())
    }
}

impl Validate for User {}

impl Validate for Session {
    fn validate(&self) -> Result<(), String> {
        check_span(&self.session_start, &self.session_end)
    }
}

impl Validate for Flight {
    fn validate(&self) -> Result<(), String> {
        check_fraction("flight_discount_amount", self.flight_discount_amount)
    }
}

impl Validate for Hotel {
    fn validate(&self) -> Result<(), String> {
        check_fraction("hotel_discount_amount", self.hotel_discount_amount)
    }
}

impl Validate for SessionRow {
    fn validate(&self) -> Result<(), String> {
        check_span(&self.session_start, &self.session_end)?;
        check_fraction("flight_discount_amount", self.flight_discount_amount)?;
        check_fraction("hotel_discount_amount", self.hotel_discount_amount)
    }
}

/// Parse CSV records of type `T` from any reader.
pub fn read_records<T, R>(source: &str, reader: R) -> PerkResult<LoadReport<T>>
where
    T: DeserializeOwned + Validate,
    R: Read,
{
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = rdr.headers()?.clone();

    let mut records = Vec::new();
    let mut errors = Vec::new();

    for result in rdr.records() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                let line = e.position().map(|p| p.line()).unwrap_or_default();
                errors.push(RowError {
                    source: source.to_string(),
                    line,
                    reason: e.to_string(),
                });
                continue;
            }
        };
        let line = record.position().map(|p| p.line()).unwrap_or_default();

        let parsed = record
            .deserialize::<T>(Some(&headers))
            .map_err(|e| e.to_string())
            .and_then(|value| value.validate().map(|_| value));

        match parsed {
            Ok(value) => records.push(LineRecord { line, value }),
            Err(reason) => errors.push(RowError {
                source: source.to_string(),
                line,
                reason,
            }),
        }
    }

    metrics::counter!("ingest.rows_loaded").increment(records.len() as u64);
    if !errors.is_empty() {
        metrics::counter!("ingest.rows_rejected").increment(errors.len() as u64);
        warn!(source, rejected = errors.len(), "Rows rejected during load");
    }
    info!(source, rows = records.len(), "Source loaded");

    Ok(LoadReport {
        source: source.to_string(),
        records,
        errors,
    })
}

/// Parse CSV records of type `T` from a file.
pub fn read_file<T>(path: &Path) -> PerkResult<LoadReport<T>>
where
    T: DeserializeOwned + Validate,
{
    let file = std::fs::File::open(path)?;
    read_records(&path.display().to_string(), file)
}
