use crate::error::{DatasetError, RowError};
use crate::{CAPACITY_COLUMN, OCCUPANCY_COLUMN};
use csv::StringRecord;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

/// One time step of the parking dataset
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DatasetRow {
    pub occupancy: f64,
    pub capacity: f64,
}

/// The raw csv records, read eagerly and kept in file order.
/// Records are only turned into `DatasetRow`s on demand,
/// so that a bad row can be skipped without failing the whole load.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub path: PathBuf,
    occupancy_idx: Option<usize>,
    capacity_idx: Option<usize>,
    records: Vec<StringRecord>,
}

impl Dataset {
    pub fn from_csv<P: AsRef<Path>>(fin: P) -> Result<Dataset, DatasetError> {
        let path = fin.as_ref().to_path_buf();
        let file = File::open(&path).map_err(|source| DatasetError::Open {
            path: path.clone(),
            source,
        })?;
        Dataset::from_reader(path, file)
    }

    /// `path` only labels the errors, the records come from `rdr`
    pub fn from_reader<R: Read>(path: PathBuf, rdr: R) -> Result<Dataset, DatasetError> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(rdr);
        let headers = match reader.headers() {
            Ok(h) => h.clone(),
            Err(source) => return Err(DatasetError::Csv { path, source }),
        };
        if headers.is_empty() {
            return Err(DatasetError::NoHeader { path });
        }
        let occupancy_idx = headers.iter().position(|h| h == OCCUPANCY_COLUMN);
        let capacity_idx = headers.iter().position(|h| h == CAPACITY_COLUMN);
        let mut records = Vec::new();
        for r in reader.records() {
            match r {
                Ok(record) => records.push(record),
                Err(source) => return Err(DatasetError::Csv { path, source }),
            }
        }
        Ok(Dataset {
            path,
            occupancy_idx,
            capacity_idx,
            records,
        })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// rows in file order, each parsed independently
    pub fn rows(&self) -> impl Iterator<Item = Result<DatasetRow, RowError>> + '_ {
        self.records.iter().map(move |r| self.parse_row(r))
    }

    /// only the rows that parse, in file order; errors are logged and dropped
    pub fn valid_rows(&self) -> Vec<DatasetRow> {
        self.rows()
            .enumerate()
            .filter_map(|(i, r)| match r {
                Ok(row) => Some(row),
                Err(e) => {
                    tracing::error!("Error processing row {}: {}", i, e);
                    None
                }
            })
            .collect()
    }

    fn parse_row(&self, record: &StringRecord) -> Result<DatasetRow, RowError> {
        let occupancy = parse_field(record, self.occupancy_idx, OCCUPANCY_COLUMN)?;
        let capacity = parse_field(record, self.capacity_idx, CAPACITY_COLUMN)?;
        Ok(DatasetRow {
            occupancy,
            capacity,
        })
    }
}

fn parse_field(
    record: &StringRecord,
    idx: Option<usize>,
    column: &'static str,
) -> Result<f64, RowError> {
    let idx = idx.ok_or(RowError::MissingColumn { column })?;
    let raw = match record.get(idx) {
        Some(s) if !s.is_empty() => s,
        _ => return Err(RowError::MissingField { column }),
    };
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0. => Ok(v),
        _ => Err(RowError::InvalidField {
            column,
            value: raw.to_string(),
        }),
    }
}
