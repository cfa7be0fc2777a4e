use crate::dataset::{Dataset, DatasetRow};
use crate::pricing;
use crate::Sample;
use std::path::PathBuf;
use std::sync::mpsc::Sender;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{error, info, warn};

/// The price generator, owner of the running price.
#[derive(Debug, Clone)]
pub struct PriceFeed {
    csvfile: PathBuf,
    current_price: f64,
    sensitivity: f64,
    interval: Duration,
}

/// What happened over one run of the feed
#[derive(Debug, Clone, PartialEq)]
pub struct FeedSummary {
    pub rows_read: usize,
    pub samples_emitted: usize,
    /// 0-based index of every skipped row, as printed in the error lines
    pub skipped_rows: Vec<usize>,
    pub final_price: f64,
}

impl PriceFeed {
    pub fn new(csvfile: PathBuf, base_price: f64, sensitivity: f64, interval: Duration) -> PriceFeed {
        PriceFeed {
            csvfile,
            current_price: base_price,
            sensitivity,
            interval,
        }
    }

    pub fn current_price(&self) -> f64 {
        self.current_price
    }

    /// applies one row to the running price and returns the new price
    pub fn step(&mut self, row: &DatasetRow) -> f64 {
        self.current_price = pricing::update(
            self.current_price,
            row.occupancy,
            row.capacity,
            self.sensitivity,
        );
        self.current_price
    }

    /// Reads the csv and sends one sample per valid row, sleeping `interval` after each.
    /// A load failure ends the run before any sample is sent,
    /// a bad row is logged and skipped without sleeping.
    pub fn run(mut self, tx: Sender<Sample>) -> FeedSummary {
        let mut summary = FeedSummary {
            rows_read: 0,
            samples_emitted: 0,
            skipped_rows: Vec::new(),
            final_price: self.current_price,
        };
        let dataset = match Dataset::from_csv(&self.csvfile) {
            Ok(ds) => {
                info!("CSV loaded successfully. Number of rows: {}", ds.len());
                ds
            }
            Err(e) => {
                error!("Error loading CSV file: {}", e);
                return summary;
            }
        };

        for (i, row) in dataset.rows().enumerate() {
            summary.rows_read += 1;
            let row = match row {
                Ok(r) => r,
                Err(e) => {
                    error!("Error processing row {}: {}", i, e);
                    summary.skipped_rows.push(i);
                    continue;
                }
            };
            let price = self.step(&row);
            if tx.send(Sample::now(price)).is_err() {
                warn!("chart is gone, stopping the price feed at row {}", i + 1);
                break;
            }
            summary.samples_emitted += 1;
            info!(
                "Row {}: Occupancy {}/{} → Price: ${:.2}",
                i + 1,
                row.occupancy,
                row.capacity,
                price
            );
            thread::sleep(self.interval);
        }

        summary.final_price = self.current_price;
        info!(
            "price feed done, {} samples from {} rows ({} skipped), last price {:.2}",
            summary.samples_emitted,
            summary.rows_read,
            summary.skipped_rows.len(),
            summary.final_price
        );
        summary
    }
}

/// starts the feed on its own thread; the handle may be dropped without joining
pub fn spawn(feed: PriceFeed, tx: Sender<Sample>) -> std::io::Result<JoinHandle<FeedSummary>> {
    thread::Builder::new()
        .name("price-feed".to_string())
        .spawn(move || feed.run(tx))
}
