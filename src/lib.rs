use chrono::prelude::*;
use serde::Serialize;
pub mod chart;
pub mod cli;
pub mod dataset;
pub mod error;
pub mod feed;
pub mod logging;
pub mod pricing;
pub mod server;

pub const VERSION: Option<&str> = option_env!("CARGO_PKG_VERSION");

pub const DT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub const DEFAULT_CSVFILE: &str = "data/dataset.csv";
pub const DEFAULT_LISTEN: &str = "127.0.0.1:5006";

pub const OCCUPANCY_COLUMN: &str = "Occupancy";
pub const CAPACITY_COLUMN: &str = "Capacity";

pub const BASE_PRICE: f64 = 10.;
pub const DEFAULT_SENSITIVITY: f64 = 1.;
pub const DEFAULT_INTERVAL_SECS: f64 = 1.;
pub const MAX_INTERVAL_SECS: f64 = 86_400.;
pub const DEFAULT_RETENTION: usize = 100;

/// display range of the price axis, stored prices are never clamped
pub const PRICE_AXIS_MIN: f64 = 0.;
pub const PRICE_AXIS_MAX: f64 = 100.;

/// One point of the price series, stamped with the local wall-clock time
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Sample {
    pub time: DateTime<Local>,
    pub price: f64,
}

impl Sample {
    pub fn new(time: DateTime<Local>, price: f64) -> Sample {
        Sample { time, price }
    }

    pub fn now(price: f64) -> Sample {
        Sample::new(Local::now(), price)
    }
}

impl std::fmt::Display for Sample {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{:.2}", self.time.format(DT_FORMAT), self.price)
    }
}

/// min and max of a slice, None when the slice is empty
pub fn min_and_max<T: std::cmp::PartialOrd + Copy>(s: &[T]) -> Option<(T, T)> {
    let mut s_iter = s.iter();
    let (mut min, mut max) = match s_iter.next() {
        Some(v) => (*v, *v),
        None => return None,
    };
    for es in s_iter {
        if *es > max {
            max = *es
        }
        if *es < min {
            min = *es
        }
    }
    Some((min, max))
}

/// label format for the time axis, finer for shorter spans
pub fn suitable_xfmt(d: chrono::Duration) -> &'static str {
    if d > chrono::Duration::weeks(1) {
        "%y-%m-%d"
    } else if d > chrono::Duration::days(1) {
        "%m-%d %H"
    } else if d > chrono::Duration::hours(1) {
        "%d %H:%M"
    } else {
        "%H:%M:%S"
    }
}
