use super::VERSION;
use crate::{
    BASE_PRICE, DEFAULT_CSVFILE, DEFAULT_INTERVAL_SECS, DEFAULT_LISTEN, DEFAULT_RETENTION,
    DEFAULT_SENSITIVITY, MAX_INTERVAL_SECS,
};
use clap::{value_t_or_exit, App, Arg, ArgMatches};
use std::path::PathBuf;
use std::time::Duration;

/// Settings of the live feed; every default reproduces the fixed demo.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedConfig {
    pub csvfile: PathBuf,
    pub base_price: f64,
    pub sensitivity: f64,
    pub interval: Duration,
    pub retention: usize,
    pub listen: String,
    pub svgfile: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlotConfig {
    pub csvfile: PathBuf,
    pub svgfile: PathBuf,
    pub base_price: f64,
    pub sensitivity: f64,
    pub interval: Duration,
    pub retention: usize,
}

fn is_finite(v: String) -> Result<(), String> {
    match v.parse::<f64>() {
        Ok(f) if f.is_finite() => Ok(()),
        _ => Err(format!("{} is not a finite number", v)),
    }
}

fn is_seconds(v: String) -> Result<(), String> {
    match v.parse::<f64>().map(Duration::try_from_secs_f64) {
        Ok(Ok(d)) if d.as_secs_f64() <= MAX_INTERVAL_SECS => Ok(()),
        _ => Err(format!(
            "{} is not a number of seconds between 0 and {}",
            v, MAX_INTERVAL_SECS
        )),
    }
}

fn is_positive(v: String) -> Result<(), String> {
    match v.parse::<usize>() {
        Ok(n) if n > 0 => Ok(()),
        _ => Err(format!("{} is not a positive integer", v)),
    }
}

fn arg_csvin<'a, 'b>() -> Arg<'a, 'b> {
    Arg::with_name("input_csvfile")
        .help("csv file with the Occupancy and Capacity columns")
        .short("f")
        .long("csvfile")
        .takes_value(true)
        .default_value(DEFAULT_CSVFILE)
}

fn pricing_args<'a, 'b>() -> Vec<Arg<'a, 'b>> {
    vec![
        Arg::with_name("sensitivity")
            .help("coefficient applied to the occupancy ratio")
            .short("a")
            .long("sensitivity")
            .takes_value(true)
            .allow_hyphen_values(true)
            .validator(is_finite),
        Arg::with_name("base_price")
            .help("price before the first row")
            .short("b")
            .long("base-price")
            .takes_value(true)
            .allow_hyphen_values(true)
            .validator(is_finite),
        Arg::with_name("interval")
            .help("seconds between two rows")
            .short("i")
            .long("interval")
            .takes_value(true)
            .validator(is_seconds),
        Arg::with_name("retention")
            .help("number of samples kept on the chart")
            .short("r")
            .long("retention")
            .takes_value(true)
            .validator(is_positive),
    ]
}

/// the pricing values shared by both apps, defaults where not given
fn pricing_values(m: &ArgMatches) -> (f64, f64, Duration, usize) {
    let sensitivity = if m.is_present("sensitivity") {
        value_t_or_exit!(m, "sensitivity", f64)
    } else {
        DEFAULT_SENSITIVITY
    };
    let base_price = if m.is_present("base_price") {
        value_t_or_exit!(m, "base_price", f64)
    } else {
        BASE_PRICE
    };
    let interval = if m.is_present("interval") {
        value_t_or_exit!(m, "interval", f64)
    } else {
        DEFAULT_INTERVAL_SECS
    };
    let retention = if m.is_present("retention") {
        value_t_or_exit!(m, "retention", usize)
    } else {
        DEFAULT_RETENTION
    };
    let interval = Duration::try_from_secs_f64(interval)
        .unwrap_or_else(|_| Duration::from_secs_f64(DEFAULT_INTERVAL_SECS));
    (sensitivity, base_price, interval, retention)
}

fn feed_app<'a, 'b>() -> App<'a, 'b> {
    let arg_listen = Arg::with_name("listen")
        .help("address serving the live chart")
        .short("l")
        .long("listen")
        .takes_value(true)
        .default_value(DEFAULT_LISTEN);
    let arg_svgout = Arg::with_name("output_svgfile")
        .help("also write the chart to this svg file on every redraw")
        .short("o")
        .long("svgfile")
        .takes_value(true);
    App::new("Parking_feed")
        .version(VERSION.unwrap_or("unknown"))
        .author("Luca Peruzzo")
        .about("streams the parking price computed from a csv to a live chart")
        .arg(arg_csvin())
        .args(&pricing_args())
        .arg(arg_listen)
        .arg(arg_svgout)
}

fn feed_config(m: &ArgMatches) -> FeedConfig {
    let (sensitivity, base_price, interval, retention) = pricing_values(m);
    FeedConfig {
        csvfile: PathBuf::from(m.value_of("input_csvfile").unwrap_or(DEFAULT_CSVFILE)),
        base_price,
        sensitivity,
        interval,
        retention,
        listen: m.value_of("listen").unwrap_or(DEFAULT_LISTEN).to_string(),
        svgfile: m.value_of("output_svgfile").map(PathBuf::from),
    }
}

/// Takes the CLI arguments that control the live feed and chart.
pub fn parse_cli_feed() -> FeedConfig {
    feed_config(&feed_app().get_matches())
}

fn plot_app<'a, 'b>() -> App<'a, 'b> {
    let arg_svgout = Arg::with_name("output_svgfile")
        .help("name of the output svg file, defaults to the csv name with svg extension")
        .short("o")
        .long("svgfile")
        .takes_value(true);
    App::new("Parking_plot")
        .version(VERSION.unwrap_or("unknown"))
        .author("Luca Peruzzo")
        .about("plots the parking price computed from a csv, without waiting")
        .arg(arg_csvin())
        .args(&pricing_args())
        .arg(arg_svgout)
}

fn plot_config(m: &ArgMatches) -> PlotConfig {
    let (sensitivity, base_price, interval, retention) = pricing_values(m);
    let csvfile = PathBuf::from(m.value_of("input_csvfile").unwrap_or(DEFAULT_CSVFILE));
    let svgfile = match m.value_of("output_svgfile") {
        Some(p) => PathBuf::from(p),
        None => {
            let mut svgout = csvfile.clone();
            svgout.set_extension("svg");
            svgout
        }
    };
    PlotConfig {
        csvfile,
        svgfile,
        base_price,
        sensitivity,
        interval,
        retention,
    }
}

/// Takes the CLI arguments that control the offline plot.
pub fn parse_cli_plot() -> PlotConfig {
    plot_config(&plot_app().get_matches())
}
