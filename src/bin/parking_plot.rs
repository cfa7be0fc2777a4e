use chrono::prelude::*;
use parking_lpp::chart::write_svg;
use parking_lpp::cli::parse_cli_plot;
use parking_lpp::dataset::Dataset;
use parking_lpp::logging;
use parking_lpp::pricing::price_path;
use parking_lpp::Sample;
use tracing::info;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init();
    let config = parse_cli_plot();
    info!(
        "read data from {} and plot to {}",
        config.csvfile.display(),
        config.svgfile.display()
    );
    let dataset = Dataset::from_csv(&config.csvfile)?;
    let rows = dataset.valid_rows();
    let prices = price_path(config.base_price, &rows[..], config.sensitivity);

    let step = chrono::Duration::from_std(config.interval)?;
    let start = Local::now();
    let skip = prices.len().saturating_sub(config.retention);
    let samples = prices
        .iter()
        .enumerate()
        .skip(skip)
        .map(|(i, &p)| {
            start
                .checked_add_signed(step * i as i32)
                .map(|t| Sample::new(t, p))
                .ok_or("time axis out of range, try a shorter interval")
        })
        .collect::<Result<Vec<Sample>, _>>()?;
    match samples.last() {
        Some(last) => info!(
            "{} prices from {} rows, last sample {}",
            prices.len(),
            dataset.len(),
            last
        ),
        None => info!("no valid rows in {}", config.csvfile.display()),
    }
    write_svg(&samples[..], &config.svgfile)?;
    Ok(())
}
