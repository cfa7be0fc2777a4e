use parking_lpp::chart::ChartSink;
use parking_lpp::cli::parse_cli_feed;
use parking_lpp::feed::{self, PriceFeed};
use parking_lpp::logging;
use parking_lpp::server::{ChartServer, ChartView};
use std::sync::mpsc;
use tracing::info;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init();
    let config = parse_cli_feed();
    info!(
        "read data from {}, one row every {:?}, keeping {} samples on the chart",
        config.csvfile.display(),
        config.interval,
        config.retention
    );

    let view = ChartView::new(ChartSink::new(config.retention), config.svgfile.clone());
    let server = ChartServer::bind(&config.listen, view)?;

    let (tx, rx) = mpsc::channel();
    let price_feed = PriceFeed::new(
        config.csvfile,
        config.base_price,
        config.sensitivity,
        config.interval,
    );
    // not joined: the feed must not keep the process alive
    let _feed = feed::spawn(price_feed, tx)?;

    server.run(rx)?;
    Ok(())
}
