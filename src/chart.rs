use crate::error::ChartError;
use crate::{min_and_max, suitable_xfmt, Sample, PRICE_AXIS_MAX, PRICE_AXIS_MIN};
use chrono::prelude::*;
use plotters::prelude::*;
use rand::Rng;
use serde::Serialize;
use std::collections::VecDeque;
use std::path::Path;

pub const CHART_TITLE: &str = "Real-Time Parking Price";
pub const CHART_SIZE: (u32, u32) = (1200, 400);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkState {
    /// only the startup placeholder has been shown
    EmptySeeded,
    /// at least one real sample has been pushed
    Streaming,
}

/// The live series behind the chart: a bounded FIFO of samples
/// plus the pending-redraw flag. Owned by the UI loop only.
#[derive(Debug, Clone)]
pub struct ChartSink {
    samples: VecDeque<Sample>,
    retention: usize,
    state: SinkState,
    redraw: bool,
}

#[derive(Serialize)]
struct SeriesJson<'a> {
    state: SinkState,
    retention: usize,
    samples: &'a VecDeque<Sample>,
}

impl ChartSink {
    /// seeded with a placeholder at the current time and a random price in [10, 50],
    /// only so that the first rendering is not empty
    pub fn new(retention: usize) -> ChartSink {
        let placeholder: u32 = rand::thread_rng().gen_range(10..=50);
        ChartSink::with_placeholder(retention, Sample::now(placeholder as f64))
    }

    pub fn with_placeholder(retention: usize, placeholder: Sample) -> ChartSink {
        let retention = retention.max(1);
        let mut samples = VecDeque::with_capacity(retention + 1);
        samples.push_back(placeholder);
        ChartSink {
            samples,
            retention,
            state: SinkState::EmptySeeded,
            redraw: true,
        }
    }

    /// appends, evicts the oldest beyond retention, schedules a redraw
    pub fn push(&mut self, sample: Sample) {
        self.samples.push_back(sample);
        while self.samples.len() > self.retention {
            self.samples.pop_front();
        }
        self.state = SinkState::Streaming;
        self.redraw = true;
    }

    /// true once per batch of pushes, clears the flag
    pub fn take_redraw(&mut self) -> bool {
        std::mem::replace(&mut self.redraw, false)
    }

    pub fn state(&self) -> SinkState {
        self.state
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn samples(&self) -> impl Iterator<Item = &Sample> + '_ {
        self.samples.iter()
    }

    pub fn latest(&self) -> Option<&Sample> {
        self.samples.back()
    }

    pub fn render_svg(&self) -> Result<String, ChartError> {
        let samples: Vec<Sample> = self.samples.iter().copied().collect();
        render_svg(&samples[..])
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&SeriesJson {
            state: self.state,
            retention: self.retention,
            samples: &self.samples,
        })
    }
}

fn draw_err<E: std::fmt::Display>(e: E) -> ChartError {
    ChartError::Draw(e.to_string())
}

/// the y axis is fixed to [PRICE_AXIS_MIN, PRICE_AXIS_MAX], samples outside are not drawn
fn on_axis(s: &Sample) -> bool {
    PRICE_AXIS_MIN <= s.price && s.price <= PRICE_AXIS_MAX
}

/// Draws the samples as a line plus point markers into an svg document.
/// The time axis spans the samples with a 5% margin on each side,
/// or +-30 s around a single instant.
pub fn render_svg(samples: &[Sample]) -> Result<String, ChartError> {
    let times: Vec<DateTime<Local>> = samples.iter().map(|s| s.time).collect();
    let (xmindt, xmaxdt) = min_and_max(&times[..]).unwrap_or_else(|| {
        let now = Local::now();
        (now, now)
    });
    let xspan: chrono::Duration = xmaxdt - xmindt;
    let xmargin = if xspan <= chrono::Duration::zero() {
        chrono::Duration::seconds(30)
    } else {
        xspan / 20
    };
    let xfmt = suitable_xfmt(xspan);

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, CHART_SIZE).into_drawing_area();
        root.fill(&WHITE).map_err(draw_err)?;
        let mut chart = ChartBuilder::on(&root)
            .caption(CHART_TITLE, ("sans-serif", 24))
            .margin(20)
            .x_label_area_size(50)
            .y_label_area_size(70)
            .build_cartesian_2d(
                (xmindt - xmargin)..(xmaxdt + xmargin),
                PRICE_AXIS_MIN..PRICE_AXIS_MAX,
            )
            .map_err(draw_err)?;
        chart
            .configure_mesh()
            .light_line_style(&TRANSPARENT)
            .bold_line_style(RGBColor(200, 200, 200).stroke_width(1))
            .set_all_tick_mark_size(2)
            .label_style(("sans-serif", 16))
            .x_labels(10)
            .x_label_formatter(&|x: &DateTime<Local>| x.format(xfmt).to_string())
            .y_label_formatter(&|y: &f64| format!("{:.0}", y))
            .x_desc("Time")
            .y_desc("Price ($)")
            .draw()
            .map_err(draw_err)?;

        // the line breaks where samples leave the axis range
        for run in samples.split(|s| !on_axis(s)) {
            if run.is_empty() {
                continue;
            }
            let line = LineSeries::new(run.iter().map(|s| (s.time, s.price)), BLUE.stroke_width(2));
            chart.draw_series(line).map_err(draw_err)?;
        }
        let points = samples
            .iter()
            .filter(|s| on_axis(s))
            .map(|s| Circle::new((s.time, s.price), 6, RED.filled()));
        chart.draw_series(points).map_err(draw_err)?;
        root.present().map_err(draw_err)?;
    }
    Ok(svg)
}

/// renders and writes the svg at the given path
pub fn write_svg(samples: &[Sample], fout: &Path) -> Result<(), ChartError> {
    let svg = render_svg(samples)?;
    std::fs::write(fout, svg)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(secs: i64, price: f64) -> Sample {
        Sample::new(Local.timestamp(1_700_000_000 + secs, 0), price)
    }

    fn sink(retention: usize) -> ChartSink {
        ChartSink::with_placeholder(retention, at(0, 25.))
    }

    #[test]
    fn starts_seeded_with_one_placeholder() {
        let s = ChartSink::new(100);
        assert_eq!(s.state(), SinkState::EmptySeeded);
        assert_eq!(s.len(), 1);
        let p = s.latest().unwrap().price;
        assert!((10. ..=50.).contains(&p));
    }

    #[test]
    fn first_push_starts_streaming() {
        let mut s = sink(100);
        s.push(at(1, 10.5));
        assert_eq!(s.state(), SinkState::Streaming);
        assert_eq!(s.len(), 2);
        assert_eq!(s.latest(), Some(&at(1, 10.5)));
    }

    #[test]
    fn never_holds_more_than_retention() {
        let mut s = sink(100);
        for i in 1..=250 {
            s.push(at(i, i as f64));
            assert!(s.len() <= 100);
        }
        assert_eq!(s.len(), 100);
        assert_eq!(s.samples().next(), Some(&at(151, 151.)));
    }

    #[test]
    fn hundred_and_first_push_evicts_the_oldest() {
        let mut s = sink(100);
        for i in 1..=99 {
            s.push(at(i, 1.));
        }
        assert_eq!(s.len(), 100);
        assert_eq!(s.samples().next(), Some(&at(0, 25.)));
        s.push(at(100, 2.));
        assert_eq!(s.len(), 100);
        assert_eq!(s.samples().next(), Some(&at(1, 1.)));
    }

    #[test]
    fn redraw_is_taken_once_per_batch() {
        let mut s = sink(10);
        assert!(s.take_redraw());
        assert!(!s.take_redraw());
        s.push(at(1, 11.));
        s.push(at(2, 12.));
        assert!(s.take_redraw());
        assert!(!s.take_redraw());
    }

    #[test]
    fn stored_prices_are_not_clamped() {
        let mut s = sink(10);
        s.push(at(1, 250.));
        assert_eq!(s.latest().unwrap().price, 250.);
    }

    #[test]
    fn off_axis_samples_are_left_out_of_the_drawing() {
        assert!(!on_axis(&at(0, 250.)));
        assert!(!on_axis(&at(0, -3.)));
        assert!(on_axis(&at(0, 0.)));
        assert!(on_axis(&at(0, 100.)));
        let svg = render_svg(&[at(1, 40.), at(2, 250.), at(3, 60.), at(4, 70.)]).unwrap();
        assert_eq!(svg.matches("<circle").count(), 3);
        let all_off = render_svg(&[at(1, 150.), at(2, 250.)]).unwrap();
        assert_eq!(all_off.matches("<circle").count(), 0);
    }

    #[test]
    fn renders_svg_with_axis_labels() {
        let mut s = sink(10);
        s.push(at(1, 10.5));
        s.push(at(2, 11.));
        let svg = s.render_svg().unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains(CHART_TITLE));
        assert!(svg.contains("Price ($)"));
        assert!(svg.contains("<circle"));
    }

    #[test]
    fn renders_a_single_instant() {
        let svg = render_svg(&[at(0, 30.)]).unwrap();
        assert!(svg.contains("<circle"));
    }

    #[test]
    fn json_lists_state_and_samples() {
        let mut s = sink(10);
        s.push(at(1, 10.5));
        let v: serde_json::Value = serde_json::from_str(&s.to_json().unwrap()).unwrap();
        assert_eq!(v["state"], "streaming");
        assert_eq!(v["retention"], 10);
        assert_eq!(v["samples"].as_array().unwrap().len(), 2);
        assert_eq!(v["samples"][1]["price"], 10.5);
    }
}
