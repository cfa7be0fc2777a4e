use crate::chart::{ChartSink, SinkState, CHART_TITLE};
use crate::error::ServerError;
use crate::Sample;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::mpsc::{Receiver, TryRecvError};
use std::time::Duration;
use tiny_http::{Header, Method, Request, Response, Server};
use tracing::{debug, error, info, warn};

/// how long one turn of the loop waits for a viewer request
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// seconds between automatic reloads of the chart page
pub const PAGE_REFRESH_SECS: u32 = 1;

/// The chart state owned by the UI loop: the sink and its last rendering.
/// Samples only get in through `drain`.
#[derive(Debug)]
pub struct ChartView {
    sink: ChartSink,
    svg: String,
    snapshot: Option<PathBuf>,
    feed_done: bool,
}

impl ChartView {
    pub fn new(sink: ChartSink, snapshot: Option<PathBuf>) -> ChartView {
        let mut view = ChartView {
            sink,
            svg: String::new(),
            snapshot,
            feed_done: false,
        };
        view.redraw();
        view
    }

    pub fn sink(&self) -> &ChartSink {
        &self.sink
    }

    pub fn svg(&self) -> &str {
        &self.svg
    }

    pub fn feed_done(&self) -> bool {
        self.feed_done
    }

    /// moves every queued sample into the sink, returns how many
    pub fn drain(&mut self, rx: &Receiver<Sample>) -> usize {
        let mut n = 0;
        loop {
            match rx.try_recv() {
                Ok(sample) => {
                    self.sink.push(sample);
                    n += 1;
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if !self.feed_done {
                        info!("price feed finished, {} samples on the chart", self.sink.len());
                        self.feed_done = true;
                    }
                    break;
                }
            }
        }
        n
    }

    /// re-renders when a redraw is pending, returns whether it did
    pub fn redraw(&mut self) -> bool {
        if !self.sink.take_redraw() {
            return false;
        }
        match self.sink.render_svg() {
            Ok(svg) => {
                if let Some(p) = &self.snapshot {
                    if let Err(e) = std::fs::write(p, &svg) {
                        warn!("could not write chart snapshot {}: {}", p.display(), e);
                    }
                }
                self.svg = svg;
                true
            }
            Err(e) => {
                error!("could not redraw the chart: {}", e);
                false
            }
        }
    }
}

/// status, content type and body of one answer
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
}

impl Reply {
    fn new(status: u16, content_type: &'static str, body: String) -> Reply {
        Reply {
            status,
            content_type,
            body,
        }
    }
}

pub fn route(method: &Method, url: &str, view: &ChartView) -> Reply {
    let path = url.split('?').next().unwrap_or("");
    match (method, path) {
        (Method::Get, "/") => Reply::new(200, "text/html; charset=utf-8", chart_html(view)),
        (Method::Get, "/chart.svg") => Reply::new(200, "image/svg+xml", view.svg().to_string()),
        (Method::Get, "/series") => match view.sink().to_json() {
            Ok(json) => Reply::new(200, "application/json", json),
            Err(e) => Reply::new(
                500,
                "application/json",
                serde_json::json!({ "error": e.to_string() }).to_string(),
            ),
        },
        _ => Reply::new(
            404,
            "application/json",
            "{\"error\":\"not found\"}".to_string(),
        ),
    }
}

fn chart_html(view: &ChartView) -> String {
    let status = match (view.sink().state(), view.sink().latest()) {
        (SinkState::Streaming, Some(s)) => format!("Price: ${:.2} at {}", s.price, s.time.format("%H:%M:%S")),
        _ => "Waiting for the price feed".to_string(),
    };
    format!(
        r#"<!doctype html>
<html>
<head>
  <meta charset="utf-8"/>
  <meta http-equiv="refresh" content="{refresh}"/>
  <title>{title}</title>
  <style>
    body {{ font-family: system-ui, sans-serif; margin: 16px; }}
    .status {{ color: #444; margin-bottom: 8px; }}
    svg {{ width: 100%; height: auto; }}
  </style>
</head>
<body>
  <div class="status">{status}</div>
  {svg}
</body>
</html>
"#,
        refresh = PAGE_REFRESH_SECS,
        title = CHART_TITLE,
        status = status,
        svg = view.svg()
    )
}

/// The single-threaded UI loop: drains the feed, redraws, answers viewers.
pub struct ChartServer {
    server: Server,
    view: ChartView,
}

impl ChartServer {
    pub fn bind(addr: &str, view: ChartView) -> Result<ChartServer, ServerError> {
        let server = Server::http(addr).map_err(|e| ServerError::Bind {
            addr: addr.to_string(),
            reason: e.to_string(),
        })?;
        Ok(ChartServer { server, view })
    }

    pub fn url(&self) -> String {
        match self.server.server_addr().to_ip() {
            Some(SocketAddr::V4(v4)) => format!("http://{}", v4),
            Some(SocketAddr::V6(v6)) => format!("http://{}", v6),
            None => "http://127.0.0.1".to_string(),
        }
    }

    /// runs for the lifetime of the process
    pub fn run(mut self, rx: Receiver<Sample>) -> Result<(), ServerError> {
        info!("serving the live chart at {}", self.url());
        loop {
            self.turn(&rx)?;
        }
    }

    fn turn(&mut self, rx: &Receiver<Sample>) -> Result<(), ServerError> {
        let n = self.view.drain(rx);
        if n > 0 {
            debug!("{} new samples", n);
        }
        self.view.redraw();
        if let Some(request) = self.server.recv_timeout(POLL_INTERVAL)? {
            self.respond(request);
        }
        Ok(())
    }

    fn respond(&self, request: Request) {
        let reply = route(request.method(), request.url(), &self.view);
        debug!("{} {} -> {}", request.method(), request.url(), reply.status);
        let mut response = Response::from_string(reply.body).with_status_code(reply.status);
        if let Ok(h) = Header::from_bytes(&b"Content-Type"[..], reply.content_type.as_bytes()) {
            response.add_header(h);
        }
        if let Err(e) = request.respond(response) {
            warn!("could not answer the viewer: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::prelude::*;
    use std::sync::mpsc;

    fn at(secs: i64, price: f64) -> Sample {
        Sample::new(Local.timestamp(1_700_000_000 + secs, 0), price)
    }

    fn view() -> ChartView {
        ChartView::new(ChartSink::with_placeholder(100, at(0, 20.)), None)
    }

    #[test]
    fn new_view_is_already_rendered() {
        let v = view();
        assert!(v.svg().contains("<svg"));
        assert_eq!(v.sink().state(), SinkState::EmptySeeded);
    }

    #[test]
    fn drain_moves_queued_samples_in_order() {
        let mut v = view();
        let (tx, rx) = mpsc::channel();
        tx.send(at(1, 10.5)).unwrap();
        tx.send(at(2, 11.)).unwrap();
        assert_eq!(v.drain(&rx), 2);
        assert_eq!(v.sink().len(), 3);
        assert_eq!(v.sink().latest(), Some(&at(2, 11.)));
        assert!(!v.feed_done());
        assert!(v.redraw());
        assert!(!v.redraw());
    }

    #[test]
    fn closed_feed_keeps_the_chart() {
        let mut v = view();
        let (tx, rx) = mpsc::channel();
        tx.send(at(1, 10.5)).unwrap();
        drop(tx);
        assert_eq!(v.drain(&rx), 1);
        assert!(v.feed_done());
        assert_eq!(v.drain(&rx), 0);
        assert_eq!(v.sink().state(), SinkState::Streaming);
    }

    #[test]
    fn feed_that_never_sends_stays_seeded() {
        let mut v = view();
        let (tx, rx) = mpsc::channel::<Sample>();
        drop(tx);
        assert_eq!(v.drain(&rx), 0);
        assert!(!v.redraw());
        assert_eq!(v.sink().state(), SinkState::EmptySeeded);
        assert_eq!(v.sink().len(), 1);
    }

    #[test]
    fn index_embeds_the_chart_and_refreshes() {
        let v = view();
        let r = route(&Method::Get, "/", &v);
        assert_eq!(r.status, 200);
        assert!(r.content_type.starts_with("text/html"));
        assert!(r.body.contains("http-equiv=\"refresh\" content=\"1\""));
        assert!(r.body.contains("<svg"));
        assert!(r.body.contains("Waiting for the price feed"));
    }

    #[test]
    fn index_shows_the_latest_price() {
        let mut v = view();
        let (tx, rx) = mpsc::channel();
        tx.send(at(1, 10.5)).unwrap();
        v.drain(&rx);
        v.redraw();
        let r = route(&Method::Get, "/?t=1", &v);
        assert!(r.body.contains("Price: $10.50"));
    }

    #[test]
    fn svg_route() {
        let v = view();
        let r = route(&Method::Get, "/chart.svg", &v);
        assert_eq!(r.status, 200);
        assert_eq!(r.content_type, "image/svg+xml");
        assert_eq!(r.body, v.svg());
    }

    #[test]
    fn series_route_is_json() {
        let v = view();
        let r = route(&Method::Get, "/series", &v);
        assert_eq!(r.status, 200);
        let json: serde_json::Value = serde_json::from_str(&r.body).unwrap();
        assert_eq!(json["state"], "empty_seeded");
        assert_eq!(json["samples"][0]["price"], 20.);
    }

    #[test]
    fn unknown_paths_and_methods_are_not_found() {
        let v = view();
        assert_eq!(route(&Method::Get, "/nope", &v).status, 404);
        assert_eq!(route(&Method::Post, "/", &v).status, 404);
    }

    #[test]
    fn snapshot_is_written_on_redraw() {
        let path = std::env::temp_dir().join(format!("parking_lpp_snapshot_{}.svg", std::process::id()));
        let v = ChartView::new(ChartSink::with_placeholder(10, at(0, 20.)), Some(path.clone()));
        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, v.svg());
        std::fs::remove_file(&path).unwrap();
    }
}
