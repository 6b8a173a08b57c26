//! HTTP listener for Prometheus scrapes.
//!
//! Serves `GET /metrics` with the text exposition format; every other
//! path is a 404. The listener only reads instrument values, so it never
//! blocks or is blocked by the fetch loop.

use std::{convert::Infallible, net::SocketAddr, sync::Arc};

use bytes::Bytes;
use http_body_util::Full;
use hyper::{
    body::Incoming, header, server::conn::http1, service::service_fn, Method, Request, Response,
    StatusCode,
};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::metrics::ExporterMetrics;

/// Bind `addr` and serve scrape requests until the process exits.
///
/// Intended to be spawned onto the runtime next to the exporter task.
pub async fn run_metrics_server(metrics: Arc<ExporterMetrics>, addr: SocketAddr) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!("metrics listener serving on http://{}/metrics", addr);

    loop {
        let (stream, _) = listener.accept().await?;
        let io = TokioIo::new(stream);
        let metrics = metrics.clone();

        tokio::spawn(async move {
            let svc = service_fn(move |req| {
                let metrics = metrics.clone();
                handle_scrape(req, metrics)
            });

            if let Err(e) = http1::Builder::new().serve_connection(io, svc).await {
                error!("metrics connection error: {e}");
            }
        });
    }
}

async fn handle_scrape(
    req: Request<Incoming>,
    metrics: Arc<ExporterMetrics>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    match (req.method(), req.uri().path()) {
        (&Method::GET, "/metrics") => {
            let body = metrics.gather_text();
            Ok(Response::builder()
                .status(StatusCode::OK)
                .header(header::CONTENT_TYPE, "text/plain; version=0.0.4")
                .body(Full::new(Bytes::from(body)))
                .unwrap())
        }
        _ => Ok(Response::builder()
            .status(StatusCode::NOT_FOUND)
            .body(Full::new(Bytes::from("not found")))
            .unwrap()),
    }
}
