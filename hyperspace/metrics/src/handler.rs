//! Per-path counters and gauges plus a minimal hyper server exposing them at
//! `/metrics` in the Prometheus text exposition format.

use crate::error::MetricsError;
use prometheus::{Encoder, HistogramVec, IntCounterVec, IntGaugeVec, Registry, TextEncoder};
use primitives::error::Error as RelayError;
use primitives::watermark::Watermark;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use hyper::service::{make_service_fn, service_fn};
use hyper::{Body, Request, Response, Server};

#[derive(Clone)]
pub struct MetricsHandler {
	registry: Registry,
	rounds_total: IntCounterVec,
	errors_total: IntCounterVec,
	transient_errors_total: IntCounterVec,
	packet_height_a: IntGaugeVec,
	packet_height_b: IntGaugeVec,
	ack_height_a: IntGaugeVec,
	ack_height_b: IntGaugeVec,
	round_duration_seconds: HistogramVec,
}

impl MetricsHandler {
	pub fn new() -> Result<Self, MetricsError> {
		let registry = Registry::new();

		let rounds_total = IntCounterVec::new(
			prometheus::Opts::new("hyperspace_rounds_total", "completed relay rounds per path"),
			&["path_id"],
		)?;
		let errors_total = IntCounterVec::new(
			prometheus::Opts::new("hyperspace_errors_total", "round failures per path"),
			&["path_id"],
		)?;
		let transient_errors_total = IntCounterVec::new(
			prometheus::Opts::new(
				"hyperspace_transient_errors_total",
				"round failures classified as transient per path",
			),
			&["path_id"],
		)?;
		let packet_height_a = IntGaugeVec::new(
			prometheus::Opts::new("hyperspace_packet_height_a", "packet watermark height on chain A"),
			&["path_id"],
		)?;
		let packet_height_b = IntGaugeVec::new(
			prometheus::Opts::new("hyperspace_packet_height_b", "packet watermark height on chain B"),
			&["path_id"],
		)?;
		let ack_height_a = IntGaugeVec::new(
			prometheus::Opts::new("hyperspace_ack_height_a", "ack watermark height on chain A"),
			&["path_id"],
		)?;
		let ack_height_b = IntGaugeVec::new(
			prometheus::Opts::new("hyperspace_ack_height_b", "ack watermark height on chain B"),
			&["path_id"],
		)?;
		let round_duration_seconds = HistogramVec::new(
			prometheus::HistogramOpts::new(
				"hyperspace_round_duration_seconds",
				"wall-clock time spent in a relay round",
			),
			&["path_id"],
		)?;

		registry.register(Box::new(rounds_total.clone()))?;
		registry.register(Box::new(errors_total.clone()))?;
		registry.register(Box::new(transient_errors_total.clone()))?;
		registry.register(Box::new(packet_height_a.clone()))?;
		registry.register(Box::new(packet_height_b.clone()))?;
		registry.register(Box::new(ack_height_a.clone()))?;
		registry.register(Box::new(ack_height_b.clone()))?;
		registry.register(Box::new(round_duration_seconds.clone()))?;

		Ok(Self {
			registry,
			rounds_total,
			errors_total,
			transient_errors_total,
			packet_height_a,
			packet_height_b,
			ack_height_a,
			ack_height_b,
			round_duration_seconds,
		})
	}

	pub fn record_round(&self, path_id: i64, watermark: &Watermark) {
		let label = path_id.to_string();
		self.rounds_total.with_label_values(&[&label]).inc();
		self.packet_height_a.with_label_values(&[&label]).set(watermark.packet_height_a.revision_height as i64);
		self.packet_height_b.with_label_values(&[&label]).set(watermark.packet_height_b.revision_height as i64);
		self.ack_height_a.with_label_values(&[&label]).set(watermark.ack_height_a.revision_height as i64);
		self.ack_height_b.with_label_values(&[&label]).set(watermark.ack_height_b.revision_height as i64);
	}

	pub fn record_error(&self, path_id: i64, err: &RelayError) {
		let label = path_id.to_string();
		self.errors_total.with_label_values(&[&label]).inc();
		if err.is_transient() {
			self.transient_errors_total.with_label_values(&[&label]).inc();
		}
	}

	pub fn observe_round_duration(&self, path_id: i64, seconds: f64) {
		let label = path_id.to_string();
		self.round_duration_seconds.with_label_values(&[&label]).observe(seconds);
	}

	fn gather(&self) -> Vec<u8> {
		let mut buf = Vec::new();
		let encoder = TextEncoder::new();
		let families = self.registry.gather();
		encoder.encode(&families, &mut buf).expect("prometheus encoding is infallible for its own metric types");
		buf
	}

	/// Serves `/metrics` on `addr` until the process exits. Bound by the bin
	/// crate alongside the relay loop, not by the Scheduler itself.
	pub async fn serve(self: Arc<Self>, addr: SocketAddr) -> Result<(), MetricsError> {
		let make_svc = make_service_fn(move |_conn| {
			let handler = self.clone();
			async move {
				Ok::<_, Infallible>(service_fn(move |req: Request<Body>| {
					let handler = handler.clone();
					async move {
						let body = if req.uri().path() == "/metrics" {
							handler.gather()
						} else {
							b"not found".to_vec()
						};
						Ok::<_, Infallible>(Response::new(Body::from(body)))
					}
				}))
			}
		});
		Server::bind(&addr).serve(make_svc).await.map_err(MetricsError::Serve)
	}
}
