//! Owns a set of Links by id, polls each in a loop, persists watermarks, updates
//! stale clients, emits telemetry. A poll-tick model over persisted paths rather
//! than relaying off finality-event streams, but relaying stays cooperative and
//! non-terminating on a single path's failure either way.

use crate::link::{Link, RoundConfig};
use metrics::handler::MetricsHandler;
use primitives::error::Error;
use primitives::relay_path::RelayPath;
use primitives::watermark::Watermark;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use store::Store;

pub type PathId = i64;

pub type LinkFactory =
	Arc<dyn Fn(RelayPath) -> Pin<Box<dyn Future<Output = Result<Link, Error>> + Send>> + Send + Sync>;

pub struct SchedulerConfig {
	pub poll_interval: Duration,
	pub max_age_dest: Duration,
	pub max_age_src: Duration,
	pub round: RoundConfig,
}

pub struct Scheduler {
	links: HashMap<PathId, Link>,
	store: Store,
	metrics: Option<MetricsHandler>,
	link_factory: Option<LinkFactory>,
	config: SchedulerConfig,
	running: Arc<AtomicBool>,
}

impl Scheduler {
	pub fn new(store: Store, metrics: Option<MetricsHandler>, config: SchedulerConfig) -> Self {
		Self {
			links: HashMap::new(),
			store,
			metrics,
			link_factory: None,
			config,
			running: Arc::new(AtomicBool::new(true)),
		}
	}

	pub fn with_link_factory(mut self, factory: LinkFactory) -> Self {
		self.link_factory = Some(factory);
		self
	}

	pub fn insert_link(&mut self, path_id: PathId, link: Link) {
		self.links.insert(path_id, link);
	}

	pub fn stop_handle(&self) -> Arc<AtomicBool> {
		self.running.clone()
	}

	/// `loop while running: reconstruct missing links, tick every Link, sleep`.
	/// Exceptions in one Link are logged and never terminate the loop.
	pub async fn run(&mut self) -> Result<(), Error> {
		while self.running.load(Ordering::SeqCst) {
			self.reconcile_persisted_paths().await?;

			let path_ids: Vec<PathId> = self.links.keys().copied().collect();
			for path_id in path_ids {
				if let Err(err) = self.tick(path_id).await {
					tracing::warn!(target: "hyperspace::scheduler", path_id, error = %err, "round failed, will retry next tick");
					if let Some(metrics) = &self.metrics {
						metrics.record_error(path_id, &err);
					}
				}
			}

			tokio::time::sleep(self.config.poll_interval).await;
		}
		Ok(())
	}

	async fn reconcile_persisted_paths(&mut self) -> Result<(), Error> {
		let Some(factory) = self.link_factory.clone() else { return Ok(()) };
		let paths = self.store.list_relay_paths().await?;
		for path in paths {
			let Some(id) = path.id else { continue };
			if self.links.contains_key(&id) {
				continue;
			}
			match factory(path).await {
				Ok(link) => {
					tracing::info!(target: "hyperspace::scheduler", path_id = id, "reconstructed link");
					self.links.insert(id, link);
				},
				Err(err) => {
					tracing::warn!(target: "hyperspace::scheduler", path_id = id, error = %err, "failed to reconstruct link");
				},
			}
		}
		Ok(())
	}

	async fn tick(&mut self, path_id: PathId) -> Result<(), Error> {
		let watermark = self.store.get_watermark(path_id).await?.unwrap_or(Watermark::ZERO);
		let link = self.links.get(&path_id).ok_or_else(|| Error::Store(format!("no link for path {path_id}")))?;

		let new_watermark = link.relay_round_both_directions(watermark, self.config.round).await?;
		if !new_watermark.advanced_from(&watermark) {
			return Err(Error::ProtocolViolation("watermark regressed".into()));
		}
		self.store.put_watermark(path_id, new_watermark).await?;

		if let Some(metrics) = &self.metrics {
			metrics.record_round(path_id, &new_watermark);
		}

		link.light_client
			.update_if_stale(
				&link.end_a.client,
				&link.end_b.client,
				&link.end_b.client_id,
				self.config.max_age_dest,
			)
			.await?;
		link.light_client
			.update_if_stale(
				&link.end_b.client,
				&link.end_a.client,
				&link.end_a.client_id,
				self.config.max_age_src,
			)
			.await?;

		Ok(())
	}
}
