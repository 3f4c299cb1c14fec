//! The CLI subcommand surface of spec §6: `add-mnemonic`, `add-gas-price`,
//! `add-path`, `relay`, `dump-paths`. Argument parsing is `clap`'s job; this
//! module is the business logic each subcommand drives, so `bin/main.rs` stays a
//! thin dispatcher.

use crate::chain::AnyChainClient;
use crate::config::Config;
use crate::construct;
use crate::link::RoundConfig;
use crate::scheduler::{LinkFactory, Scheduler, SchedulerConfig};
use clap::{Parser, Subcommand, ValueEnum};
use metrics::MetricsHandler;
use primitives::chain::ChainClient;
use primitives::chain_fee::ChainFee;
use primitives::error::Error;
use primitives::relay_path::{ChainType, IbcVersion, RelayPath};
use std::sync::Arc;
use store::Store;

const DEFAULT_TRUSTING_PERIOD_SECS: u64 = 14 * 24 * 3600;
const DEFAULT_MAX_CLOCK_DRIFT_SECS: u64 = 20;
const REGISTER_MERKLE_PREFIX: &[u8] = b"ibc";
const VALID_MNEMONIC_WORD_COUNTS: [usize; 5] = [12, 15, 18, 21, 24];

#[derive(Parser)]
#[command(name = "hyperspace", about = "A relayer for Cosmos and Gno IBC chains")]
pub struct Cli {
	/// Path to the TOML config file.
	#[arg(long, default_value = "config.toml")]
	pub config: String,

	#[command(subcommand)]
	pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
	/// Store a BIP-39 mnemonic for `chain_id`, read from stdin.
	AddMnemonic {
		#[arg(long = "chain-id")]
		chain_id: String,
	},
	/// Record a gas price such as `0.025uatom` for `chain_id`.
	AddGasPrice {
		#[arg(long = "chain-id")]
		chain_id: String,
		price_denom: String,
	},
	/// Construct and persist a relay path between two chains.
	AddPath {
		#[arg(short = 's', long = "src")]
		src_chain_id: String,
		#[arg(long = "surl")]
		src_url: String,
		#[arg(long = "squery")]
		src_query_url: Option<String>,
		#[arg(short = 'd', long = "dst")]
		dst_chain_id: String,
		#[arg(long = "durl")]
		dst_url: String,
		#[arg(long = "dquery")]
		dst_query_url: Option<String>,
		#[arg(long = "st")]
		src_type: ChainTypeArg,
		#[arg(long = "dt")]
		dst_type: ChainTypeArg,
		#[arg(long = "ibcv")]
		ibc_version: u8,
		/// v1 only: open the `transfer` channel as ORDERED instead of UNORDERED.
		#[arg(long)]
		ordered: bool,
	},
	/// Start the relay loop.
	Relay,
	/// Emit persisted paths as JSON.
	DumpPaths,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
#[value(rename_all = "lower")]
pub enum ChainTypeArg {
	Cosmos,
	Gno,
}

impl From<ChainTypeArg> for ChainType {
	fn from(t: ChainTypeArg) -> Self {
		match t {
			ChainTypeArg::Cosmos => ChainType::Cosmos,
			ChainTypeArg::Gno => ChainType::Gno,
		}
	}
}

/// Everything `add-path` (or link reconstruction at `relay` startup) needs to
/// build a [`AnyChainClient`] for one side of a path; mnemonic and gas price come
/// from the Store, not the CLI (spec §6 splits those across separate commands).
pub struct EndpointSpec {
	pub chain_id: String,
	pub chain_type: ChainType,
	pub rpc_url: String,
	pub query_url: Option<String>,
}

/// Validates word count per spec §6 (`12/15/18/21/24`) and persists the
/// mnemonic. Empty or malformed input is a `Configuration` error, matching the
/// CLI's "non-zero exit on empty/malformed/missing input" contract.
pub async fn handle_add_mnemonic(store: &Store, chain_id: &str, mnemonic: &str) -> Result<(), Error> {
	let mnemonic = mnemonic.trim();
	let word_count = mnemonic.split_whitespace().count();
	if mnemonic.is_empty() || !VALID_MNEMONIC_WORD_COUNTS.contains(&word_count) {
		return Err(Error::Configuration(format!(
			"mnemonic must be 12, 15, 18, 21 or 24 words, got {word_count}"
		)));
	}
	store.put_mnemonic(chain_id, mnemonic).await.map_err(Into::into)
}

pub async fn handle_add_gas_price(store: &Store, chain_id: &str, price_denom: &str) -> Result<(), Error> {
	let fee = ChainFee::parse(price_denom)?;
	store.put_chain_fee(chain_id, &fee).await.map_err(Into::into)
}

/// Builds the chain client for one side of a path: looks up the mnemonic and
/// gas price this process has been told about via `add-mnemonic`/`add-gas-price`,
/// then constructs the chain-family-specific client from the CLI-supplied urls.
async fn build_chain_client(store: &Store, spec: &EndpointSpec) -> Result<AnyChainClient, Error> {
	let mnemonic = store.get_mnemonic(&spec.chain_id).await?.ok_or_else(|| {
		Error::Configuration(format!("no mnemonic stored for chain {}; run add-mnemonic first", spec.chain_id))
	})?;
	let fee = store.get_chain_fee(&spec.chain_id).await?.ok_or_else(|| {
		Error::Configuration(format!("no gas price stored for chain {}; run add-gas-price first", spec.chain_id))
	})?;

	match spec.chain_type {
		ChainType::Cosmos => {
			#[cfg(feature = "cosmos")]
			{
				let config = cosmos::CosmosClientConfig {
					name: spec.chain_id.clone(),
					rpc_url: spec.rpc_url.clone(),
					grpc_url: spec.query_url.clone().unwrap_or_else(|| spec.rpc_url.clone()),
					chain_id: spec.chain_id.clone(),
					client_id: None,
					connection_id: None,
					account_prefix: "cosmos".into(),
					store_prefix: "ibc".into(),
					key_name: spec.chain_id.clone(),
					gas_price: fee.gas_price,
					gas_denom: fee.gas_denom,
					trusting_period_secs: DEFAULT_TRUSTING_PERIOD_SECS,
					max_clock_drift_secs: DEFAULT_MAX_CLOCK_DRIFT_SECS,
				};
				Ok(AnyChainClient::Cosmos(cosmos::CosmosClient::new(config, &mnemonic).await?))
			}
			#[cfg(not(feature = "cosmos"))]
			Err(Error::Configuration(format!("chain {} is Cosmos but this binary was built without cosmos support", spec.chain_id)))
		},
		ChainType::Gno => {
			#[cfg(feature = "gno")]
			{
				let config = gno::GnoClientConfig {
					name: spec.chain_id.clone(),
					rpc_url: spec.rpc_url.clone(),
					chain_id: spec.chain_id.clone(),
					client_id: None,
					account_prefix: "gno".into(),
					key_name: spec.chain_id.clone(),
					gas_price: fee.gas_price,
					gas_denom: fee.gas_denom,
				};
				Ok(AnyChainClient::Gno(gno::GnoClient::new(config, &mnemonic).await?))
			}
			#[cfg(not(feature = "gno"))]
			Err(Error::Configuration(format!("chain {} is Gno but this binary was built without gno support", spec.chain_id)))
		},
	}
}

/// Constructs a path end to end (clients, then connections+channel for v1 or
/// counterparty registration for v2) and persists it. Returns the new path id.
pub async fn handle_add_path(
	store: &Store,
	src: EndpointSpec,
	dst: EndpointSpec,
	ibc_version: u8,
	ordered: bool,
) -> Result<i64, Error> {
	let chain_a = build_chain_client(store, &src).await?;
	let chain_b = build_chain_client(store, &dst).await?;

	let relay_path = match ibc_version {
		1 => {
			let link = construct::create_with_new_connections(chain_a, chain_b, None, None).await?;
			let link = construct::open_transfer_channel(link, ordered).await?;
			let ns_a = link.end_a.v1.as_ref().expect("v1 construction always yields a namespace");
			let ns_b = link.end_b.v1.as_ref().expect("v1 construction always yields a namespace");
			RelayPath {
				id: None,
				chain_id_a: link.end_a.client.chain_id(),
				node_a: src.rpc_url,
				query_node_a: src.query_url,
				chain_id_b: link.end_b.client.chain_id(),
				node_b: dst.rpc_url,
				query_node_b: dst.query_url,
				chain_type_a: src.chain_type,
				chain_type_b: dst.chain_type,
				client_a: ns_a.connection_id.clone(),
				client_b: ns_b.connection_id.clone(),
				version: IbcVersion::V1,
				port_id: Some(ns_a.port_id.clone()),
				channel_a: Some(ns_a.channel_id.clone()),
				channel_b: Some(ns_b.channel_id.clone()),
				ordered,
			}
		},
		2 => {
			let link =
				construct::create_with_new_clients_v2(chain_a, chain_b, None, REGISTER_MERKLE_PREFIX.to_vec(), None)
					.await?;
			RelayPath {
				id: None,
				chain_id_a: link.end_a.client.chain_id(),
				node_a: src.rpc_url,
				query_node_a: src.query_url,
				chain_id_b: link.end_b.client.chain_id(),
				node_b: dst.rpc_url,
				query_node_b: dst.query_url,
				chain_type_a: src.chain_type,
				chain_type_b: dst.chain_type,
				client_a: link.end_a.client_id.clone(),
				client_b: link.end_b.client_id.clone(),
				version: IbcVersion::V2,
				port_id: None,
				channel_a: None,
				channel_b: None,
				ordered: false,
			}
		},
		other => return Err(Error::Configuration(format!("unsupported --ibcv {other}, expected 1 or 2"))),
	};

	store.insert_relay_path(&relay_path).await.map_err(Into::into)
}

/// Rebuilds a [`crate::link::Link`] from a persisted path at `relay` startup or
/// whenever the Scheduler finds a path with no live Link (spec §4.E).
async fn reconstruct_link(store: &Store, path: RelayPath) -> Result<crate::link::Link, Error> {
	let spec_a = EndpointSpec {
		chain_id: path.chain_id_a.as_str().to_string(),
		chain_type: path.chain_type_a,
		rpc_url: path.node_a.clone(),
		query_url: path.query_node_a.clone(),
	};
	let spec_b = EndpointSpec {
		chain_id: path.chain_id_b.as_str().to_string(),
		chain_type: path.chain_type_b,
		rpc_url: path.node_b.clone(),
		query_url: path.query_node_b.clone(),
	};
	let chain_a = build_chain_client(store, &spec_a).await?;
	let chain_b = build_chain_client(store, &spec_b).await?;

	match path.version {
		IbcVersion::V1 => {
			let (port_id, channel_a, channel_b) = match (path.port_id, path.channel_a, path.channel_b) {
				(Some(p), Some(ca), Some(cb)) => (p, ca, cb),
				_ => {
					return Err(Error::ProtocolViolation(format!(
						"path {} is v1 but has no channel yet; its add-path never finished",
						path.id.unwrap_or_default()
					)))
				},
			};
			let mut link =
				construct::with_existing_connections(chain_a, chain_b, path.client_a, path.client_b, None).await?;
			if let Some(ns) = link.end_a.v1.as_mut() {
				ns.port_id = port_id.clone();
				ns.channel_id = channel_a;
				ns.ordered = path.ordered;
			}
			if let Some(ns) = link.end_b.v1.as_mut() {
				ns.port_id = port_id;
				ns.channel_id = channel_b;
				ns.ordered = path.ordered;
			}
			Ok(link)
		},
		IbcVersion::V2 => {
			construct::with_existing_clients_v2(chain_a, chain_b, path.client_a, path.client_b, None).await
		},
	}
}

/// Runs the Scheduler loop and the metrics HTTP server side by side until the
/// process is interrupted.
pub async fn handle_relay(config: Config, store: Store, metrics_addr: std::net::SocketAddr) -> Result<(), Error> {
	let round = RoundConfig {
		timeout_blocks_slack: config.relay.timeout_blocks_slack,
		timeout_seconds_slack: config.relay.timeout_seconds_slack,
	};
	let scheduler_config = SchedulerConfig {
		poll_interval: config.relay.poll_interval(),
		max_age_dest: config.relay.max_age_dest(),
		max_age_src: config.relay.max_age_src(),
		round,
	};

	let metrics = MetricsHandler::new().map_err(|e| Error::Configuration(e.to_string()))?;
	let metrics_server = Arc::new(metrics.clone());

	let factory_store = store.clone();
	let factory: LinkFactory = Arc::new(move |path: RelayPath| {
		let store = factory_store.clone();
		Box::pin(async move { reconstruct_link(&store, path).await })
	});

	let mut scheduler = Scheduler::new(store, Some(metrics), scheduler_config).with_link_factory(factory);

	let (scheduler_result, serve_result) =
		tokio::join!(scheduler.run(), metrics_server.serve(metrics_addr));
	serve_result.map_err(|e| Error::Configuration(e.to_string()))?;
	scheduler_result
}

#[derive(serde::Serialize)]
struct RelayPathJson {
	id: Option<i64>,
	chain_id_a: String,
	node_a: String,
	query_node_a: Option<String>,
	chain_id_b: String,
	node_b: String,
	query_node_b: Option<String>,
	chain_type_a: &'static str,
	chain_type_b: &'static str,
	client_a: String,
	client_b: String,
	version: u8,
	port_id: Option<String>,
	channel_a: Option<String>,
	channel_b: Option<String>,
	ordered: bool,
}

fn chain_type_str(t: ChainType) -> &'static str {
	match t {
		ChainType::Cosmos => "cosmos",
		ChainType::Gno => "gno",
	}
}

impl From<&RelayPath> for RelayPathJson {
	fn from(p: &RelayPath) -> Self {
		Self {
			id: p.id,
			chain_id_a: p.chain_id_a.as_str().to_string(),
			node_a: p.node_a.clone(),
			query_node_a: p.query_node_a.clone(),
			chain_id_b: p.chain_id_b.as_str().to_string(),
			node_b: p.node_b.clone(),
			query_node_b: p.query_node_b.clone(),
			chain_type_a: chain_type_str(p.chain_type_a),
			chain_type_b: chain_type_str(p.chain_type_b),
			client_a: p.client_a.clone(),
			client_b: p.client_b.clone(),
			version: match p.version {
				IbcVersion::V1 => 1,
				IbcVersion::V2 => 2,
			},
			port_id: p.port_id.clone(),
			channel_a: p.channel_a.clone(),
			channel_b: p.channel_b.clone(),
			ordered: p.ordered,
		}
	}
}

pub async fn handle_dump_paths(store: &Store) -> Result<String, Error> {
	let paths = store.list_relay_paths().await?;
	let json: Vec<RelayPathJson> = paths.iter().map(RelayPathJson::from).collect();
	serde_json::to_string_pretty(&json).map_err(|e| Error::Configuration(e.to_string()))
}
