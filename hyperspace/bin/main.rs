//! Entry point: parse the CLI (spec §6), load config + env overrides, open the
//! Store, and dispatch to `hyperspace_core::command`.

use clap::Parser;
use core::command::{self, Cli, Command, EndpointSpec};
use core::config::Config;
use primitives::relay_path::ChainType;
use std::net::SocketAddr;
use store::Store;

const DEFAULT_METRICS_ADDR: &str = "0.0.0.0:9186";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	core::logging::init();

	let cli = Cli::parse();
	let mut config = load_config(&cli.config)?;
	config.apply_env_overrides();

	let store = Store::connect(&config.db_file).await?;

	match cli.command {
		Command::AddMnemonic { chain_id } => {
			let mnemonic = read_secret_line("Enter mnemonic: ")?;
			command::handle_add_mnemonic(&store, &chain_id, &mnemonic).await?;
			println!("stored mnemonic for {chain_id}");
		},
		Command::AddGasPrice { chain_id, price_denom } => {
			command::handle_add_gas_price(&store, &chain_id, &price_denom).await?;
			println!("stored gas price {price_denom} for {chain_id}");
		},
		Command::AddPath {
			src_chain_id,
			src_url,
			src_query_url,
			dst_chain_id,
			dst_url,
			dst_query_url,
			src_type,
			dst_type,
			ibc_version,
			ordered,
		} => {
			let src = EndpointSpec {
				chain_id: src_chain_id,
				chain_type: ChainType::from(src_type),
				rpc_url: src_url,
				query_url: src_query_url,
			};
			let dst = EndpointSpec {
				chain_id: dst_chain_id,
				chain_type: ChainType::from(dst_type),
				rpc_url: dst_url,
				query_url: dst_query_url,
			};
			let path_id = command::handle_add_path(&store, src, dst, ibc_version, ordered).await?;
			println!("created relay path {path_id}");
		},
		Command::Relay => {
			let metrics_addr: SocketAddr = DEFAULT_METRICS_ADDR.parse().expect("valid default metrics address");
			command::handle_relay(config, store, metrics_addr).await?;
		},
		Command::DumpPaths => {
			let json = command::handle_dump_paths(&store).await?;
			println!("{json}");
		},
	}

	Ok(())
}

fn load_config(path: &str) -> anyhow::Result<Config> {
	match std::fs::read_to_string(path) {
		Ok(contents) => Ok(Config::from_toml_str(&contents)?),
		Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Config::from_toml_str("")?),
		Err(err) => Err(err.into()),
	}
}

fn read_secret_line(prompt: &str) -> anyhow::Result<String> {
	use std::io::Write;
	print!("{prompt}");
	std::io::stdout().flush()?;
	let mut line = String::new();
	std::io::stdin().read_line(&mut line)?;
	Ok(line.trim().to_string())
}
