//! Link construction: new/existing connections (v1) and new/existing clients
//! (v2) per spec §4.D.1. Each path ends with a fully formed [`Link`] or refuses
//! to construct one — there is no partially-validated `Link`.

use crate::chain::AnyChainClient;
use crate::endpoint::{Endpoint, V1Namespace};
use crate::light_client::LightClientDriver;
use crate::link::{Link, PacketFilter};
use primitives::chain::{ChainClient, IbcMessage};
use primitives::error::Error;
use primitives::relay_path::IbcVersion;

const TRANSFER_PORT: &str = "transfer";
const ICS20_VERSION: &str = "ics20-1";

fn submitted_id(prefix: &str, tx: &primitives::chain::TxResult) -> String {
	format!("{prefix}-{}", tx.height.revision_height)
}

async fn submit_one(
	chain: &AnyChainClient,
	msg: IbcMessage,
) -> Result<primitives::chain::TxResult, Error> {
	let tx = chain.submit_ibc_msgs(vec![msg]).await?;
	if !tx.is_ok() {
		return Err(Error::ChainRejected {
			chain_id: chain.chain_id().to_string(),
			tx_hash: tx.tx_hash.clone(),
			height: tx.height,
			code: tx.code,
			raw_log: tx.raw_log.clone(),
		});
	}
	Ok(tx)
}

/// `createWithNewConnections`: creates clients on both sides, waits one block on
/// each, then runs the four-step ICS-003 handshake (Init/Try/Ack/Confirm). A
/// failure at any step aborts construction; partial on-chain state (connections
/// in a non-OPEN state) is left in place, per spec.
pub async fn create_with_new_connections(
	chain_a: AnyChainClient,
	chain_b: AnyChainClient,
	trust_period_override: Option<std::time::Duration>,
	packet_filter: Option<PacketFilter>,
) -> Result<Link, Error> {
	let light_client = LightClientDriver::new();

	let client_id_a = light_client.create_client(&chain_b, &chain_a, trust_period_override).await?;
	let client_id_b = light_client.create_client(&chain_a, &chain_b, trust_period_override).await?;
	chain_a.wait_one_block().await?;
	chain_b.wait_one_block().await?;

	// ConnOpenInit@A
	let tx = submit_one(
		&chain_a,
		IbcMessage::ConnOpenInit {
			client_id: client_id_a.clone(),
			counterparty_client_id: client_id_b.clone(),
		},
	)
	.await?;
	let connection_id_a = submitted_id("connection", &tx);
	let height_a = tx.height;

	// update(B, from A) then ConnOpenTry@B
	light_client.update_client(&chain_a, &chain_b, &client_id_b, height_a.increment()).await?;
	let tx = submit_one(
		&chain_b,
		IbcMessage::ConnOpenTry {
			client_id: client_id_b.clone(),
			counterparty_client_id: client_id_a.clone(),
			counterparty_connection_id: connection_id_a.clone(),
		},
	)
	.await?;
	let connection_id_b = submitted_id("connection", &tx);
	let height_b = tx.height;

	// update(A, from B) then ConnOpenAck@A
	light_client.update_client(&chain_b, &chain_a, &client_id_a, height_b.increment()).await?;
	let tx = submit_one(
		&chain_a,
		IbcMessage::ConnOpenAck {
			connection_id: connection_id_a.clone(),
			counterparty_connection_id: connection_id_b.clone(),
		},
	)
	.await?;
	let height_a2 = tx.height;

	// update(B, from A) then ConnOpenConfirm@B
	light_client.update_client(&chain_a, &chain_b, &client_id_b, height_a2.increment()).await?;
	submit_one(&chain_b, IbcMessage::ConnOpenConfirm { connection_id: connection_id_b.clone() }).await?;

	Ok(finish_v1_construction(
		chain_a,
		chain_b,
		client_id_a,
		client_id_b,
		connection_id_a,
		connection_id_b,
		light_client,
		packet_filter,
	))
}

/// `v1, existing connections`: reads both connections, asserts OPEN state,
/// counterparty-client agreement, chain-id agreement, and that each side's
/// consensus state still matches a freshly queried source header. Any failure
/// refuses construction.
pub async fn with_existing_connections(
	chain_a: AnyChainClient,
	chain_b: AnyChainClient,
	connection_a: String,
	connection_b: String,
	packet_filter: Option<PacketFilter>,
) -> Result<Link, Error> {
	let conn_a = chain_a.query_connection(&connection_a).await?;
	let conn_b = chain_b.query_connection(&connection_b).await?;

	if !conn_a.state.is_relayable() || !conn_b.state.is_relayable() {
		return Err(Error::ProtocolViolation(format!(
			"connections {connection_a}/{connection_b} are not both OPEN"
		)));
	}
	if conn_a.counterparty_client_id != conn_b.client_id || conn_b.counterparty_client_id != conn_a.client_id
	{
		return Err(Error::ProtocolViolation(format!(
			"connections {connection_a}/{connection_b} do not reference each other's client"
		)));
	}

	let client_state_a = chain_a.query_client_state(&conn_a.client_id).await?;
	let client_state_b = chain_b.query_client_state(&conn_b.client_id).await?;
	if client_state_a.chain_id != chain_b.chain_id() {
		return Err(Error::ProtocolViolation(format!(
			"client {} on A tracks chain-id {} but B reports {}",
			conn_a.client_id,
			client_state_a.chain_id,
			chain_b.chain_id()
		)));
	}
	if client_state_b.chain_id != chain_a.chain_id() {
		return Err(Error::ProtocolViolation(format!(
			"client {} on B tracks chain-id {} but A reports {}",
			conn_b.client_id,
			client_state_b.chain_id,
			chain_a.chain_id()
		)));
	}

	let light_client = LightClientDriver::new();
	light_client.assert_headers_match_consensus_state(&chain_b, &chain_a, &conn_a.client_id).await?;
	light_client.assert_headers_match_consensus_state(&chain_a, &chain_b, &conn_b.client_id).await?;

	Ok(finish_v1_construction(
		chain_a,
		chain_b,
		conn_a.client_id,
		conn_b.client_id,
		connection_a,
		connection_b,
		light_client,
		packet_filter,
	))
}

/// Opens a `transfer`/`ics20-1` channel over an already-OPEN connection pair and
/// returns the resulting `Link`, ready for relay rounds. This is the v1 half of
/// the CLI's `add-path`, run after either construction path above.
pub async fn open_transfer_channel(
	mut link: Link,
	ordered: bool,
) -> Result<Link, Error> {
	let (connection_a, connection_b) = {
		let ns_a = link.end_a.v1.as_ref().ok_or_else(|| {
			Error::ProtocolViolation("open_transfer_channel requires a v1 link".into())
		})?;
		let ns_b = link.end_b.v1.as_ref().expect("v1 link has namespaces on both endpoints");
		(ns_a.connection_id.clone(), ns_b.connection_id.clone())
	};

	let tx = submit_one(
		&link.end_a.client,
		IbcMessage::ChanOpenInit {
			port_id: TRANSFER_PORT.into(),
			connection_id: connection_a,
			version: ICS20_VERSION.into(),
		},
	)
	.await?;
	let channel_a = submitted_id("channel", &tx);
	let height_a = tx.height;

	link.light_client
		.update_client(&link.end_a.client, &link.end_b.client, &link.end_b.client_id, height_a.increment())
		.await?;
	let tx = submit_one(
		&link.end_b.client,
		IbcMessage::ChanOpenTry {
			port_id: TRANSFER_PORT.into(),
			connection_id: connection_b,
			counterparty_channel_id: channel_a.clone(),
			version: ICS20_VERSION.into(),
		},
	)
	.await?;
	let channel_b = submitted_id("channel", &tx);
	let height_b = tx.height;

	link.light_client
		.update_client(&link.end_b.client, &link.end_a.client, &link.end_a.client_id, height_b.increment())
		.await?;
	let tx = submit_one(
		&link.end_a.client,
		IbcMessage::ChanOpenAck {
			port_id: TRANSFER_PORT.into(),
			channel_id: channel_a.clone(),
			counterparty_channel_id: channel_b.clone(),
		},
	)
	.await?;
	let height_a2 = tx.height;

	link.light_client
		.update_client(&link.end_a.client, &link.end_b.client, &link.end_b.client_id, height_a2.increment())
		.await?;
	submit_one(
		&link.end_b.client,
		IbcMessage::ChanOpenConfirm { port_id: TRANSFER_PORT.into(), channel_id: channel_b.clone() },
	)
	.await?;

	if let Some(ns) = link.end_a.v1.as_mut() {
		ns.port_id = TRANSFER_PORT.into();
		ns.channel_id = channel_a;
		ns.ordered = ordered;
	}
	if let Some(ns) = link.end_b.v1.as_mut() {
		ns.port_id = TRANSFER_PORT.into();
		ns.channel_id = channel_b;
		ns.ordered = ordered;
	}
	Ok(link)
}

fn finish_v1_construction(
	chain_a: AnyChainClient,
	chain_b: AnyChainClient,
	client_id_a: String,
	client_id_b: String,
	connection_a: String,
	connection_b: String,
	light_client: LightClientDriver,
	packet_filter: Option<PacketFilter>,
) -> Link {
	// Channel id/port are filled in by `open_transfer_channel`; an empty channel
	// id marks a v1 Link that cannot yet run relay rounds.
	let end_a = Endpoint::new_v1(
		chain_a,
		client_id_a,
		V1Namespace { connection_id: connection_a, port_id: String::new(), channel_id: String::new(), ordered: false },
	);
	let end_b = Endpoint::new_v1(
		chain_b,
		client_id_b,
		V1Namespace { connection_id: connection_b, port_id: String::new(), channel_id: String::new(), ordered: false },
	);
	let mut link = Link::new(IbcVersion::V1, end_a, end_b, packet_filter);
	link.light_client = light_client;
	link
}

/// `createWithNewClientsV2`: creates both clients, waits a block on each, then
/// registers the counterparty on both sides. No channel/connection handshake.
pub async fn create_with_new_clients_v2(
	chain_a: AnyChainClient,
	chain_b: AnyChainClient,
	trust_period_override: Option<std::time::Duration>,
	merkle_prefix: Vec<u8>,
	packet_filter: Option<PacketFilter>,
) -> Result<Link, Error> {
	let light_client = LightClientDriver::new();

	let client_id_a = light_client.create_client(&chain_b, &chain_a, trust_period_override).await?;
	let client_id_b = light_client.create_client(&chain_a, &chain_b, trust_period_override).await?;
	chain_a.wait_one_block().await?;
	chain_b.wait_one_block().await?;

	chain_a.register_counterparty(&client_id_a, &client_id_b, &merkle_prefix).await?;
	chain_b.register_counterparty(&client_id_b, &client_id_a, &merkle_prefix).await?;

	let end_a = Endpoint::new_v2(chain_a, client_id_a);
	let end_b = Endpoint::new_v2(chain_b, client_id_b);
	let mut link = Link::new(IbcVersion::V2, end_a, end_b, packet_filter);
	link.light_client = light_client;
	Ok(link)
}

/// `v2, existing clients`: reads `counterparty(clientLocal)` from each side,
/// asserts it names the opposite client, asserts chain-ids match client-state
/// chain-ids, then runs the same headers-vs-consensus-state check as v1.
pub async fn with_existing_clients_v2(
	chain_a: AnyChainClient,
	chain_b: AnyChainClient,
	client_a: String,
	client_b: String,
	packet_filter: Option<PacketFilter>,
) -> Result<Link, Error> {
	let counterparty_a = chain_a.query_counterparty(&client_a).await?;
	let counterparty_b = chain_b.query_counterparty(&client_b).await?;

	if counterparty_a.client_id_remote != client_b || counterparty_b.client_id_remote != client_a {
		return Err(Error::ProtocolViolation(format!(
			"counterparty registrations for {client_a}/{client_b} do not reference each other"
		)));
	}

	let client_state_a = chain_a.query_client_state(&client_a).await?;
	let client_state_b = chain_b.query_client_state(&client_b).await?;
	if client_state_a.chain_id != chain_b.chain_id() {
		return Err(Error::ProtocolViolation(format!(
			"client {client_a} on A tracks chain-id {} but B reports {}",
			client_state_a.chain_id,
			chain_b.chain_id()
		)));
	}
	if client_state_b.chain_id != chain_a.chain_id() {
		return Err(Error::ProtocolViolation(format!(
			"client {client_b} on B tracks chain-id {} but A reports {}",
			client_state_b.chain_id,
			chain_a.chain_id()
		)));
	}

	let light_client = LightClientDriver::new();
	light_client.assert_headers_match_consensus_state(&chain_b, &chain_a, &client_a).await?;
	light_client.assert_headers_match_consensus_state(&chain_a, &chain_b, &client_b).await?;

	let end_a = Endpoint::new_v2(chain_a, client_a);
	let end_b = Endpoint::new_v2(chain_b, client_b);
	let mut link = Link::new(IbcVersion::V2, end_a, end_b, packet_filter);
	link.light_client = light_client;
	Ok(link)
}
