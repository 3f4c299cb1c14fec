//! End-to-end coverage of the Relay Engine against `MockChainClient`, exercising
//! the concrete scenarios the core crate's unit tests can't reach on their own:
//! full link construction, a two-sided relay round, timeouts, packet filtering,
//! light-client staleness, and divergent-consensus rejection.

use core::chain::AnyChainClient;
use core::construct;
use core::light_client::LightClientDriver;
use core::link::{Direction, RoundConfig};
use core::scheduler::{PathId, Scheduler, SchedulerConfig};
use primitives::chain::ChainClient;
use primitives::client_state::{ClientState, ConsensusState, ProofSpec};
use primitives::connection::CounterpartyRegistration;
use primitives::error::Error;
use primitives::height::Height;
use primitives::mock::MockChainClient;
use primitives::packet::{Packet, PacketV2};
use primitives::watermark::Watermark;
use std::sync::atomic::Ordering;
use std::time::Duration;
use tokio::task::JoinHandle;

const NO_SLACK: RoundConfig = RoundConfig { timeout_blocks_slack: 0, timeout_seconds_slack: 0 };

/// `wait_one_block` polls `current_height`, which only moves when someone calls
/// `advance_block`. Keep a background ticker running for the lifetime of a test so
/// every construction/relay step that waits for a block gets one.
fn spawn_block_ticker(chains: Vec<MockChainClient>) -> JoinHandle<()> {
	tokio::spawn(async move {
		loop {
			tokio::time::sleep(Duration::from_millis(20)).await;
			for chain in &chains {
				chain.advance_block();
			}
		}
	})
}

fn base_client_state(chain_id: primitives::chain_id::ChainId, latest_height: Height) -> ClientState {
	ClientState {
		chain_id,
		trust_level: (1, 3),
		unbonding_period: Duration::from_secs(3 * 7 * 24 * 3600),
		trusting_period: Duration::from_secs(2 * 7 * 24 * 3600),
		max_clock_drift: Duration::from_secs(20),
		latest_height,
		proof_specs: vec![ProofSpec::Iavl, ProofSpec::Tendermint],
		upgrade_path: vec!["upgrade".into(), "upgradedIBCState".into()],
	}
}

#[tokio::test]
async fn v2_happy_path_relays_recv_and_ack_then_is_idempotent() {
	let mars = MockChainClient::new("mars-1");
	let venus = MockChainClient::new("venus-1");
	let ticker = spawn_block_ticker(vec![mars.clone(), venus.clone()]);

	let link = construct::create_with_new_clients_v2(
		AnyChainClient::Mock(mars.clone()),
		AnyChainClient::Mock(venus.clone()),
		None,
		b"ibc".to_vec(),
		None,
	)
	.await
	.expect("v2 link construction");

	mars.send_packet(Packet::V2(PacketV2 {
		sequence: 1,
		source_client: link.end_a.client_id.clone(),
		destination_client: link.end_b.client_id.clone(),
		timeout_timestamp: 10_000,
		payloads: vec![],
	}));

	let watermark = link
		.relay_round_both_directions(Watermark::ZERO, NO_SLACK)
		.await
		.expect("first round");
	assert!(watermark.advanced_from(&Watermark::ZERO));
	assert!(venus.has_receipt(1), "venus should have received the packet");
	assert!(!mars.has_commitment(1), "mars's commitment should be cleared once the ack lands");

	// Re-running the round must be a no-op: nothing left pending or un-acked.
	let watermark2 = link.relay_round_both_directions(watermark, NO_SLACK).await.expect("second round");
	assert!(watermark2.advanced_from(&watermark));
	assert!(venus.has_receipt(1));
	assert!(!mars.has_commitment(1));

	ticker.abort();
}

#[tokio::test]
async fn v2_timeout_path_submits_timeout_without_delivering() {
	let mars = MockChainClient::new("mars-1");
	let venus = MockChainClient::new("venus-1");
	let ticker = spawn_block_ticker(vec![mars.clone(), venus.clone()]);

	let link = construct::create_with_new_clients_v2(
		AnyChainClient::Mock(mars.clone()),
		AnyChainClient::Mock(venus.clone()),
		None,
		b"ibc".to_vec(),
		None,
	)
	.await
	.expect("v2 link construction");

	// Push venus's clock far enough ahead that a 1-second timeout is already past
	// by the time the round runs, regardless of ticker-induced drift.
	venus.advance_time(Duration::from_secs(1_000));

	mars.send_packet(Packet::V2(PacketV2 {
		sequence: 7,
		source_client: link.end_a.client_id.clone(),
		destination_client: link.end_b.client_id.clone(),
		timeout_timestamp: 1,
		payloads: vec![],
	}));

	let watermark =
		link.relay_round(Direction::AtoB, Watermark::ZERO, NO_SLACK).await.expect("round handles timeout");
	assert!(watermark.advanced_from(&Watermark::ZERO));
	assert!(!venus.has_receipt(7), "a timed-out packet must never be delivered");
	assert!(!mars.has_commitment(7), "the timeout message clears the source commitment");

	ticker.abort();
}

#[tokio::test]
async fn packet_filter_drops_non_matching_packets() {
	let mars = MockChainClient::new("mars-1");
	let venus = MockChainClient::new("venus-1");
	let ticker = spawn_block_ticker(vec![mars.clone(), venus.clone()]);

	let even_only: core::link::PacketFilter = std::sync::Arc::new(|p: &Packet| p.sequence() % 2 == 0);
	let link = construct::create_with_new_clients_v2(
		AnyChainClient::Mock(mars.clone()),
		AnyChainClient::Mock(venus.clone()),
		None,
		b"ibc".to_vec(),
		Some(even_only),
	)
	.await
	.expect("v2 link construction");

	for sequence in [1u64, 2, 3] {
		mars.send_packet(Packet::V2(PacketV2 {
			sequence,
			source_client: link.end_a.client_id.clone(),
			destination_client: link.end_b.client_id.clone(),
			timeout_timestamp: 10_000,
			payloads: vec![],
		}));
	}

	link.relay_round(Direction::AtoB, Watermark::ZERO, NO_SLACK).await.expect("round");
	assert!(!venus.has_receipt(1), "odd sequence 1 must be filtered out");
	assert!(venus.has_receipt(2), "even sequence 2 must be relayed");
	assert!(!venus.has_receipt(3), "odd sequence 3 must be filtered out");

	ticker.abort();
}

#[tokio::test]
async fn update_if_stale_is_a_noop_until_the_consensus_state_ages_past_max_age() {
	let src = MockChainClient::new("mars-1");
	let dest = MockChainClient::new("venus-1");
	let client_id = "07-tendermint-1";

	dest.set_client_state(client_id, base_client_state(src.chain_id(), Height::new(0, 1)));
	dest.set_consensus_state(
		client_id,
		ConsensusState { timestamp: 0, root: vec![0xAB; 32], next_validators_hash: vec![1, 2, 3] },
	);

	let driver = LightClientDriver::new();

	// dest's clock is still at 0, matching the consensus timestamp: not stale yet.
	let result =
		driver.update_if_stale(&src, &dest, client_id, Duration::from_secs(5)).await.expect("fresh check");
	assert!(result.is_none(), "a just-created client must not trigger an update");

	// src produces a new block (advances both height and its own clock); dest's
	// clock then moves far enough that the existing consensus state is stale.
	src.advance_block();
	dest.advance_time(Duration::from_secs(60));

	let result =
		driver.update_if_stale(&src, &dest, client_id, Duration::from_secs(5)).await.expect("stale check");
	assert!(result.is_some(), "60s of age against a 5s max must trigger an update");

	let updated = dest.query_consensus_state(client_id, Height::ZERO).await.expect("consensus state");
	assert!(updated.timestamp > 0, "the heartbeat update must advance the stored consensus timestamp");
}

#[tokio::test]
async fn reconstruction_fails_when_stored_consensus_root_has_diverged() {
	let mars = MockChainClient::new("mars-1");
	let venus = MockChainClient::new("venus-1");

	let client_on_mars = "07-tendermint-1";
	let client_on_venus = "07-tendermint-1";

	mars.set_counterparty(
		client_on_mars,
		CounterpartyRegistration {
			client_id_local: client_on_mars.into(),
			client_id_remote: client_on_venus.into(),
			merkle_prefix: b"ibc".to_vec(),
		},
	);
	venus.set_counterparty(
		client_on_venus,
		CounterpartyRegistration {
			client_id_local: client_on_venus.into(),
			client_id_remote: client_on_mars.into(),
			merkle_prefix: b"ibc".to_vec(),
		},
	);

	mars.set_client_state(client_on_mars, base_client_state(venus.chain_id(), Height::new(0, 1)));
	venus.set_client_state(client_on_venus, base_client_state(mars.chain_id(), Height::new(0, 1)));

	// venus's view of mars is correct...
	venus.set_consensus_state(
		client_on_venus,
		ConsensusState { timestamp: 0, root: vec![0xAB; 32], next_validators_hash: vec![1, 2, 3] },
	);
	// ...but mars's view of venus carries a root that doesn't match what venus's
	// own header would produce (`query_header` always returns `0xAB` bytes).
	mars.set_consensus_state(
		client_on_mars,
		ConsensusState { timestamp: 0, root: vec![0x00; 32], next_validators_hash: vec![1, 2, 3] },
	);

	let result = construct::with_existing_clients_v2(
		AnyChainClient::Mock(mars.clone()),
		AnyChainClient::Mock(venus.clone()),
		client_on_mars.into(),
		client_on_venus.into(),
		None,
	)
	.await;

	match result {
		Err(Error::ClientDiverged { .. }) => {},
		other => panic!("expected ClientDiverged, got {other:?}"),
	}
}

#[tokio::test]
async fn v1_ordered_channel_rejects_a_sequence_gap() {
	let mars = MockChainClient::new("mars-1");
	let venus = MockChainClient::new("venus-1");
	let ticker = spawn_block_ticker(vec![mars.clone(), venus.clone()]);

	let link = construct::create_with_new_connections(
		AnyChainClient::Mock(mars.clone()),
		AnyChainClient::Mock(venus.clone()),
		None,
		None,
	)
	.await
	.expect("v1 connection handshake");
	let link = construct::open_transfer_channel(link, true).await.expect("channel handshake");

	let channel_a = link.end_a.v1.as_ref().unwrap().channel_id.clone();
	let channel_b = link.end_b.v1.as_ref().unwrap().channel_id.clone();

	let packet = |sequence: u64| {
		Packet::V1(primitives::packet::PacketV1 {
			sequence,
			source_port: "transfer".into(),
			source_channel: channel_a.clone(),
			destination_port: "transfer".into(),
			destination_channel: channel_b.clone(),
			data: vec![1],
			timeout_height: None,
			timeout_timestamp: 10_000_000_000_000,
		})
	};
	mars.send_packet(packet(1));
	mars.send_packet(packet(3));

	let result = link.relay_round(Direction::AtoB, Watermark::ZERO, NO_SLACK).await;
	match result {
		Err(Error::ProtocolViolation(_)) => {},
		other => panic!("expected a ProtocolViolation for the sequence gap, got {other:?}"),
	}

	ticker.abort();
}

#[tokio::test]
async fn scheduler_runs_a_round_and_persists_an_advanced_watermark() {
	let mars = MockChainClient::new("mars-1");
	let venus = MockChainClient::new("venus-1");
	let ticker = spawn_block_ticker(vec![mars.clone(), venus.clone()]);

	let link = construct::create_with_new_clients_v2(
		AnyChainClient::Mock(mars.clone()),
		AnyChainClient::Mock(venus.clone()),
		None,
		b"ibc".to_vec(),
		None,
	)
	.await
	.expect("v2 link construction");
	let end_a_client_id = link.end_a.client_id.clone();
	let end_b_client_id = link.end_b.client_id.clone();

	mars.send_packet(Packet::V2(PacketV2 {
		sequence: 1,
		source_client: end_a_client_id,
		destination_client: end_b_client_id,
		timeout_timestamp: 10_000,
		payloads: vec![],
	}));

	let store = store::Store::connect(":memory:").await.expect("in-memory store");
	let path_id: PathId = 1;

	let config = SchedulerConfig {
		poll_interval: Duration::from_millis(20),
		max_age_dest: Duration::from_secs(3600),
		max_age_src: Duration::from_secs(3600),
		round: NO_SLACK,
	};
	let mut scheduler = Scheduler::new(store.clone(), None, config);
	scheduler.insert_link(path_id, link);
	let stop = scheduler.stop_handle();

	let handle = tokio::spawn(async move { scheduler.run().await });
	tokio::time::sleep(Duration::from_millis(120)).await;
	stop.store(false, Ordering::SeqCst);
	handle.await.expect("scheduler task").expect("scheduler run");

	let watermark = store.get_watermark(path_id).await.expect("get watermark").expect("watermark persisted");
	assert!(watermark.advanced_from(&Watermark::ZERO));
	assert!(venus.has_receipt(1));

	ticker.abort();
}
