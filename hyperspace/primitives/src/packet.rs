use crate::height::Height;

/// How a packet's timeout is expressed, used to decide which cutoffs a timeout check
/// needs to test (v1 tests both; v2 tests timestamp only).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeoutVariant {
	Height,
	Timestamp,
	Both,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PacketV1 {
	pub sequence: u64,
	pub source_port: String,
	pub source_channel: String,
	pub destination_port: String,
	pub destination_channel: String,
	pub data: Vec<u8>,
	/// Absent timeout height means "no height-based timeout" (a zero height on the
	/// wire is parsed as absent, per spec §4.A event parsing).
	pub timeout_height: Option<Height>,
	pub timeout_timestamp: u64,
}

impl PacketV1 {
	pub fn timeout_variant(&self) -> TimeoutVariant {
		match (self.timeout_height.is_some(), self.timeout_timestamp > 0) {
			(true, true) => TimeoutVariant::Both,
			(true, false) => TimeoutVariant::Height,
			_ => TimeoutVariant::Timestamp,
		}
	}

	pub fn is_timed_out(&self, dest_height: Height, dest_time_unix_nanos: u64) -> bool {
		let height_timed_out =
			self.timeout_height.map(|h| !h.is_zero() && dest_height >= h).unwrap_or(false);
		let timestamp_timed_out =
			self.timeout_timestamp > 0 && dest_time_unix_nanos >= self.timeout_timestamp;
		height_timed_out || timestamp_timed_out
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
	pub source_port: String,
	pub destination_port: String,
	pub encoding: String,
	pub version: String,
	pub value: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PacketV2 {
	pub sequence: u64,
	pub source_client: String,
	pub destination_client: String,
	/// Seconds, unlike v1's nanoseconds.
	pub timeout_timestamp: u64,
	pub payloads: Vec<Payload>,
}

impl PacketV2 {
	pub fn is_timed_out(&self, dest_time_unix_secs: u64) -> bool {
		self.timeout_timestamp > 0 && dest_time_unix_secs >= self.timeout_timestamp
	}
}

/// Either packet version, enough for the Link to reason about timeouts and sequences
/// without caring which IBC version produced them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Packet {
	V1(PacketV1),
	V2(PacketV2),
}

impl Packet {
	pub fn sequence(&self) -> u64 {
		match self {
			Packet::V1(p) => p.sequence,
			Packet::V2(p) => p.sequence,
		}
	}
}

/// `splitPendingPackets`: partitions `packets` into `(alive, timed_out)` using the
/// destination's current height/time plus caller-configured slack. `alive ∪ timed_out
/// = packets` and the two are disjoint by construction. `dest_time_unix_nanos` is the
/// destination's current time as Unix nanoseconds (matching `ChainClient::current_time_unix_nanos`);
/// `timeout_seconds_slack` is seconds and is converted to either unit the packet
/// version actually stores its timeout timestamp in (v1: nanoseconds, v2: seconds).
pub fn split_pending_packets(
	packets: Vec<Packet>,
	dest_height: Height,
	dest_time_unix_nanos: u64,
	timeout_blocks_slack: u64,
	timeout_seconds_slack: u64,
) -> (Vec<Packet>, Vec<Packet>) {
	const NANOS_PER_SEC: u64 = 1_000_000_000;
	let cutoff_height =
		Height::new(dest_height.revision_number, dest_height.revision_height + timeout_blocks_slack);
	let cutoff_time_nanos = dest_time_unix_nanos + timeout_seconds_slack * NANOS_PER_SEC;
	let cutoff_time_secs = dest_time_unix_nanos / NANOS_PER_SEC + timeout_seconds_slack;

	let mut alive = Vec::new();
	let mut timed_out = Vec::new();
	for packet in packets {
		let is_timed_out = match &packet {
			Packet::V1(p) => p.is_timed_out(cutoff_height, cutoff_time_nanos),
			Packet::V2(p) => p.is_timed_out(cutoff_time_secs),
		};
		if is_timed_out {
			timed_out.push(packet);
		} else {
			alive.push(packet);
		}
	}
	(alive, timed_out)
}

#[cfg(test)]
mod tests {
	use super::*;

	fn v1(seq: u64, timeout_height: Option<Height>, timeout_timestamp: u64) -> Packet {
		Packet::V1(PacketV1 {
			sequence: seq,
			source_port: "transfer".into(),
			source_channel: "channel-0".into(),
			destination_port: "transfer".into(),
			destination_channel: "channel-1".into(),
			data: vec![],
			timeout_height,
			timeout_timestamp,
		})
	}

	#[test]
	fn splits_by_timeout_height() {
		let packets = vec![
			v1(1, Some(Height::new(0, 100)), 0),
			v1(2, Some(Height::new(0, 5)), 0),
		];
		let (alive, timed_out) = split_pending_packets(packets, Height::new(0, 50), 0, 0, 0);
		assert_eq!(alive.len(), 1);
		assert_eq!(alive[0].sequence(), 1);
		assert_eq!(timed_out.len(), 1);
		assert_eq!(timed_out[0].sequence(), 2);
	}

	#[test]
	fn splits_by_timeout_timestamp() {
		let packets = vec![v1(1, None, 1_000), v1(2, None, 100)];
		let (alive, timed_out) = split_pending_packets(packets, Height::ZERO, 500, 0, 0);
		assert_eq!(alive.len(), 1);
		assert_eq!(timed_out.len(), 1);
		assert_eq!(timed_out[0].sequence(), 2);
	}

	#[test]
	fn partition_is_disjoint_and_exhaustive() {
		let packets = vec![v1(1, None, 10), v1(2, None, 9_999_999_999), v1(3, None, 0)];
		let (alive, timed_out) = split_pending_packets(packets.clone(), Height::ZERO, 1000, 0, 0);
		assert_eq!(alive.len() + timed_out.len(), packets.len());
		let alive_seqs: Vec<_> = alive.iter().map(|p| p.sequence()).collect();
		let timed_out_seqs: Vec<_> = timed_out.iter().map(|p| p.sequence()).collect();
		assert!(alive_seqs.iter().all(|s| !timed_out_seqs.contains(s)));
	}

	#[test]
	fn zero_timeout_height_is_absent() {
		let p = v1(1, Some(Height::ZERO), 0);
		match p {
			Packet::V1(p) => assert!(!p.is_timed_out(Height::new(0, 1_000_000), 0)),
			_ => unreachable!(),
		}
	}
}
