use crate::height::Height;

/// Per-direction block-height cursor bounding event queries for the next round.
/// On successful round completion these are replaced atomically with the heights
/// observed at the *start* of that round, so a crash replays the round rather than
/// losing it.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Watermark {
	pub packet_height_a: Height,
	pub packet_height_b: Height,
	pub ack_height_a: Height,
	pub ack_height_b: Height,
}

impl Watermark {
	pub const ZERO: Watermark = Watermark {
		packet_height_a: Height::ZERO,
		packet_height_b: Height::ZERO,
		ack_height_a: Height::ZERO,
		ack_height_b: Height::ZERO,
	};

	/// `watermark(p, r+1) >= watermark(p, r)` componentwise.
	pub fn advanced_from(&self, prior: &Watermark) -> bool {
		self.packet_height_a >= prior.packet_height_a
			&& self.packet_height_b >= prior.packet_height_b
			&& self.ack_height_a >= prior.ack_height_a
			&& self.ack_height_b >= prior.ack_height_b
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn componentwise_monotone() {
		let prior = Watermark::ZERO;
		let next = Watermark {
			packet_height_a: Height::new(0, 10),
			packet_height_b: Height::new(0, 12),
			ack_height_a: Height::new(0, 1),
			ack_height_b: Height::new(0, 1),
		};
		assert!(next.advanced_from(&prior));
		assert!(!prior.advanced_from(&next));
	}
}
