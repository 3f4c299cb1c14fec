use crate::error::Error;

#[derive(Debug, Clone, PartialEq)]
pub struct ChainFee {
	pub gas_price: f64,
	pub gas_denom: String,
}

impl ChainFee {
	pub fn new(gas_price: f64, gas_denom: impl Into<String>) -> Result<Self, Error> {
		let gas_denom = gas_denom.into();
		if gas_price <= 0.0 {
			return Err(Error::Configuration(format!("gas price must be positive, got {gas_price}")));
		}
		if gas_denom.is_empty() {
			return Err(Error::Configuration("gas denom must not be empty".into()));
		}
		Ok(Self { gas_price, gas_denom })
	}

	/// Parses a `"<price><denom>"` string such as `"0.025uatom"` into `(price, denom)`.
	pub fn parse(input: &str) -> Result<Self, Error> {
		let split_at = input
			.find(|c: char| !c.is_ascii_digit() && c != '.')
			.ok_or_else(|| Error::Configuration(format!("missing denom in gas price {input:?}")))?;
		let (price_str, denom) = input.split_at(split_at);
		let price: f64 = price_str
			.parse()
			.map_err(|_| Error::Configuration(format!("invalid gas price {price_str:?}")))?;
		Self::new(price, denom)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_price_and_denom() {
		let fee = ChainFee::parse("0.025uatom").unwrap();
		assert_eq!(fee.gas_price, 0.025);
		assert_eq!(fee.gas_denom, "uatom");
	}

	#[test]
	fn rejects_non_positive_price() {
		assert!(ChainFee::new(0.0, "uatom").is_err());
		assert!(ChainFee::new(-1.0, "uatom").is_err());
	}

	#[test]
	fn rejects_empty_denom() {
		assert!(ChainFee::new(1.0, "").is_err());
	}
}
