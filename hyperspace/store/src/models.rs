use primitives::chain_id::ChainId;
use primitives::height::Height;
use primitives::relay_path::{ChainType, IbcVersion, RelayPath};
use primitives::watermark::Watermark;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

pub(crate) fn chain_type_to_str(t: ChainType) -> &'static str {
	match t {
		ChainType::Cosmos => "cosmos",
		ChainType::Gno => "gno",
	}
}

pub(crate) fn chain_type_from_str(s: &str) -> Result<ChainType, crate::error::StoreError> {
	match s {
		"cosmos" => Ok(ChainType::Cosmos),
		"gno" => Ok(ChainType::Gno),
		other => Err(crate::error::StoreError::Invalid(format!("unknown chain type {other}"))),
	}
}

pub(crate) fn version_to_i64(v: IbcVersion) -> i64 {
	match v {
		IbcVersion::V1 => 1,
		IbcVersion::V2 => 2,
	}
}

pub(crate) fn version_from_i64(v: i64) -> Result<IbcVersion, crate::error::StoreError> {
	match v {
		1 => Ok(IbcVersion::V1),
		2 => Ok(IbcVersion::V2),
		other => Err(crate::error::StoreError::Invalid(format!("unknown ibc version {other}"))),
	}
}

pub(crate) fn relay_path_from_row(row: &SqliteRow) -> Result<RelayPath, crate::error::StoreError> {
	Ok(RelayPath {
		id: Some(row.try_get::<i64, _>("id")?),
		chain_id_a: ChainId::new(row.try_get::<String, _>("chain_id_a")?),
		node_a: row.try_get("node_a")?,
		query_node_a: row.try_get("query_node_a")?,
		chain_id_b: ChainId::new(row.try_get::<String, _>("chain_id_b")?),
		node_b: row.try_get("node_b")?,
		query_node_b: row.try_get("query_node_b")?,
		chain_type_a: chain_type_from_str(&row.try_get::<String, _>("chain_type_a")?)?,
		chain_type_b: chain_type_from_str(&row.try_get::<String, _>("chain_type_b")?)?,
		client_a: row.try_get("client_a")?,
		client_b: row.try_get("client_b")?,
		version: version_from_i64(row.try_get::<i64, _>("version")?)?,
		port_id: row.try_get("port_id")?,
		channel_a: row.try_get("channel_a")?,
		channel_b: row.try_get("channel_b")?,
		ordered: row.try_get::<i64, _>("ordered")? != 0,
	})
}

pub(crate) fn watermark_from_row(row: &SqliteRow) -> Result<Watermark, crate::error::StoreError> {
	Ok(Watermark {
		packet_height_a: Height::new(
			row.try_get::<i64, _>("packet_height_a_rev")? as u64,
			row.try_get::<i64, _>("packet_height_a_height")? as u64,
		),
		packet_height_b: Height::new(
			row.try_get::<i64, _>("packet_height_b_rev")? as u64,
			row.try_get::<i64, _>("packet_height_b_height")? as u64,
		),
		ack_height_a: Height::new(
			row.try_get::<i64, _>("ack_height_a_rev")? as u64,
			row.try_get::<i64, _>("ack_height_a_height")? as u64,
		),
		ack_height_b: Height::new(
			row.try_get::<i64, _>("ack_height_b_rev")? as u64,
			row.try_get::<i64, _>("ack_height_b_height")? as u64,
		),
	})
}
