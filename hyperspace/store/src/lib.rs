//! SQLite-backed persistence for relay paths, watermarks and chain fees (spec
//! §3, §4.F). Grounded on the request/response storage pattern used by
//! `examples/Cordtus-chainpulse`'s sqlx-over-sqlite layer: a single pool, plain
//! SQL migrations run at startup, small hand-written query methods rather than
//! a query builder or ORM.

pub mod error;
mod models;

use error::StoreError;
use models::{chain_type_to_str, relay_path_from_row, version_to_i64, watermark_from_row};
use primitives::chain_fee::ChainFee;
use primitives::relay_path::RelayPath;
use primitives::watermark::Watermark;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS relay_paths (
	id INTEGER PRIMARY KEY AUTOINCREMENT,
	chain_id_a TEXT NOT NULL,
	node_a TEXT NOT NULL,
	query_node_a TEXT,
	chain_id_b TEXT NOT NULL,
	node_b TEXT NOT NULL,
	query_node_b TEXT,
	chain_type_a TEXT NOT NULL,
	chain_type_b TEXT NOT NULL,
	client_a TEXT NOT NULL,
	client_b TEXT NOT NULL,
	version INTEGER NOT NULL,
	port_id TEXT,
	channel_a TEXT,
	channel_b TEXT,
	ordered INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS watermarks (
	path_id INTEGER PRIMARY KEY REFERENCES relay_paths(id),
	packet_height_a_rev INTEGER NOT NULL DEFAULT 0,
	packet_height_a_height INTEGER NOT NULL DEFAULT 0,
	packet_height_b_rev INTEGER NOT NULL DEFAULT 0,
	packet_height_b_height INTEGER NOT NULL DEFAULT 0,
	ack_height_a_rev INTEGER NOT NULL DEFAULT 0,
	ack_height_a_height INTEGER NOT NULL DEFAULT 0,
	ack_height_b_rev INTEGER NOT NULL DEFAULT 0,
	ack_height_b_height INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS chain_fees (
	chain_id TEXT PRIMARY KEY,
	gas_price REAL NOT NULL,
	gas_denom TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS mnemonics (
	chain_id TEXT PRIMARY KEY,
	mnemonic TEXT NOT NULL
);
"#;

#[derive(Clone)]
pub struct Store {
	pool: SqlitePool,
}

impl Store {
	/// Opens (creating if absent) the sqlite file at `db_path` and ensures the
	/// schema exists. `DB_FILE` in spec §6 feeds this path.
	pub async fn connect(db_path: &str) -> Result<Self, StoreError> {
		let opts = SqliteConnectOptions::from_str(&format!("sqlite://{db_path}"))?.create_if_missing(true);
		let pool = SqlitePoolOptions::new().max_connections(5).connect_with(opts).await?;
		let store = Self { pool };
		store.migrate().await?;
		Ok(store)
	}

	async fn migrate(&self) -> Result<(), StoreError> {
		sqlx::query(SCHEMA).execute(&self.pool).await?;
		Ok(())
	}

	pub async fn insert_relay_path(&self, path: &RelayPath) -> Result<i64, StoreError> {
		let id = sqlx::query(
			r#"INSERT INTO relay_paths
				(chain_id_a, node_a, query_node_a, chain_id_b, node_b, query_node_b,
				 chain_type_a, chain_type_b, client_a, client_b, version,
				 port_id, channel_a, channel_b, ordered)
			   VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
		)
		.bind(path.chain_id_a.as_str())
		.bind(&path.node_a)
		.bind(&path.query_node_a)
		.bind(path.chain_id_b.as_str())
		.bind(&path.node_b)
		.bind(&path.query_node_b)
		.bind(chain_type_to_str(path.chain_type_a))
		.bind(chain_type_to_str(path.chain_type_b))
		.bind(&path.client_a)
		.bind(&path.client_b)
		.bind(version_to_i64(path.version))
		.bind(&path.port_id)
		.bind(&path.channel_a)
		.bind(&path.channel_b)
		.bind(path.ordered as i64)
		.execute(&self.pool)
		.await?
		.last_insert_rowid();
		Ok(id)
	}

	/// Fills in the v1 channel namespace once the handshake in `add-path`
	/// completes (`port_id`, `channel_a`, `channel_b`, `ordered`).
	pub async fn set_relay_path_channel(
		&self,
		path_id: i64,
		port_id: &str,
		channel_a: &str,
		channel_b: &str,
		ordered: bool,
	) -> Result<(), StoreError> {
		sqlx::query(
			"UPDATE relay_paths SET port_id = ?, channel_a = ?, channel_b = ?, ordered = ? WHERE id = ?",
		)
		.bind(port_id)
		.bind(channel_a)
		.bind(channel_b)
		.bind(ordered as i64)
		.bind(path_id)
		.execute(&self.pool)
		.await?;
		Ok(())
	}

	pub async fn list_relay_paths(&self) -> Result<Vec<RelayPath>, StoreError> {
		let rows = sqlx::query("SELECT * FROM relay_paths ORDER BY id").fetch_all(&self.pool).await?;
		rows.iter().map(relay_path_from_row).collect()
	}

	pub async fn get_relay_path(&self, path_id: i64) -> Result<Option<RelayPath>, StoreError> {
		let row = sqlx::query("SELECT * FROM relay_paths WHERE id = ?")
			.bind(path_id)
			.fetch_optional(&self.pool)
			.await?;
		row.as_ref().map(relay_path_from_row).transpose()
	}

	pub async fn get_watermark(&self, path_id: i64) -> Result<Option<Watermark>, StoreError> {
		let row = sqlx::query("SELECT * FROM watermarks WHERE path_id = ?")
			.bind(path_id)
			.fetch_optional(&self.pool)
			.await?;
		row.as_ref().map(watermark_from_row).transpose()
	}

	/// Upserts the watermark for `path_id`. Callers are responsible for only
	/// calling this with a componentwise-advanced value (spec §8 invariant).
	pub async fn put_watermark(&self, path_id: i64, watermark: Watermark) -> Result<(), StoreError> {
		sqlx::query(
			r#"INSERT INTO watermarks
				(path_id, packet_height_a_rev, packet_height_a_height,
				 packet_height_b_rev, packet_height_b_height,
				 ack_height_a_rev, ack_height_a_height,
				 ack_height_b_rev, ack_height_b_height)
			   VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
			   ON CONFLICT(path_id) DO UPDATE SET
				 packet_height_a_rev = excluded.packet_height_a_rev,
				 packet_height_a_height = excluded.packet_height_a_height,
				 packet_height_b_rev = excluded.packet_height_b_rev,
				 packet_height_b_height = excluded.packet_height_b_height,
				 ack_height_a_rev = excluded.ack_height_a_rev,
				 ack_height_a_height = excluded.ack_height_a_height,
				 ack_height_b_rev = excluded.ack_height_b_rev,
				 ack_height_b_height = excluded.ack_height_b_height"#,
		)
		.bind(path_id)
		.bind(watermark.packet_height_a.revision_number as i64)
		.bind(watermark.packet_height_a.revision_height as i64)
		.bind(watermark.packet_height_b.revision_number as i64)
		.bind(watermark.packet_height_b.revision_height as i64)
		.bind(watermark.ack_height_a.revision_number as i64)
		.bind(watermark.ack_height_a.revision_height as i64)
		.bind(watermark.ack_height_b.revision_number as i64)
		.bind(watermark.ack_height_b.revision_height as i64)
		.execute(&self.pool)
		.await?;
		Ok(())
	}

	pub async fn put_chain_fee(&self, chain_id: &str, fee: &ChainFee) -> Result<(), StoreError> {
		sqlx::query(
			r#"INSERT INTO chain_fees (chain_id, gas_price, gas_denom) VALUES (?, ?, ?)
			   ON CONFLICT(chain_id) DO UPDATE SET gas_price = excluded.gas_price, gas_denom = excluded.gas_denom"#,
		)
		.bind(chain_id)
		.bind(fee.gas_price)
		.bind(&fee.gas_denom)
		.execute(&self.pool)
		.await?;
		Ok(())
	}

	pub async fn get_chain_fee(&self, chain_id: &str) -> Result<Option<ChainFee>, StoreError> {
		let row = sqlx::query("SELECT gas_price, gas_denom FROM chain_fees WHERE chain_id = ?")
			.bind(chain_id)
			.fetch_optional(&self.pool)
			.await?;
		row.map(|r| {
			let gas_price = r.try_get::<f64, _>("gas_price")?;
			let gas_denom = r.try_get::<String, _>("gas_denom")?;
			ChainFee::new(gas_price, gas_denom).map_err(|e| StoreError::Invalid(e.to_string()))
		})
		.transpose()
	}

	pub async fn put_mnemonic(&self, chain_id: &str, mnemonic: &str) -> Result<(), StoreError> {
		sqlx::query(
			r#"INSERT INTO mnemonics (chain_id, mnemonic) VALUES (?, ?)
			   ON CONFLICT(chain_id) DO UPDATE SET mnemonic = excluded.mnemonic"#,
		)
		.bind(chain_id)
		.bind(mnemonic)
		.execute(&self.pool)
		.await?;
		Ok(())
	}

	pub async fn get_mnemonic(&self, chain_id: &str) -> Result<Option<String>, StoreError> {
		let row = sqlx::query("SELECT mnemonic FROM mnemonics WHERE chain_id = ?")
			.bind(chain_id)
			.fetch_optional(&self.pool)
			.await?;
		Ok(row.map(|r| r.try_get::<String, _>("mnemonic")).transpose()?)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use primitives::chain_id::ChainId;
	use primitives::relay_path::{ChainType, IbcVersion};

	async fn memory_store() -> Store {
		Store::connect(":memory:").await.expect("connect")
	}

	fn sample_path() -> RelayPath {
		RelayPath {
			id: None,
			chain_id_a: ChainId::new("mars-1"),
			node_a: "tcp://localhost:26657".into(),
			query_node_a: None,
			chain_id_b: ChainId::new("venus-2"),
			node_b: "tcp://localhost:26757".into(),
			query_node_b: None,
			chain_type_a: ChainType::Cosmos,
			chain_type_b: ChainType::Gno,
			client_a: "07-tendermint-0".into(),
			client_b: "07-tendermint-0".into(),
			version: IbcVersion::V2,
			port_id: None,
			channel_a: None,
			channel_b: None,
			ordered: false,
		}
	}

	#[tokio::test]
	async fn insert_and_list_relay_path() {
		let store = memory_store().await;
		let id = store.insert_relay_path(&sample_path()).await.expect("insert");
		let paths = store.list_relay_paths().await.expect("list");
		assert_eq!(paths.len(), 1);
		assert_eq!(paths[0].id, Some(id));
		assert_eq!(paths[0].chain_id_a.as_str(), "mars-1");
	}

	#[tokio::test]
	async fn watermark_defaults_to_none_then_roundtrips() {
		let store = memory_store().await;
		let id = store.insert_relay_path(&sample_path()).await.expect("insert");
		assert!(store.get_watermark(id).await.expect("get").is_none());

		let mut wm = Watermark::ZERO;
		wm.packet_height_a.revision_height = 10;
		store.put_watermark(id, wm).await.expect("put");
		let got = store.get_watermark(id).await.expect("get").expect("some");
		assert_eq!(got.packet_height_a.revision_height, 10);

		wm.packet_height_a.revision_height = 20;
		store.put_watermark(id, wm).await.expect("put again");
		let got = store.get_watermark(id).await.expect("get").expect("some");
		assert_eq!(got.packet_height_a.revision_height, 20);
	}

	#[tokio::test]
	async fn chain_fee_roundtrip() {
		let store = memory_store().await;
		let fee = ChainFee::new(0.025, "uatom".into()).expect("valid fee");
		store.put_chain_fee("mars-1", &fee).await.expect("put");
		let got = store.get_chain_fee("mars-1").await.expect("get").expect("some");
		assert_eq!(got.gas_denom, "uatom");
	}
}
