#![warn(unused_variables)]

pub mod ack;
pub mod chain;
pub mod chain_fee;
pub mod chain_id;
pub mod client_state;
pub mod connection;
pub mod error;
pub mod events;
pub mod height;
pub mod key_provider;
pub mod packet;
pub mod relay_path;
pub mod watermark;

#[cfg(any(test, feature = "testing"))]
pub mod mock;

pub use ack::{Ack, AckMetadata};
pub use chain::{ChainClient, IbcMessage, MisbehaviourHandler, TxResult};
pub use chain_fee::ChainFee;
pub use chain_id::ChainId;
pub use client_state::{ClientState, ConsensusState, Header, RawProof, UpdateType};
pub use connection::{Channel, ChannelState, Connection, ConnectionState, CounterpartyRegistration};
pub use error::Error;
pub use events::IbcEvent;
pub use height::Height;
pub use key_provider::KeyProvider;
pub use packet::{Packet, PacketV1, PacketV2, Payload, TimeoutVariant};
pub use relay_path::{ChainType, IbcVersion, RelayPath};
pub use watermark::Watermark;
