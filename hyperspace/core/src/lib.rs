//! The Relay Engine: the Link, the Light-Client Driver, and the Scheduler that
//! drives them (spec §4). `command` wires the CLI surface of spec §6 on top.

#![warn(unused_variables)]

pub mod chain;
pub mod command;
pub mod config;
pub mod construct;
pub mod endpoint;
pub mod light_client;
pub mod link;
pub mod logging;
pub mod packets;
pub mod scheduler;

pub use chain::AnyChainClient;
pub use endpoint::Endpoint;
pub use light_client::LightClientDriver;
pub use link::{Direction, Link, LinkState, PacketFilter, RoundConfig};
pub use scheduler::{Scheduler, SchedulerConfig};
