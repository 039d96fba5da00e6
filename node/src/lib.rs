//! KYC DAO governance node.
//!
//! The node is the one place where the outside world meets the engine:
//! - parses transport-neutral requests and answers with typed responses
//! - serializes all state changes behind a single lock
//! - supplies a monotonic `now` to every time-dependent operation
//! - fans committed events out to subscribers
//! - loads and saves state snapshots

pub mod config;
pub mod error;
pub mod event_bus;
pub mod logging;
pub mod node;
pub mod request;
pub mod tracing_spans;

pub use config::NodeConfig;
pub use error::NodeError;
pub use event_bus::EventBus;
pub use logging::{init_logging, LogFormat};
pub use node::GovernanceNode;
pub use request::{Reply, Request, Response};
