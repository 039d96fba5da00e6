//! Fundamental types for the KYC DAO governance engine.
//!
//! This crate defines the core types shared across every other crate in the workspace:
//! addresses, token amounts, timestamps and clocks, roles, and governance parameters.

pub mod address;
pub mod amount;
pub mod error;
pub mod params;
pub mod role;
pub mod time;

pub use address::Address;
pub use amount::TokenAmount;
pub use error::TypesError;
pub use params::{GovernanceParams, VoteWeight};
pub use role::Role;
pub use time::{Clock, SystemClock, Timestamp};
