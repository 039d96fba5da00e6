//! KYC-gated fungible token ledger.
//!
//! Balances plus total supply, with its own KYC namespace:
//! - minting needs `MINTER_ROLE` and no KYC
//! - the ledger KYC flag is set by `KYC_ROLE` holders
//! - a transfer needs both sides KYC-approved and a sufficient balance
//!
//! `sum(balances) == total_supply` holds after every operation.

pub mod error;
pub mod ledger;

pub use error::LedgerError;
pub use ledger::TokenLedger;
