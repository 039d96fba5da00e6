use kycdao_access::AccessError;
use kycdao_types::{Address, TokenAmount};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LedgerError {
    #[error(transparent)]
    Access(#[from] AccessError),

    #[error("account {0} is not KYC approved on the ledger")]
    KycNotApproved(Address),

    #[error("insufficient balance: need {needed}, have {available}")]
    InsufficientBalance {
        needed: TokenAmount,
        available: TokenAmount,
    },

    #[error("arithmetic overflow in token accounting")]
    Overflow,
}
