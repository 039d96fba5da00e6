use kycdao_types::{Address, Role};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AccessError {
    #[error("account {account} is missing role {role}")]
    Unauthorized { role: Role, account: Address },

    #[error("cannot remove the last holder of ADMIN_ROLE ({0})")]
    LastAdmin(Address),
}
