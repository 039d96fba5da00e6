//! Named roles for access control.

use crate::error::TypesError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A capability that can be granted to an address.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Administers members, parameters, and (by default) every other role.
    #[serde(rename = "ADMIN_ROLE")]
    Admin,
    /// May mint governance tokens.
    #[serde(rename = "MINTER_ROLE")]
    Minter,
    /// May set the ledger's KYC flag.
    #[serde(rename = "KYC_ROLE")]
    Kyc,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Admin, Role::Minter, Role::Kyc];

    /// Canonical role name, e.g. `ADMIN_ROLE`.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Admin => "ADMIN_ROLE",
            Self::Minter => "MINTER_ROLE",
            Self::Kyc => "KYC_ROLE",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Role {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|r| r.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| TypesError::UnknownRole(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for role in Role::ALL {
            assert_eq!(role.name().parse::<Role>().unwrap(), role);
        }
        assert_eq!("kyc_role".parse::<Role>().unwrap(), Role::Kyc);
        assert!("OWNER_ROLE".parse::<Role>().is_err());
    }
}
