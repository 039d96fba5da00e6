//! The token ledger.

use crate::error::LedgerError;
use kycdao_access::RoleTable;
use kycdao_types::{Address, Role, TokenAmount};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Balances, total supply, and the ledger's KYC approvals.
///
/// Every mutating method validates first and writes last, so an `Err`
/// leaves the ledger exactly as it was.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TokenLedger {
    balances: HashMap<Address, TokenAmount>,
    total_supply: TokenAmount,
    kyc_approved: BTreeSet<Address>,
}

impl TokenLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn balance_of(&self, account: &Address) -> TokenAmount {
        self.balances.get(account).copied().unwrap_or(TokenAmount::ZERO)
    }

    pub fn total_supply(&self) -> TokenAmount {
        self.total_supply
    }

    pub fn is_kyc_approved(&self, account: &Address) -> bool {
        self.kyc_approved.contains(account)
    }

    /// Accounts with a non-zero balance, in address order.
    pub fn holders(&self) -> Vec<(&Address, TokenAmount)> {
        let mut holders: Vec<_> = self
            .balances
            .iter()
            .filter(|(_, b)| !b.is_zero())
            .map(|(a, b)| (a, *b))
            .collect();
        holders.sort_by(|a, b| a.0.cmp(b.0));
        holders
    }

    /// Sum of every balance, `None` on overflow. Equals `total_supply`.
    pub fn sum_of_balances(&self) -> Option<TokenAmount> {
        self.balances
            .values()
            .try_fold(TokenAmount::ZERO, |acc, b| acc.checked_add(*b))
    }

    /// Create `amount` new tokens for `to`. Requires `MINTER_ROLE`; no KYC check.
    ///
    /// Returns the recipient's new balance.
    pub fn mint(
        &mut self,
        roles: &RoleTable,
        caller: &Address,
        to: &Address,
        amount: TokenAmount,
    ) -> Result<TokenAmount, LedgerError> {
        roles.require_role(Role::Minter, caller)?;
        let new_supply = self
            .total_supply
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;
        let new_balance = self
            .balance_of(to)
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;

        self.total_supply = new_supply;
        self.balances.insert(to.clone(), new_balance);
        Ok(new_balance)
    }

    /// Set the ledger KYC flag. Requires `KYC_ROLE`.
    ///
    /// Returns whether the flag changed.
    pub fn set_kyc_status(
        &mut self,
        roles: &RoleTable,
        caller: &Address,
        account: &Address,
        approved: bool,
    ) -> Result<bool, LedgerError> {
        roles.require_role(Role::Kyc, caller)?;
        let changed = if approved {
            self.kyc_approved.insert(account.clone())
        } else {
            self.kyc_approved.remove(account)
        };
        Ok(changed)
    }

    /// Check that `transfer(from, to, amount)` would succeed, without
    /// touching any balance.
    pub fn check_transfer(
        &self,
        from: &Address,
        to: &Address,
        amount: TokenAmount,
    ) -> Result<(), LedgerError> {
        for account in [from, to] {
            if !self.is_kyc_approved(account) {
                return Err(LedgerError::KycNotApproved(account.clone()));
            }
        }
        let available = self.balance_of(from);
        if available < amount {
            return Err(LedgerError::InsufficientBalance {
                needed: amount,
                available,
            });
        }
        Ok(())
    }

    /// Move `amount` from `from` to `to`. Both must be KYC-approved.
    pub fn transfer(
        &mut self,
        from: &Address,
        to: &Address,
        amount: TokenAmount,
    ) -> Result<(), LedgerError> {
        self.check_transfer(from, to, amount)?;
        if from == to {
            return Ok(());
        }
        let from_balance = self
            .balance_of(from)
            .checked_sub(amount)
            .ok_or(LedgerError::Overflow)?;
        let to_balance = self
            .balance_of(to)
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;

        self.balances.insert(from.clone(), from_balance);
        self.balances.insert(to.clone(), to_balance);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kycdao_access::AccessError;

    fn addr(seed: u64) -> Address {
        Address::from_low_u64(seed)
    }

    /// Admin 1, minter 2, KYC officer 3.
    fn roles() -> RoleTable {
        let mut roles = RoleTable::with_admin(addr(1));
        roles.grant_role(&addr(1), Role::Minter, &addr(2)).unwrap();
        roles.grant_role(&addr(1), Role::Kyc, &addr(3)).unwrap();
        roles
    }

    fn amount(raw: u128) -> TokenAmount {
        TokenAmount::new(raw)
    }

    #[test]
    fn mint_without_kyc() {
        let roles = roles();
        let mut ledger = TokenLedger::new();
        let balance = ledger.mint(&roles, &addr(2), &addr(10), amount(200)).unwrap();
        assert_eq!(balance, amount(200));
        assert_eq!(ledger.balance_of(&addr(10)), amount(200));
        assert_eq!(ledger.total_supply(), amount(200));
        assert!(!ledger.is_kyc_approved(&addr(10)));
    }

    #[test]
    fn mint_requires_minter_role() {
        let roles = roles();
        let mut ledger = TokenLedger::new();
        let err = ledger.mint(&roles, &addr(1), &addr(10), amount(5)).unwrap_err();
        assert_eq!(
            err,
            LedgerError::Access(AccessError::Unauthorized {
                role: Role::Minter,
                account: addr(1)
            })
        );
        assert_eq!(ledger.total_supply(), TokenAmount::ZERO);
    }

    #[test]
    fn mint_overflow_leaves_state_untouched() {
        let roles = roles();
        let mut ledger = TokenLedger::new();
        ledger.mint(&roles, &addr(2), &addr(10), amount(u128::MAX)).unwrap();
        assert_eq!(
            ledger.mint(&roles, &addr(2), &addr(11), amount(1)),
            Err(LedgerError::Overflow)
        );
        assert_eq!(ledger.balance_of(&addr(11)), TokenAmount::ZERO);
        assert_eq!(ledger.total_supply(), amount(u128::MAX));
    }

    #[test]
    fn kyc_status_requires_kyc_role() {
        let roles = roles();
        let mut ledger = TokenLedger::new();
        assert!(ledger.set_kyc_status(&roles, &addr(1), &addr(10), true).is_err());
        assert!(ledger.set_kyc_status(&roles, &addr(3), &addr(10), true).unwrap());
        assert!(!ledger.set_kyc_status(&roles, &addr(3), &addr(10), true).unwrap());
        assert!(ledger.is_kyc_approved(&addr(10)));
        assert!(ledger.set_kyc_status(&roles, &addr(3), &addr(10), false).unwrap());
        assert!(!ledger.is_kyc_approved(&addr(10)));
    }

    #[test]
    fn transfer_requires_kyc_on_both_sides() {
        let roles = roles();
        let mut ledger = TokenLedger::new();
        ledger.mint(&roles, &addr(2), &addr(10), amount(100)).unwrap();

        assert_eq!(
            ledger.transfer(&addr(10), &addr(11), amount(10)),
            Err(LedgerError::KycNotApproved(addr(10)))
        );
        ledger.set_kyc_status(&roles, &addr(3), &addr(10), true).unwrap();
        assert_eq!(
            ledger.transfer(&addr(10), &addr(11), amount(10)),
            Err(LedgerError::KycNotApproved(addr(11)))
        );
        ledger.set_kyc_status(&roles, &addr(3), &addr(11), true).unwrap();
        ledger.transfer(&addr(10), &addr(11), amount(10)).unwrap();

        assert_eq!(ledger.balance_of(&addr(10)), amount(90));
        assert_eq!(ledger.balance_of(&addr(11)), amount(10));
        assert_eq!(ledger.sum_of_balances(), Some(ledger.total_supply()));
    }

    #[test]
    fn transfer_insufficient_balance() {
        let roles = roles();
        let mut ledger = TokenLedger::new();
        ledger.mint(&roles, &addr(2), &addr(10), amount(5)).unwrap();
        ledger.set_kyc_status(&roles, &addr(3), &addr(10), true).unwrap();
        ledger.set_kyc_status(&roles, &addr(3), &addr(11), true).unwrap();

        assert_eq!(
            ledger.transfer(&addr(10), &addr(11), amount(6)),
            Err(LedgerError::InsufficientBalance {
                needed: amount(6),
                available: amount(5)
            })
        );
        assert_eq!(ledger.balance_of(&addr(10)), amount(5));
        assert_eq!(ledger.balance_of(&addr(11)), TokenAmount::ZERO);
    }

    #[test]
    fn self_transfer_is_a_noop() {
        let roles = roles();
        let mut ledger = TokenLedger::new();
        ledger.mint(&roles, &addr(2), &addr(10), amount(5)).unwrap();
        ledger.set_kyc_status(&roles, &addr(3), &addr(10), true).unwrap();
        ledger.transfer(&addr(10), &addr(10), amount(5)).unwrap();
        assert_eq!(ledger.balance_of(&addr(10)), amount(5));
    }

    #[test]
    fn holders_skip_empty_balances() {
        let roles = roles();
        let mut ledger = TokenLedger::new();
        ledger.mint(&roles, &addr(2), &addr(12), amount(1)).unwrap();
        ledger.mint(&roles, &addr(2), &addr(11), amount(2)).unwrap();
        ledger.mint(&roles, &addr(2), &addr(13), amount(0)).unwrap();
        let holders = ledger.holders();
        assert_eq!(holders, vec![(&addr(11), amount(2)), (&addr(12), amount(1))]);
    }
}
