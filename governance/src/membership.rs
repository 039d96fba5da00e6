//! Membership registry: approved members, their KYC flag and base weight.
//!
//! Members are enumerated in the order they were first added. Removing a
//! member tombstones its slot instead of deleting it, so indices stay stable.

use crate::error::GovernanceError;
use kycdao_access::RoleTable;
use kycdao_types::{Address, Role};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A member record. `is_approved == false` means "not a member".
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub address: Address,
    pub is_approved: bool,
    pub has_passed_kyc: bool,
    pub base_voting_weight: u128,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct MembershipRegistry {
    members: HashMap<Address, Member>,
    /// Every address ever added, in first-added order. Append-only.
    order: Vec<Address>,
}

impl MembershipRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Approve `account` with a base voting weight. Requires `ADMIN_ROLE`.
    ///
    /// Membership KYC starts out false. A previously removed member is
    /// reactivated in its original slot.
    pub fn add_member(
        &mut self,
        roles: &RoleTable,
        caller: &Address,
        account: &Address,
        base_voting_weight: u128,
    ) -> Result<(), GovernanceError> {
        roles.require_role(Role::Admin, caller)?;
        if self.is_approved(account) {
            return Err(GovernanceError::AlreadyMember(account.clone()));
        }
        if !self.members.contains_key(account) {
            self.order.push(account.clone());
        }
        self.members.insert(
            account.clone(),
            Member {
                address: account.clone(),
                is_approved: true,
                has_passed_kyc: false,
                base_voting_weight,
            },
        );
        Ok(())
    }

    /// Tombstone a member: not approved, no KYC, zero weight. Requires `ADMIN_ROLE`.
    pub fn remove_member(
        &mut self,
        roles: &RoleTable,
        caller: &Address,
        account: &Address,
    ) -> Result<(), GovernanceError> {
        roles.require_role(Role::Admin, caller)?;
        let member = self
            .members
            .get_mut(account)
            .filter(|m| m.is_approved)
            .ok_or_else(|| GovernanceError::NotMember(account.clone()))?;
        member.is_approved = false;
        member.has_passed_kyc = false;
        member.base_voting_weight = 0;
        Ok(())
    }

    /// Set the membership KYC flag of an approved member. Requires `ADMIN_ROLE`.
    ///
    /// Returns whether the flag changed.
    pub fn update_kyc_status(
        &mut self,
        roles: &RoleTable,
        caller: &Address,
        account: &Address,
        passed: bool,
    ) -> Result<bool, GovernanceError> {
        roles.require_role(Role::Admin, caller)?;
        let member = self
            .members
            .get_mut(account)
            .filter(|m| m.is_approved)
            .ok_or_else(|| GovernanceError::NotMember(account.clone()))?;
        let changed = member.has_passed_kyc != passed;
        member.has_passed_kyc = passed;
        Ok(changed)
    }

    pub fn is_approved(&self, account: &Address) -> bool {
        self.members.get(account).is_some_and(|m| m.is_approved)
    }

    pub fn has_passed_kyc(&self, account: &Address) -> bool {
        self.members
            .get(account)
            .is_some_and(|m| m.is_approved && m.has_passed_kyc)
    }

    /// Base weight; zero for non-members and removed members.
    pub fn base_weight(&self, account: &Address) -> u128 {
        self.members
            .get(account)
            .map_or(0, |m| m.base_voting_weight)
    }

    pub fn member(&self, account: &Address) -> Option<&Member> {
        self.members.get(account)
    }

    /// The member in slot `index`, tombstoned or not.
    pub fn member_at(&self, index: usize) -> Option<&Member> {
        self.order.get(index).and_then(|a| self.members.get(a))
    }

    /// Number of slots, tombstones included. Valid indices are `0..member_count()`.
    pub fn member_count(&self) -> usize {
        self.order.len()
    }

    /// Approved members in slot order.
    pub fn active_members(&self) -> impl Iterator<Item = &Member> {
        self.order
            .iter()
            .filter_map(|a| self.members.get(a))
            .filter(|m| m.is_approved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kycdao_access::AccessError;

    fn wallet(seed: u64) -> Address {
        Address::from_low_u64(seed)
    }

    fn admin() -> Address {
        wallet(1)
    }

    fn setup() -> (RoleTable, MembershipRegistry) {
        (RoleTable::with_admin(admin()), MembershipRegistry::new())
    }

    #[test]
    fn test_add_member() {
        let (roles, mut registry) = setup();
        registry.add_member(&roles, &admin(), &wallet(10), 3).unwrap();

        let member = registry.member(&wallet(10)).unwrap();
        assert!(member.is_approved);
        assert!(!member.has_passed_kyc);
        assert_eq!(member.base_voting_weight, 3);
        assert_eq!(registry.member_count(), 1);
    }

    #[test]
    fn test_add_member_twice_fails() {
        let (roles, mut registry) = setup();
        registry.add_member(&roles, &admin(), &wallet(10), 1).unwrap();
        assert_eq!(
            registry.add_member(&roles, &admin(), &wallet(10), 5),
            Err(GovernanceError::AlreadyMember(wallet(10)))
        );
        assert_eq!(registry.base_weight(&wallet(10)), 1);
    }

    #[test]
    fn test_add_member_requires_admin() {
        let (roles, mut registry) = setup();
        let err = registry
            .add_member(&roles, &wallet(2), &wallet(10), 1)
            .unwrap_err();
        assert_eq!(
            err,
            GovernanceError::Access(AccessError::Unauthorized {
                role: Role::Admin,
                account: wallet(2)
            })
        );
        assert_eq!(registry.member_count(), 0);
    }

    #[test]
    fn test_remove_member_tombstones_slot() {
        let (roles, mut registry) = setup();
        registry.add_member(&roles, &admin(), &wallet(10), 4).unwrap();
        registry.add_member(&roles, &admin(), &wallet(11), 2).unwrap();
        registry.update_kyc_status(&roles, &admin(), &wallet(10), true).unwrap();
        registry.remove_member(&roles, &admin(), &wallet(10)).unwrap();

        let tomb = registry.member_at(0).unwrap();
        assert_eq!(tomb.address, wallet(10));
        assert!(!tomb.is_approved);
        assert!(!tomb.has_passed_kyc);
        assert_eq!(tomb.base_voting_weight, 0);
        assert_eq!(registry.member_count(), 2);
        assert_eq!(registry.active_members().count(), 1);
        assert_eq!(registry.member_at(1).unwrap().address, wallet(11));
        assert!(registry.member_at(2).is_none());
    }

    #[test]
    fn test_readd_reactivates_original_slot() {
        let (roles, mut registry) = setup();
        registry.add_member(&roles, &admin(), &wallet(10), 4).unwrap();
        registry.add_member(&roles, &admin(), &wallet(11), 2).unwrap();
        registry.remove_member(&roles, &admin(), &wallet(10)).unwrap();
        registry.add_member(&roles, &admin(), &wallet(10), 7).unwrap();

        assert_eq!(registry.member_count(), 2);
        let member = registry.member_at(0).unwrap();
        assert!(member.is_approved);
        assert!(!member.has_passed_kyc);
        assert_eq!(member.base_voting_weight, 7);
    }

    #[test]
    fn test_remove_non_member_fails() {
        let (roles, mut registry) = setup();
        assert_eq!(
            registry.remove_member(&roles, &admin(), &wallet(10)),
            Err(GovernanceError::NotMember(wallet(10)))
        );
        registry.add_member(&roles, &admin(), &wallet(10), 1).unwrap();
        registry.remove_member(&roles, &admin(), &wallet(10)).unwrap();
        assert_eq!(
            registry.remove_member(&roles, &admin(), &wallet(10)),
            Err(GovernanceError::NotMember(wallet(10)))
        );
    }

    #[test]
    fn test_kyc_update_requires_approved_member() {
        let (roles, mut registry) = setup();
        assert_eq!(
            registry.update_kyc_status(&roles, &admin(), &wallet(10), true),
            Err(GovernanceError::NotMember(wallet(10)))
        );
        registry.add_member(&roles, &admin(), &wallet(10), 1).unwrap();
        assert!(registry.update_kyc_status(&roles, &admin(), &wallet(10), true).unwrap());
        assert!(!registry.update_kyc_status(&roles, &admin(), &wallet(10), true).unwrap());
        assert!(registry.has_passed_kyc(&wallet(10)));
        assert!(registry
            .update_kyc_status(&roles, &wallet(10), &wallet(10), false)
            .is_err());
    }

    #[test]
    fn test_active_members_in_slot_order() {
        let (roles, mut registry) = setup();
        for seed in [12, 10, 11] {
            registry.add_member(&roles, &admin(), &wallet(seed), 1).unwrap();
        }
        registry.remove_member(&roles, &admin(), &wallet(10)).unwrap();
        let active: Vec<_> = registry.active_members().map(|m| m.address.clone()).collect();
        assert_eq!(active, vec![wallet(12), wallet(11)]);
    }
}
