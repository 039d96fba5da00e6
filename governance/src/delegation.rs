//! Vote delegation: entrust voting power to another member.
//!
//! Delegation is exactly one hop deep:
//! - a delegator's power is added to its delegate's when the delegate votes
//! - an address that has delegated cannot receive delegations, and an
//!   address that receives delegations cannot delegate onward
//! - self-delegation is rejected
//!
//! With no chains, cycles cannot form.

use crate::error::GovernanceError;
use kycdao_types::Address;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct DelegationRegistry {
    /// delegator → delegate.
    delegations: HashMap<Address, Address>,
    /// Reverse index: delegate → direct delegators.
    reverse_delegations: HashMap<Address, BTreeSet<Address>>,
}

impl DelegationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check that `from → to` is an acceptable delegation.
    pub fn check_delegate(
        &self,
        from: &Address,
        to: &Address,
        to_is_member: bool,
    ) -> Result<(), GovernanceError> {
        if !to_is_member {
            return Err(GovernanceError::NotApprovedMember(to.clone()));
        }
        if from == to {
            return Err(GovernanceError::SelfDelegation);
        }
        if let Some(onward) = self.delegations.get(to) {
            return Err(GovernanceError::DelegationChain(format!(
                "{to} has delegated to {onward}"
            )));
        }
        let incoming = self.delegators_of(from).len();
        if incoming > 0 {
            return Err(GovernanceError::DelegationChain(format!(
                "{from} holds delegations from {incoming} accounts"
            )));
        }
        Ok(())
    }

    /// Set or replace `from`'s delegate. Last write wins.
    ///
    /// Returns the previous delegate, if any.
    pub fn delegate(
        &mut self,
        from: &Address,
        to: &Address,
        to_is_member: bool,
    ) -> Result<Option<Address>, GovernanceError> {
        self.check_delegate(from, to, to_is_member)?;
        let previous = self.undelegate(from);
        self.delegations.insert(from.clone(), to.clone());
        self.reverse_delegations
            .entry(to.clone())
            .or_default()
            .insert(from.clone());
        Ok(previous)
    }

    /// Remove `from`'s delegation. Returns the delegate it had.
    pub fn undelegate(&mut self, from: &Address) -> Option<Address> {
        let old_to = self.delegations.remove(from)?;
        if let Some(set) = self.reverse_delegations.get_mut(&old_to) {
            set.remove(from);
            if set.is_empty() {
                self.reverse_delegations.remove(&old_to);
            }
        }
        Some(old_to)
    }

    /// Drop every delegation pointing at `to`. Returns the released delegators.
    pub fn release_delegators_of(&mut self, to: &Address) -> Vec<Address> {
        let released: Vec<Address> = self
            .reverse_delegations
            .remove(to)
            .map(|set| set.into_iter().collect())
            .unwrap_or_default();
        for from in &released {
            self.delegations.remove(from);
        }
        released
    }

    /// The direct delegate of `from`, `None` if undelegated.
    pub fn delegate_of(&self, from: &Address) -> Option<&Address> {
        self.delegations.get(from)
    }

    /// Everyone who delegated directly to `to`, in address order.
    pub fn delegators_of(&self, to: &Address) -> Vec<&Address> {
        self.reverse_delegations
            .get(to)
            .map(|s| s.iter().collect())
            .unwrap_or_default()
    }

    #[cfg(test)]
    fn delegation_count(&self) -> usize {
        self.delegations.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wallet(seed: u64) -> Address {
        Address::from_low_u64(seed)
    }

    #[test]
    fn test_simple_delegation() {
        let mut registry = DelegationRegistry::new();
        let (a, b) = (wallet(1), wallet(2));
        assert_eq!(registry.delegate(&a, &b, true).unwrap(), None);

        assert_eq!(registry.delegate_of(&a), Some(&b));
        assert_eq!(registry.delegators_of(&b), vec![&a]);
        assert_eq!(registry.delegate_of(&b), None);
    }

    #[test]
    fn test_target_must_be_member() {
        let mut registry = DelegationRegistry::new();
        assert_eq!(
            registry.delegate(&wallet(1), &wallet(2), false),
            Err(GovernanceError::NotApprovedMember(wallet(2)))
        );
        assert_eq!(registry.delegation_count(), 0);
    }

    #[test]
    fn test_self_delegation_rejected() {
        let mut registry = DelegationRegistry::new();
        let a = wallet(1);
        assert_eq!(
            registry.delegate(&a, &a, true),
            Err(GovernanceError::SelfDelegation)
        );
    }

    #[test]
    fn test_update_delegation() {
        let mut registry = DelegationRegistry::new();
        let (a, b, c) = (wallet(1), wallet(2), wallet(3));
        registry.delegate(&a, &b, true).unwrap();
        assert_eq!(registry.delegate(&a, &c, true).unwrap(), Some(b.clone()));

        assert_eq!(registry.delegate_of(&a), Some(&c));
        assert!(registry.delegators_of(&b).is_empty());
        assert_eq!(registry.delegators_of(&c), vec![&a]);
    }

    #[test]
    fn test_chain_to_delegator_rejected() {
        let mut registry = DelegationRegistry::new();
        let (a, b, c) = (wallet(1), wallet(2), wallet(3));
        registry.delegate(&b, &c, true).unwrap();
        assert!(matches!(
            registry.delegate(&a, &b, true),
            Err(GovernanceError::DelegationChain(_))
        ));
    }

    #[test]
    fn test_delegate_with_incoming_rejected() {
        let mut registry = DelegationRegistry::new();
        let (a, b, c) = (wallet(1), wallet(2), wallet(3));
        registry.delegate(&a, &b, true).unwrap();
        assert!(matches!(
            registry.delegate(&b, &c, true),
            Err(GovernanceError::DelegationChain(_))
        ));
        // Closing the loop is caught the same way.
        assert!(matches!(
            registry.delegate(&b, &a, true),
            Err(GovernanceError::DelegationChain(_))
        ));
    }

    #[test]
    fn test_undelegate() {
        let mut registry = DelegationRegistry::new();
        let (a, b) = (wallet(1), wallet(2));
        registry.delegate(&a, &b, true).unwrap();
        assert_eq!(registry.undelegate(&a), Some(b.clone()));
        assert_eq!(registry.delegate_of(&a), None);
        assert!(registry.delegators_of(&b).is_empty());
        assert_eq!(registry.undelegate(&a), None);
    }

    #[test]
    fn test_fan_in() {
        let mut registry = DelegationRegistry::new();
        let delegate = wallet(100);
        for i in 0..5 {
            registry.delegate(&wallet(i + 1), &delegate, true).unwrap();
        }
        assert_eq!(registry.delegators_of(&delegate).len(), 5);
        assert_eq!(registry.delegation_count(), 5);
    }

    #[test]
    fn test_release_delegators() {
        let mut registry = DelegationRegistry::new();
        let delegate = wallet(100);
        registry.delegate(&wallet(1), &delegate, true).unwrap();
        registry.delegate(&wallet(2), &delegate, true).unwrap();
        registry.delegate(&wallet(3), &wallet(4), true).unwrap();

        let released = registry.release_delegators_of(&delegate);
        assert_eq!(released, vec![wallet(1), wallet(2)]);
        assert_eq!(registry.delegate_of(&wallet(1)), None);
        assert_eq!(registry.delegation_count(), 1);
    }
}
