//! The role table itself.

use crate::error::AccessError;
use kycdao_types::{Address, Role};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Role assignments and per-role admin roles.
///
/// Every role is administered by `ADMIN_ROLE` unless [`RoleTable::set_role_admin`]
/// says otherwise. At least one `ADMIN_ROLE` holder exists from bootstrap on.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RoleTable {
    /// role → holders.
    members: HashMap<Role, BTreeSet<Address>>,
    /// role → the role whose holders may grant/revoke it.
    role_admins: HashMap<Role, Role>,
}

impl RoleTable {
    /// Bootstrap a table with a single admin.
    pub fn with_admin(admin: Address) -> Self {
        let mut table = Self::default();
        table.insert(Role::Admin, admin);
        table
    }

    pub fn has_role(&self, role: Role, account: &Address) -> bool {
        self.members
            .get(&role)
            .is_some_and(|holders| holders.contains(account))
    }

    /// Fail with [`AccessError::Unauthorized`] unless `account` holds `role`.
    pub fn require_role(&self, role: Role, account: &Address) -> Result<(), AccessError> {
        if self.has_role(role, account) {
            Ok(())
        } else {
            Err(AccessError::Unauthorized {
                role,
                account: account.clone(),
            })
        }
    }

    /// The role allowed to grant and revoke `role`.
    pub fn role_admin(&self, role: Role) -> Role {
        self.role_admins.get(&role).copied().unwrap_or(Role::Admin)
    }

    /// Change which role administers `role`. Only `ADMIN_ROLE` may do this.
    pub fn set_role_admin(
        &mut self,
        caller: &Address,
        role: Role,
        admin_role: Role,
    ) -> Result<(), AccessError> {
        self.require_role(Role::Admin, caller)?;
        if admin_role == Role::Admin {
            self.role_admins.remove(&role);
        } else {
            self.role_admins.insert(role, admin_role);
        }
        Ok(())
    }

    /// Grant `role` to `account`. Returns whether anything changed;
    /// granting a held role is a successful no-op.
    pub fn grant_role(
        &mut self,
        caller: &Address,
        role: Role,
        account: &Address,
    ) -> Result<bool, AccessError> {
        self.require_role(self.role_admin(role), caller)?;
        Ok(self.insert(role, account.clone()))
    }

    /// Revoke `role` from `account`. Returns whether anything changed.
    pub fn revoke_role(
        &mut self,
        caller: &Address,
        role: Role,
        account: &Address,
    ) -> Result<bool, AccessError> {
        self.require_role(self.role_admin(role), caller)?;
        self.remove(role, account)
    }

    /// Drop a role the caller holds. No admin rights needed.
    pub fn renounce_role(&mut self, caller: &Address, role: Role) -> Result<bool, AccessError> {
        self.remove(role, caller)
    }

    /// Holders of `role`, in address order.
    pub fn members_of(&self, role: Role) -> Vec<&Address> {
        self.members
            .get(&role)
            .map(|holders| holders.iter().collect())
            .unwrap_or_default()
    }

    pub fn role_count(&self, role: Role) -> usize {
        self.members.get(&role).map_or(0, BTreeSet::len)
    }

    fn insert(&mut self, role: Role, account: Address) -> bool {
        self.members.entry(role).or_default().insert(account)
    }

    fn remove(&mut self, role: Role, account: &Address) -> Result<bool, AccessError> {
        if !self.has_role(role, account) {
            return Ok(false);
        }
        if role == Role::Admin && self.role_count(Role::Admin) == 1 {
            return Err(AccessError::LastAdmin(account.clone()));
        }
        let removed = self
            .members
            .get_mut(&role)
            .is_some_and(|holders| holders.remove(account));
        Ok(removed)
    }
}
