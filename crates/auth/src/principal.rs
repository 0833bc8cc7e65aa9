use core::str::FromStr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use outletops_core::OutletId;

use crate::{AuthzError, Role};

/// Identity of an authenticated principal (a staff member or the owner).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrincipalId(Uuid);

impl PrincipalId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl core::fmt::Display for PrincipalId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl From<Uuid> for PrincipalId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl FromStr for PrincipalId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::from_str(s)?))
    }
}

/// The authenticated caller of a service operation: who, in which role, and
/// which outlet their authority is scoped to.
///
/// Only outlet staff carry an outlet scope; owner and factory staff are
/// normalized to `None` on construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Actor {
    principal_id: PrincipalId,
    role: Role,
    outlet_scope: Option<OutletId>,
}

impl Actor {
    pub fn new(
        principal_id: PrincipalId,
        role: Role,
        outlet_scope: Option<OutletId>,
    ) -> Result<Self, AuthzError> {
        let outlet_scope = match role {
            Role::OutletStaff => Some(outlet_scope.ok_or(AuthzError::MissingOutletScope)?),
            Role::Owner | Role::FactoryStaff => None,
        };
        Ok(Self {
            principal_id,
            role,
            outlet_scope,
        })
    }

    pub fn owner(principal_id: PrincipalId) -> Self {
        Self {
            principal_id,
            role: Role::Owner,
            outlet_scope: None,
        }
    }

    pub fn factory_staff(principal_id: PrincipalId) -> Self {
        Self {
            principal_id,
            role: Role::FactoryStaff,
            outlet_scope: None,
        }
    }

    pub fn outlet_staff(principal_id: PrincipalId, outlet_id: OutletId) -> Self {
        Self {
            principal_id,
            role: Role::OutletStaff,
            outlet_scope: Some(outlet_id),
        }
    }

    pub fn principal_id(&self) -> PrincipalId {
        self.principal_id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn outlet_scope(&self) -> Option<OutletId> {
        self.outlet_scope
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outlet_staff_requires_scope() {
        let err = Actor::new(PrincipalId::new(), Role::OutletStaff, None).unwrap_err();
        assert_eq!(err, AuthzError::MissingOutletScope);
    }

    #[test]
    fn owner_and_factory_scope_is_dropped() {
        let outlet = OutletId::new();
        let owner = Actor::new(PrincipalId::new(), Role::Owner, Some(outlet)).unwrap();
        let factory = Actor::new(PrincipalId::new(), Role::FactoryStaff, Some(outlet)).unwrap();
        assert_eq!(owner.outlet_scope(), None);
        assert_eq!(factory.outlet_scope(), None);
    }
}
