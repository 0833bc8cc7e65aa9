//! RoleGate: the single authorization decision point.
//!
//! Decisions come from one declarative table ([`POLICY`]). Anything the table
//! does not grant is denied.

use serde::Serialize;
use thiserror::Error;

use outletops_core::{DomainError, OutletId};

use crate::{Actor, Role};

/// Everything a caller can ask the core to do.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    ViewCatalog,
    ManageCatalog,
    ViewStock,
    AdjustStock,
    PlaceCustomerOrder,
    TransitionCustomerOrder,
    RequestFactoryOrder,
    TransitionFactoryOrder,
    ViewOrders,
    RequestReturn,
    DecideReturn,
    ViewReturns,
}

impl Action {
    pub const ALL: [Action; 12] = [
        Action::ViewCatalog,
        Action::ManageCatalog,
        Action::ViewStock,
        Action::AdjustStock,
        Action::PlaceCustomerOrder,
        Action::TransitionCustomerOrder,
        Action::RequestFactoryOrder,
        Action::TransitionFactoryOrder,
        Action::ViewOrders,
        Action::RequestReturn,
        Action::DecideReturn,
        Action::ViewReturns,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::ViewCatalog => "view_catalog",
            Action::ManageCatalog => "manage_catalog",
            Action::ViewStock => "view_stock",
            Action::AdjustStock => "adjust_stock",
            Action::PlaceCustomerOrder => "place_customer_order",
            Action::TransitionCustomerOrder => "transition_customer_order",
            Action::RequestFactoryOrder => "request_factory_order",
            Action::TransitionFactoryOrder => "transition_factory_order",
            Action::ViewOrders => "view_orders",
            Action::RequestReturn => "request_return",
            Action::DecideReturn => "decide_return",
            Action::ViewReturns => "view_returns",
        }
    }
}

impl core::fmt::Display for Action {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which outlets a rule covers.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Scope {
    /// Any outlet, or no outlet at all (catalog-wide / factory-wide actions).
    Any,
    /// Only the actor's own outlet; requires a concrete target outlet.
    OwnOutlet,
}

#[derive(Debug, Copy, Clone)]
enum Grant {
    All,
    Only(&'static [Action]),
}

#[derive(Debug, Copy, Clone)]
struct Rule {
    role: Role,
    grant: Grant,
    scope: Scope,
}

const POLICY: &[Rule] = &[
    Rule {
        role: Role::Owner,
        grant: Grant::All,
        scope: Scope::Any,
    },
    Rule {
        role: Role::FactoryStaff,
        grant: Grant::Only(&[
            Action::ViewCatalog,
            Action::ViewStock,
            Action::TransitionFactoryOrder,
            Action::ViewOrders,
            Action::DecideReturn,
            Action::ViewReturns,
        ]),
        scope: Scope::Any,
    },
    Rule {
        role: Role::OutletStaff,
        grant: Grant::Only(&[Action::ViewCatalog]),
        scope: Scope::Any,
    },
    Rule {
        role: Role::OutletStaff,
        grant: Grant::Only(&[
            Action::ViewStock,
            Action::PlaceCustomerOrder,
            Action::TransitionCustomerOrder,
            Action::RequestFactoryOrder,
            Action::ViewOrders,
            Action::RequestReturn,
            Action::ViewReturns,
        ]),
        scope: Scope::OwnOutlet,
    },
];

/// Why a request was denied.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialKind {
    /// No rule grants the action to the role.
    NotPermitted,
    /// A rule grants the action, but only for the actor's own outlet.
    OutOfScope,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "decision", content = "reason")]
pub enum Decision {
    Allow,
    Deny(DenialKind),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }
}

/// Pure authorization function (no IO, no storage, no panics).
///
/// `target_outlet` is the outlet the action touches, or `None` for
/// catalog-wide and factory-wide actions.
pub fn authorize(
    role: Role,
    outlet_scope: Option<OutletId>,
    action: Action,
    target_outlet: Option<OutletId>,
) -> Decision {
    let mut granted_elsewhere = false;

    for rule in POLICY.iter().filter(|r| r.role == role) {
        let covers_action = match rule.grant {
            Grant::All => true,
            Grant::Only(actions) => actions.contains(&action),
        };
        if !covers_action {
            continue;
        }

        match rule.scope {
            Scope::Any => return Decision::Allow,
            Scope::OwnOutlet => match (outlet_scope, target_outlet) {
                (Some(own), Some(target)) if own == target => return Decision::Allow,
                _ => granted_elsewhere = true,
            },
        }
    }

    if granted_elsewhere {
        Decision::Deny(DenialKind::OutOfScope)
    } else {
        Decision::Deny(DenialKind::NotPermitted)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("{role} is not permitted to {action}")]
    Forbidden { role: Role, action: Action },

    #[error("{role} may only {action} within their own outlet")]
    OutOfScope { role: Role, action: Action },

    #[error("outlet_staff principal has no outlet scope")]
    MissingOutletScope,
}

impl From<AuthzError> for DomainError {
    fn from(value: AuthzError) -> Self {
        DomainError::unauthorized(value.to_string())
    }
}

/// Service-facing entry point to the gate.
#[derive(Debug, Default, Clone, Copy)]
pub struct RoleGate;

impl RoleGate {
    pub fn new() -> Self {
        Self
    }

    pub fn check(
        &self,
        actor: &Actor,
        action: Action,
        target_outlet: Option<OutletId>,
    ) -> Result<(), AuthzError> {
        match authorize(actor.role(), actor.outlet_scope(), action, target_outlet) {
            Decision::Allow => Ok(()),
            Decision::Deny(DenialKind::NotPermitted) => Err(AuthzError::Forbidden {
                role: actor.role(),
                action,
            }),
            Decision::Deny(DenialKind::OutOfScope) => Err(AuthzError::OutOfScope {
                role: actor.role(),
                action,
            }),
        }
    }

    /// Whether the actor may see data belonging to `outlet` for a view action.
    pub fn can_view(&self, actor: &Actor, action: Action, outlet: OutletId) -> bool {
        self.check(actor, action, Some(outlet)).is_ok()
    }

    /// Actions the actor may perform within their own scope (for `whoami`).
    pub fn permitted_actions(&self, actor: &Actor) -> Vec<Action> {
        Action::ALL
            .into_iter()
            .filter(|a| {
                authorize(actor.role(), actor.outlet_scope(), *a, actor.outlet_scope())
                    .is_allowed()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PrincipalId;

    #[test]
    fn owner_is_allowed_everything_everywhere() {
        for action in Action::ALL {
            assert_eq!(authorize(Role::Owner, None, action, Some(OutletId::new())), Decision::Allow);
            assert_eq!(authorize(Role::Owner, None, action, None), Decision::Allow);
        }
    }

    #[test]
    fn outlet_staff_limited_to_own_outlet() {
        let own = OutletId::new();
        let other = OutletId::new();

        assert_eq!(
            authorize(Role::OutletStaff, Some(own), Action::TransitionCustomerOrder, Some(own)),
            Decision::Allow
        );
        assert_eq!(
            authorize(Role::OutletStaff, Some(own), Action::TransitionCustomerOrder, Some(other)),
            Decision::Deny(DenialKind::OutOfScope)
        );
        assert_eq!(
            authorize(Role::OutletStaff, Some(own), Action::ViewOrders, None),
            Decision::Deny(DenialKind::OutOfScope)
        );
    }

    #[test]
    fn outlet_staff_cannot_do_factory_work() {
        let own = OutletId::new();
        for action in [
            Action::TransitionFactoryOrder,
            Action::DecideReturn,
            Action::ManageCatalog,
            Action::AdjustStock,
        ] {
            assert_eq!(
                authorize(Role::OutletStaff, Some(own), action, Some(own)),
                Decision::Deny(DenialKind::NotPermitted),
                "{action}"
            );
        }
    }

    #[test]
    fn factory_staff_acts_factory_wide_regardless_of_outlet() {
        let outlet = OutletId::new();
        assert!(authorize(Role::FactoryStaff, None, Action::DecideReturn, Some(outlet)).is_allowed());
        assert!(authorize(Role::FactoryStaff, None, Action::TransitionFactoryOrder, Some(outlet)).is_allowed());
        assert!(!authorize(Role::FactoryStaff, None, Action::PlaceCustomerOrder, Some(outlet)).is_allowed());
        assert!(!authorize(Role::FactoryStaff, None, Action::TransitionCustomerOrder, Some(outlet)).is_allowed());
        assert!(!authorize(Role::FactoryStaff, None, Action::RequestReturn, Some(outlet)).is_allowed());
    }

    #[test]
    fn gate_reports_specific_denials() {
        let gate = RoleGate::new();
        let outlet_one = OutletId::new();
        let outlet_two = OutletId::new();
        let staff = Actor::outlet_staff(PrincipalId::new(), outlet_one);

        let err = gate
            .check(&staff, Action::TransitionCustomerOrder, Some(outlet_two))
            .unwrap_err();
        assert_eq!(
            err,
            AuthzError::OutOfScope {
                role: Role::OutletStaff,
                action: Action::TransitionCustomerOrder
            }
        );

        let err = gate.check(&staff, Action::DecideReturn, Some(outlet_one)).unwrap_err();
        assert!(matches!(err, AuthzError::Forbidden { .. }));
        assert!(matches!(DomainError::from(err), DomainError::Unauthorized(_)));
    }

    #[test]
    fn permitted_actions_for_outlet_staff() {
        let gate = RoleGate::new();
        let staff = Actor::outlet_staff(PrincipalId::new(), OutletId::new());
        let actions = gate.permitted_actions(&staff);

        assert!(actions.contains(&Action::PlaceCustomerOrder));
        assert!(actions.contains(&Action::ViewCatalog));
        assert!(!actions.contains(&Action::DecideReturn));
        assert_eq!(gate.permitted_actions(&Actor::owner(PrincipalId::new())).len(), Action::ALL.len());
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        fn any_role() -> impl Strategy<Value = Role> {
            prop::sample::select(Role::ALL.to_vec())
        }

        fn any_action() -> impl Strategy<Value = Action> {
            prop::sample::select(Action::ALL.to_vec())
        }

        proptest! {
            /// Property: outlet staff never get access to an outlet that is not theirs.
            #[test]
            fn outlet_staff_never_cross_outlets(action in any_action()) {
                let own = OutletId::new();
                let other = OutletId::new();
                let decision = authorize(Role::OutletStaff, Some(own), action, Some(other));
                if action != Action::ViewCatalog {
                    prop_assert!(!decision.is_allowed());
                }
            }

            /// Property: the decision only depends on its inputs.
            #[test]
            fn authorize_is_deterministic(role in any_role(), action in any_action(), same in any::<bool>()) {
                let own = OutletId::new();
                let target = if same { own } else { OutletId::new() };
                prop_assert_eq!(
                    authorize(role, Some(own), action, Some(target)),
                    authorize(role, Some(own), action, Some(target))
                );
            }
        }
    }
}
