//! # Access Control Gate
//!
//! One rule table decides who may do what.
//!
//! ## Decision Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  authorize(actor, action)                                               │
//! │       │                                                                 │
//! │       ├── actor inactive?                  → AccessDenied               │
//! │       │                                                                 │
//! │       ├── role lacks action.rule().module? → AccessDenied               │
//! │       │                                                                 │
//! │       ├── role not in action.rule().roles? → AccessDenied               │
//! │       │                                                                 │
//! │       └── Ok(())                                                        │
//! │                                                                         │
//! │  authorize_on_user(actor, action, target)                               │
//! │       │                                                                 │
//! │       ├── authorize(actor, action)?                                     │
//! │       │                                                                 │
//! │       ├── SelfTarget::Denied  && target == actor → AccessDenied         │
//! │       ├── SelfTarget::OwnOnly && target != actor → AccessDenied         │
//! │       │                                                                 │
//! │       └── Ok(())                                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every HTTP handler calls the gate as its first statement, so a denial
//! never follows a side effect.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::types::Role;

// =============================================================================
// Modules
// =============================================================================

/// A navigable area of the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Module {
    Dashboard,
    Medicines,
    Sales,
    Prescriptions,
    Suppliers,
    Analytics,
    Reports,
    Settings,
}

impl Role {
    /// Modules visible to this role. Fixed at compile time.
    pub const fn modules(&self) -> &'static [Module] {
        match self {
            Role::Admin => &[
                Module::Dashboard,
                Module::Medicines,
                Module::Sales,
                Module::Prescriptions,
                Module::Suppliers,
                Module::Analytics,
                Module::Reports,
                Module::Settings,
            ],
            Role::Pharmacist => &[
                Module::Dashboard,
                Module::Medicines,
                Module::Sales,
                Module::Prescriptions,
                Module::Reports,
            ],
            Role::Cashier => &[Module::Dashboard, Module::Sales],
        }
    }

    pub fn can_access(&self, module: Module) -> bool {
        self.modules().contains(&module)
    }
}

// =============================================================================
// Actions
// =============================================================================

/// Every operation a caller can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    ViewDashboard,
    ViewOwnProfile,
    UpdateOwnProfile,

    ListMedicines,
    ViewMedicine,
    CreateMedicine,
    UpdateMedicine,
    DeleteMedicine,
    ListSaleableMedicines,

    ListSales,
    ViewSale,
    RecordSale,
    ExportInvoice,

    ListPrescriptions,
    CreatePrescription,
    FulfillPrescription,

    ListSuppliers,
    ViewSupplier,
    CreateSupplier,
    UpdateSupplier,
    DeleteSupplier,

    ViewAnalytics,
    ViewReports,
    ExportReports,

    ListUsers,
    CreateUser,
    ToggleUserActive,
    DeleteUser,
}

/// How an action relates to the caller's own account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelfTarget {
    /// The action does not target a user.
    NotApplicable,
    /// The caller may not target themselves.
    Denied,
    /// The caller may only target themselves.
    OwnOnly,
}

/// One row of the rule table.
#[derive(Debug, Clone, Copy)]
pub struct Rule {
    pub module: Module,
    pub roles: &'static [Role],
    pub self_target: SelfTarget,
}

const ALL_ROLES: &[Role] = &[Role::Admin, Role::Pharmacist, Role::Cashier];
const STOCK_ROLES: &[Role] = &[Role::Admin, Role::Pharmacist];
const ADMIN_ONLY: &[Role] = &[Role::Admin];

impl Action {
    pub const ALL: [Action; 28] = [
        Action::ViewDashboard,
        Action::ViewOwnProfile,
        Action::UpdateOwnProfile,
        Action::ListMedicines,
        Action::ViewMedicine,
        Action::CreateMedicine,
        Action::UpdateMedicine,
        Action::DeleteMedicine,
        Action::ListSaleableMedicines,
        Action::ListSales,
        Action::ViewSale,
        Action::RecordSale,
        Action::ExportInvoice,
        Action::ListPrescriptions,
        Action::CreatePrescription,
        Action::FulfillPrescription,
        Action::ListSuppliers,
        Action::ViewSupplier,
        Action::CreateSupplier,
        Action::UpdateSupplier,
        Action::DeleteSupplier,
        Action::ViewAnalytics,
        Action::ViewReports,
        Action::ExportReports,
        Action::ListUsers,
        Action::CreateUser,
        Action::ToggleUserActive,
        Action::DeleteUser,
    ];

    /// The rule table.
    pub const fn rule(&self) -> Rule {
        use Action::*;

        let (module, roles, self_target) = match self {
            ViewDashboard => (Module::Dashboard, ALL_ROLES, SelfTarget::NotApplicable),
            ViewOwnProfile | UpdateOwnProfile => {
                (Module::Dashboard, ALL_ROLES, SelfTarget::OwnOnly)
            }

            ListMedicines | ViewMedicine | CreateMedicine | UpdateMedicine | DeleteMedicine => {
                (Module::Medicines, STOCK_ROLES, SelfTarget::NotApplicable)
            }
            ListSaleableMedicines => (Module::Sales, ALL_ROLES, SelfTarget::NotApplicable),

            ListSales | ViewSale | RecordSale | ExportInvoice => {
                (Module::Sales, ALL_ROLES, SelfTarget::NotApplicable)
            }

            ListPrescriptions | CreatePrescription | FulfillPrescription => {
                (Module::Prescriptions, STOCK_ROLES, SelfTarget::NotApplicable)
            }

            ListSuppliers | ViewSupplier | CreateSupplier | UpdateSupplier | DeleteSupplier => {
                (Module::Suppliers, ADMIN_ONLY, SelfTarget::NotApplicable)
            }

            ViewAnalytics => (Module::Analytics, ADMIN_ONLY, SelfTarget::NotApplicable),
            ViewReports | ExportReports => {
                (Module::Reports, STOCK_ROLES, SelfTarget::NotApplicable)
            }

            ListUsers | CreateUser => (Module::Settings, ADMIN_ONLY, SelfTarget::NotApplicable),
            ToggleUserActive | DeleteUser => (Module::Settings, ADMIN_ONLY, SelfTarget::Denied),
        };

        Rule {
            module,
            roles,
            self_target,
        }
    }
}

// =============================================================================
// Actor
// =============================================================================

/// The authenticated caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub user_id: i64,
    pub role: Role,
    pub is_active: bool,
}

impl Actor {
    pub const fn new(user_id: i64, role: Role, is_active: bool) -> Self {
        Self {
            user_id,
            role,
            is_active,
        }
    }
}

// =============================================================================
// Gate
// =============================================================================

/// Checks that `actor` may perform `action`.
///
/// Does not look at self-target policy; use [`authorize_on_user`] for
/// actions that name a user.
pub fn authorize(actor: &Actor, action: Action) -> CoreResult<()> {
    let rule = action.rule();

    if !actor.is_active
        || !actor.role.can_access(rule.module)
        || !rule.roles.contains(&actor.role)
    {
        return Err(CoreError::AccessDenied { action });
    }

    Ok(())
}

/// Checks that `actor` may perform `action` against the user `target_user_id`.
pub fn authorize_on_user(actor: &Actor, action: Action, target_user_id: i64) -> CoreResult<()> {
    authorize(actor, action)?;

    let is_self = actor.user_id == target_user_id;
    let allowed = match action.rule().self_target {
        SelfTarget::NotApplicable => true,
        SelfTarget::Denied => !is_self,
        SelfTarget::OwnOnly => is_self,
    };

    if !allowed {
        return Err(CoreError::AccessDenied { action });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const ADMIN: Actor = Actor::new(1, Role::Admin, true);
    const PHARMACIST: Actor = Actor::new(2, Role::Pharmacist, true);
    const CASHIER: Actor = Actor::new(3, Role::Cashier, true);

    #[test]
    fn test_rule_roles_are_subset_of_module_roles() {
        for action in Action::ALL {
            let rule = action.rule();
            for role in rule.roles {
                assert!(
                    role.can_access(rule.module),
                    "{:?} grants {:?} but {:?} cannot open {:?}",
                    action,
                    role,
                    role,
                    rule.module
                );
            }
        }
    }

    #[test]
    fn test_admin_can_do_everything_not_self_targeted() {
        for action in Action::ALL {
            assert!(authorize(&ADMIN, action).is_ok(), "{:?}", action);
        }
    }

    #[test]
    fn test_cashier_denied_supplier_and_user_actions() {
        for action in [
            Action::ListSuppliers,
            Action::ViewSupplier,
            Action::CreateSupplier,
            Action::UpdateSupplier,
            Action::DeleteSupplier,
            Action::ListUsers,
            Action::CreateUser,
            Action::ToggleUserActive,
            Action::DeleteUser,
        ] {
            let err = authorize(&CASHIER, action).unwrap_err();
            assert!(matches!(err, CoreError::AccessDenied { action: a } if a == action));
        }
    }

    #[test]
    fn test_cashier_can_sell() {
        assert!(authorize(&CASHIER, Action::RecordSale).is_ok());
        assert!(authorize(&CASHIER, Action::ListSaleableMedicines).is_ok());
        assert!(authorize(&CASHIER, Action::ExportInvoice).is_ok());
        assert!(authorize(&CASHIER, Action::ListMedicines).is_err());
        assert!(authorize(&CASHIER, Action::ViewReports).is_err());
    }

    #[test]
    fn test_pharmacist_modules() {
        assert!(authorize(&PHARMACIST, Action::CreateMedicine).is_ok());
        assert!(authorize(&PHARMACIST, Action::FulfillPrescription).is_ok());
        assert!(authorize(&PHARMACIST, Action::ExportReports).is_ok());
        assert!(authorize(&PHARMACIST, Action::ViewAnalytics).is_err());
        assert!(authorize(&PHARMACIST, Action::CreateSupplier).is_err());
    }

    #[test]
    fn test_inactive_actor_denied_everything() {
        let inactive = Actor::new(1, Role::Admin, false);
        for action in Action::ALL {
            assert!(authorize(&inactive, action).is_err(), "{:?}", action);
        }
    }

    #[test]
    fn test_self_toggle_and_delete_denied() {
        assert!(authorize_on_user(&ADMIN, Action::ToggleUserActive, ADMIN.user_id).is_err());
        assert!(authorize_on_user(&ADMIN, Action::DeleteUser, ADMIN.user_id).is_err());
        assert!(authorize_on_user(&ADMIN, Action::DeleteUser, 99).is_ok());
    }

    #[test]
    fn test_profile_is_own_only() {
        assert!(authorize_on_user(&CASHIER, Action::UpdateOwnProfile, CASHIER.user_id).is_ok());
        assert!(authorize_on_user(&CASHIER, Action::UpdateOwnProfile, ADMIN.user_id).is_err());
    }
}
