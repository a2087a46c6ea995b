//! Staff roles and approvers

use serde::{Deserialize, Serialize};

/// Staff role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    SuperAdmin,
    OutletAdmin,
    Cashier,
    Captain,
    Waiter,
}

impl Role {
    /// Roles allowed to approve above-threshold discounts and overrides
    pub fn is_elevated(&self) -> bool {
        matches!(self, Self::SuperAdmin | Self::OutletAdmin)
    }
}

/// Identity recorded against discounts, overrides and settlement edits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Approver {
    pub user_id: i64,
    pub name: String,
    pub role: Role,
}

impl Approver {
    pub fn new(user_id: i64, name: impl Into<String>, role: Role) -> Self {
        Self {
            user_id,
            name: name.into(),
            role,
        }
    }

    pub fn is_elevated(&self) -> bool {
        self.role.is_elevated()
    }
}
