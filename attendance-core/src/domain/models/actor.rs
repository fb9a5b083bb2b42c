use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::EmployeeId;

/// Role asserted by the external auth collaborator.
///
/// The engine never derives or enforces it; it only decides which leave
/// requests are loaded into the working set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Role {
    #[default]
    Employee,
    Reviewer,
}

/// The user driving the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub employee_id: EmployeeId,
    pub role: Role,
}

impl Actor {
    pub fn employee(employee_id: impl Into<EmployeeId>) -> Self {
        Self {
            employee_id: employee_id.into(),
            role: Role::Employee,
        }
    }

    pub fn reviewer(employee_id: impl Into<EmployeeId>) -> Self {
        Self {
            employee_id: employee_id.into(),
            role: Role::Reviewer,
        }
    }

    pub fn is_reviewer(&self) -> bool {
        self.role == Role::Reviewer
    }
}
