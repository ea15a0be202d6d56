use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Identity fields of an employee, as read from the employees table.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct EmployeeSnapshot {
    pub id: u64,
    pub employee_code: String,
    pub first_name: String,
    pub last_name: String,
}

impl EmployeeSnapshot {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "employee_code": "EMP-001",
        "name": "John Doe"
    })
)]
pub struct EmployeeSummary {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = "EMP-001")]
    pub employee_code: String,

    #[schema(example = "John Doe")]
    pub name: String,
}

impl From<&EmployeeSnapshot> for EmployeeSummary {
    fn from(employee: &EmployeeSnapshot) -> Self {
        Self {
            id: employee.id,
            employee_code: employee.employee_code.clone(),
            name: employee.full_name(),
        }
    }
}
