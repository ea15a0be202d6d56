use crate::api::handover::{
    CreateAdminHandover, CreateHandover, HandoverListResponse, UpdateHandoverStatus,
};
use crate::model::employee::EmployeeSummary;
use crate::model::handover::{HandoverStatus, HandoverView, LeaveHandover};
use utoipa::Modify;
use utoipa::OpenApi;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "HRM Leave Handover API",
        version = "1.0.0",
        description = r#"
## Leave Handover Service

Part of the **Human Resource Management (HRM)** system. While an employee is on
approved leave, their responsibilities are handed over to a covering colleague.

### 🔹 Workflow
- An employee creates a handover for one of their **approved** leaves; it starts **pending**
- The receiving employee **accepts** or **rejects** it (one answer only)
- HR/Admin may assign a handover directly; it is **accepted** immediately and cannot be changed

### ⛔ Availability rules
- The covering employee must not be on approved leave during the period
- The covering employee cannot hold another pending/accepted handover for an overlapping period
- Date ranges are inclusive: sharing a single day counts as overlap

### 🔐 Security
All endpoints require a **JWT Bearer** access token issued by the HRM identity service.

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::handover::create_handover,
        crate::api::handover::create_admin_handover,
        crate::api::handover::update_handover_status,
        crate::api::handover::handover_history,
        crate::api::handover::handover_list,
        crate::api::handover::get_handover
    ),
    components(
        schemas(
            CreateHandover,
            CreateAdminHandover,
            UpdateHandoverStatus,
            HandoverListResponse,
            HandoverStatus,
            LeaveHandover,
            HandoverView,
            EmployeeSummary
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Handover", description = "Leave handover APIs"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}
