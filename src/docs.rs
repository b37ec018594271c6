use crate::coordinator::handlers::{ApplyLeave, EmployeeDetails};
use crate::ledger::record::LeaveView;
use crate::model::leave_status::LeaveStatus;
use utoipa::Modify;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Leave Workflow API",
        version = "1.0.0",
        description = r#"
## Leave Workflow Coordinator

External API of the leave-management backend. The coordinator
authenticates callers, enforces admin-only operations and forwards the
actual state transitions to the leave ledger service over RPC.

### 🔹 Key Features
- **Leave applications** with date and balance admission rules
- **Capability links**: listing pending leaves issues single-use
  approve/reject links; consuming a link decides the request
- **Balance tracking** with an exactly-once debit per approved leave

### 🔐 Security
All endpoints require **JWT Bearer authentication**; decision and
listing endpoints additionally require the **admin** role.

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::coordinator::handlers::apply_leave,
        crate::coordinator::handlers::list_leaves,
        crate::coordinator::handlers::own_leaves,
        crate::coordinator::handlers::pending_by_email,
        crate::coordinator::handlers::pending_by_status,
        crate::coordinator::handlers::approve_leave,
        crate::coordinator::handlers::reject_leave,
        crate::coordinator::handlers::own_details,
    ),
    components(
        schemas(
            ApplyLeave,
            EmployeeDetails,
            LeaveView,
            LeaveStatus
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Leave", description = "Leave workflow APIs"),
        (name = "Employee", description = "Employee self-service APIs"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
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
}
