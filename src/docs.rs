use crate::auth::handlers::TokenResponse;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Workflow API",
        version = "1.0.0",
        description = r#"
## Workflow: employee roster & attendance

### Key Features
- **Employees**
  - Create, list, look up, patch and delete employee records, keyed by email
- **Attendance**
  - One record per employee per date; list, update (upsert) and delete
- **Auth**
  - Short-lived bearer tokens and an admin role check

### Security
`GET /users/admin/{email}` requires a **JWT Bearer** token. Employee
patch/delete additionally require the **admin** role when the server runs
with `ADMIN_GUARDED_MUTATIONS=true`.
"#,
    ),
    paths(
        crate::auth::handlers::issue_token,
        crate::auth::handlers::admin_status,

        crate::api::employee::create_user,
        crate::api::employee::list_users,
        crate::api::employee::employee_by_email,
        crate::api::employee::get_user,
        crate::api::employee::patch_user,
        crate::api::employee::delete_user,

        crate::api::attendance::create_attendance,
        crate::api::attendance::list_attendance,
        crate::api::attendance::attendance_by_email,
        crate::api::attendance::update_attendance,
        crate::api::attendance::delete_attendance
    ),
    components(
        schemas(TokenResponse)
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "Auth", description = "Token and role APIs"),
        (name = "Employee", description = "Employee roster APIs"),
        (name = "Attendance", description = "Attendance ledger APIs"),
    )
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
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
