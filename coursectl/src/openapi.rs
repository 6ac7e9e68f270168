//! OpenAPI document for the HTTP API, served at `/api-docs/openapi.json`.

use utoipa::{
    Modify, OpenApi,
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
};

use crate::api::{handlers, models};
use crate::types::{GroupStatus, RepositoryKind};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "X-Coursectl-User",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new("x-coursectl-user"))),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::probes::healthz,
        handlers::groups::get_group,
        handlers::groups::update_group_status,
        handlers::groups::delete_group,
    ),
    components(schemas(
        GroupStatus,
        RepositoryKind,
        models::groups::GroupStatusUpdate,
        models::groups::GroupMemberResponse,
        models::groups::GroupResponse,
        models::groups::ProvisionedRepository,
        models::groups::ProvisionedTeam,
        models::groups::GroupProvisionResponse,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "groups", description = "Student group lookup and provisioning"),
        (name = "probes", description = "Service health"),
    )
)]
pub struct ApiDoc;
