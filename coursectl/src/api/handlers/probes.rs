/// Liveness probe
#[utoipa::path(
    get,
    path = "/healthz",
    tag = "probes",
    summary = "Health check",
    responses((status = 200, description = "Service is running", body = String))
)]
pub async fn healthz() -> &'static str {
    "OK"
}
