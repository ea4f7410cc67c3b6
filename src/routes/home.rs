use tracing::info;

use crate::auth::extractors::AuthUser;

pub async fn dashboard(AuthUser(email): AuthUser) -> &'static str {
    info!(%email, "dashboard visited");
    "Dashboard for authorized users"
}
