// ============================
// crates/backend-lib/src/handlers/user.rs
// ============================
use crate::middleware::CurrentUser;
use axum::{Extension, Json};
use tasklive_common::{ApiResponse, PublicUser};

/// `GET /user`: the signed-in identity
pub async fn me(Extension(CurrentUser(user)): Extension<CurrentUser>) -> Json<ApiResponse<PublicUser>> {
    Json(ApiResponse::data(user.to_public()))
}
