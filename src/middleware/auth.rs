use crate::{models::member::MemberRole, utils::jwt::verify_jwt, AppState};
use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub member_id: Uuid,
    pub role: MemberRole,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        matches!(self.role, MemberRole::Admin)
    }

    /// Admins and managers run the team and see analytics.
    pub fn can_manage(&self) -> bool {
        matches!(self.role, MemberRole::Admin | MemberRole::Manager)
    }

    /// Viewers are read-only everywhere.
    pub fn can_edit(&self) -> bool {
        !matches!(self.role, MemberRole::Viewer)
    }

    pub fn role_str(&self) -> &'static str {
        match self.role {
            MemberRole::Admin => "admin",
            MemberRole::Manager => "manager",
            MemberRole::Member => "member",
            MemberRole::Viewer => "viewer",
        }
    }
}

pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let auth_header = request
        .headers()
        .get("Authorization")
        .and_then(|header| header.to_str().ok())
        .ok_or(StatusCode::UNAUTHORIZED)?;

    if !auth_header.starts_with("Bearer ") {
        return Err(StatusCode::UNAUTHORIZED);
    }

    let token = &auth_header[7..]; // Remove "Bearer " prefix

    let claims = verify_jwt(token, &state.jwt_secret).map_err(|_| StatusCode::UNAUTHORIZED)?;

    let role = match claims.role.as_str() {
        "admin" => MemberRole::Admin,
        "manager" => MemberRole::Manager,
        "member" => MemberRole::Member,
        "viewer" => MemberRole::Viewer,
        _ => return Err(StatusCode::UNAUTHORIZED),
    };

    let auth_user = AuthUser {
        member_id: claims.sub,
        role,
    };

    request.extensions_mut().insert(auth_user);
    Ok(next.run(request).await)
}
