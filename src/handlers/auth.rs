use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::{
    models::member::{
        LoginRequest, LoginResponse, MemberResponse, MemberRole, MemberStatus, RegisterRequest,
        TeamMember,
    },
    utils::{errors::AppError, jwt::create_jwt, logger::LOGGER},
    AppState,
};

/// How long an issued OAuth `state` nonce stays valid.
const OAUTH_STATE_TTL_MINUTES: i64 = 10;
/// Stand-in for the provider round-trip when exchanging the code.
const SIMULATED_EXCHANGE_MS: u64 = 400;
/// Where the client should send the user after a failed callback.
const SIGNIN_PATH: &str = "/signin";

pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<MemberResponse>, AppError> {
    payload.validate()?;

    let password_hash = hash(&payload.password, DEFAULT_COST)
        .map_err(|_| AppError::InternalServerError("Failed to hash password".to_string()))?;

    // Registering against an invited email completes the invitation.
    if let Some(existing) = state.store.find_member_by_email(&payload.email).await {
        if existing.status == MemberStatus::Pending && existing.password_hash.is_none() {
            let member = state
                .store
                .update_member(existing.id, |member| {
                    member.password_hash = Some(password_hash);
                    member.status = MemberStatus::Active;
                    member.name = payload.name;
                    member.phone = payload.phone;
                })
                .await?;

            LOGGER.log_business_event("invitation_completed", Some(member.id), Default::default());
            return Ok(Json(MemberResponse::from(member)));
        }
        return Err(AppError::Conflict(
            "A member with this email already exists".to_string(),
        ));
    }

    let role = if state.store.list_members().await.is_empty() {
        MemberRole::Admin
    } else {
        MemberRole::Member
    };

    let now = Utc::now();
    let member = TeamMember {
        id: Uuid::new_v4(),
        name: payload.name,
        email: payload.email,
        phone: payload.phone,
        role,
        department: payload.department,
        status: MemberStatus::Active,
        password_hash: Some(password_hash),
        created_at: now,
        updated_at: now,
    };

    let member = state.store.insert_member(member).await?;
    Ok(Json(MemberResponse::from(member)))
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    payload.validate()?;

    let member = state
        .store
        .find_member_by_email(&payload.email)
        .await
        .ok_or_else(|| AppError::Unauthorized("Invalid email or password".to_string()))?;

    let password_hash = member
        .password_hash
        .as_deref()
        .ok_or_else(|| AppError::Unauthorized("Invalid email or password".to_string()))?;

    let is_valid = verify(&payload.password, password_hash)
        .map_err(|_| AppError::InternalServerError("Failed to verify password".to_string()))?;

    if !is_valid {
        return Err(AppError::Unauthorized(
            "Invalid email or password".to_string(),
        ));
    }

    if member.status != MemberStatus::Active {
        return Err(AppError::Forbidden(
            "This account is not active".to_string(),
        ));
    }

    let token = create_jwt(member.id, role_str(member.role), &state.jwt_secret)
        .map_err(|_| AppError::InternalServerError("Failed to create token".to_string()))?;

    Ok(Json(LoginResponse {
        token,
        member: MemberResponse::from(member),
    }))
}

#[derive(Debug, Serialize)]
pub struct OAuthStartResponse {
    pub authorize_url: String,
    pub state: String,
}

/// First leg of the social-login flow: mint the CSRF `state` nonce and
/// hand back the provider authorize URL that carries it.
pub async fn linkedin_start(State(state): State<AppState>) -> Json<OAuthStartResponse> {
    let nonce = Uuid::new_v4().simple().to_string();
    state.store.insert_oauth_state(nonce.clone()).await;

    let authorize_url = format!(
        "https://www.linkedin.com/oauth/v2/authorization?response_type=code&client_id={}&redirect_uri={}&state={}&scope=r_liteprofile%20r_emailaddress",
        state.linkedin_client_id, state.linkedin_redirect_uri, nonce
    );

    Json(OAuthStartResponse {
        authorize_url,
        state: nonce,
    })
}

#[derive(Debug, Deserialize)]
pub struct OAuthCallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
}

/// Callback failures surface the error and point the client back at the
/// sign-in entry after a short delay, instead of the generic error shape.
#[derive(Debug, Serialize)]
pub struct CallbackFailure {
    error: &'static str,
    message: String,
    redirect_to: &'static str,
    retry_after_seconds: u64,
}

impl CallbackFailure {
    fn new(message: impl Into<String>) -> Self {
        Self {
            error: "OAUTH_CALLBACK_FAILED",
            message: message.into(),
            redirect_to: SIGNIN_PATH,
            retry_after_seconds: 3,
        }
    }
}

impl IntoResponse for CallbackFailure {
    fn into_response(self) -> Response {
        (StatusCode::UNAUTHORIZED, Json(self)).into_response()
    }
}

/// Second leg: `state` must match a previously issued nonce (single use,
/// bounded age) before the code is exchanged. The exchange itself is a
/// simulated boundary; the real backend integration plugs in here.
pub async fn linkedin_callback(
    State(state): State<AppState>,
    Query(query): Query<OAuthCallbackQuery>,
) -> Result<Json<LoginResponse>, CallbackFailure> {
    let code = match query.code.as_deref() {
        Some(code) if !code.is_empty() => code.to_string(),
        _ => {
            LOGGER.log_business_event("oauth_callback_missing_code", None, Default::default());
            return Err(CallbackFailure::new(
                "The sign-in provider did not return an authorization code",
            ));
        }
    };

    let nonce = query.state.unwrap_or_default();
    let state_ok = state
        .store
        .consume_oauth_state(&nonce, Duration::minutes(OAUTH_STATE_TTL_MINUTES))
        .await;
    if !state_ok {
        LOGGER.log_business_event("oauth_callback_state_mismatch", None, Default::default());
        return Err(CallbackFailure::new(
            "Sign-in session could not be verified, please try again",
        ));
    }

    // Exchange the code with the provider. Simulated: a short delay in
    // place of the network round-trip, then a canned profile.
    tokio::time::sleep(tokio::time::Duration::from_millis(SIMULATED_EXCHANGE_MS)).await;
    let _ = code;
    let profile_email = "linkedin.user@screening.dev";
    let profile_name = "LinkedIn User";

    let member = match state.store.find_member_by_email(profile_email).await {
        Some(existing) => {
            if existing.status == MemberStatus::Inactive {
                return Err(CallbackFailure::new("This account is not active"));
            }
            if existing.status == MemberStatus::Pending {
                state
                    .store
                    .update_member(existing.id, |member| {
                        member.status = MemberStatus::Active;
                    })
                    .await
                    .map_err(|_| CallbackFailure::new("Sign-in failed, please try again"))?
            } else {
                existing
            }
        }
        None => {
            let now = Utc::now();
            let member = TeamMember {
                id: Uuid::new_v4(),
                name: profile_name.to_string(),
                email: profile_email.to_string(),
                phone: None,
                role: MemberRole::Member,
                department: "Talent".to_string(),
                status: MemberStatus::Active,
                password_hash: None,
                created_at: now,
                updated_at: now,
            };
            state
                .store
                .insert_member(member)
                .await
                .map_err(|_| CallbackFailure::new("Sign-in failed, please try again"))?
        }
    };

    let token = create_jwt(member.id, role_str(member.role), &state.jwt_secret)
        .map_err(|_| CallbackFailure::new("Sign-in failed, please try again"))?;

    LOGGER.log_business_event("oauth_login_succeeded", Some(member.id), Default::default());

    Ok(Json(LoginResponse {
        token,
        member: MemberResponse::from(member),
    }))
}

fn role_str(role: MemberRole) -> &'static str {
    match role {
        MemberRole::Admin => "admin",
        MemberRole::Manager => "manager",
        MemberRole::Member => "member",
        MemberRole::Viewer => "viewer",
    }
}
