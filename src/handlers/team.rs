use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::Utc;
use serde::Deserialize;
use std::time::Instant;
use uuid::Uuid;
use validator::Validate;

use crate::{
    collection::{
        category_match, paginate, sort_records, text_match, PageRequest, Paged, SortDirection,
        SortValue, ViewMode,
    },
    middleware::auth::AuthUser,
    models::member::{
        InviteMemberRequest, MemberAction, MemberResponse, MemberRole, MemberStatus, TeamMember,
        UpdateMemberRequest,
    },
    utils::{errors::AppError, logger::LOGGER},
    AppState,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberSortKey {
    #[default]
    Name,
    JoinedAt,
    Role,
}

#[derive(Debug, Deserialize)]
pub struct MemberListQuery {
    pub q: Option<String>,
    pub role: Option<MemberRole>,
    pub status: Option<MemberStatus>,
    pub department: Option<String>,
    pub sort: Option<MemberSortKey>,
    pub order: Option<SortDirection>,
    pub page: Option<usize>,
    pub per_page: Option<usize>,
    pub view: Option<ViewMode>,
}

#[derive(Debug, Deserialize)]
pub struct MemberActionRequest {
    pub action: MemberAction,
}

fn sort_value(member: &TeamMember, key: MemberSortKey) -> SortValue {
    match key {
        MemberSortKey::Name => SortValue::Text(member.name.clone()),
        MemberSortKey::JoinedAt => SortValue::Time(member.created_at),
        MemberSortKey::Role => SortValue::Text(role_label(member.role).to_string()),
    }
}

fn role_label(role: MemberRole) -> &'static str {
    match role {
        MemberRole::Admin => "admin",
        MemberRole::Manager => "manager",
        MemberRole::Member => "member",
        MemberRole::Viewer => "viewer",
    }
}

pub async fn list_members(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<MemberListQuery>,
) -> Json<Paged<MemberResponse>> {
    let start_time = Instant::now();

    let mut members: Vec<TeamMember> = state
        .store
        .list_members()
        .await
        .into_iter()
        .filter(|member| {
            text_match(
                &[&member.name, &member.email, &member.department],
                query.q.as_deref().unwrap_or(""),
            ) && category_match(&member.role, query.role.as_ref())
                && category_match(&member.status, query.status.as_ref())
                && query
                    .department
                    .as_ref()
                    .map(|d| member.department.eq_ignore_ascii_case(d))
                    .unwrap_or(true)
        })
        .collect();

    let sort = query.sort.unwrap_or_default();
    let order = query.order.unwrap_or_default();
    sort_records(&mut members, order, |member| sort_value(member, sort));

    let page_request = PageRequest::new(query.page, query.per_page);
    let view = query.view.unwrap_or_default();
    let paged = paginate(
        members.into_iter().map(MemberResponse::from).collect(),
        page_request,
        view,
    );

    LOGGER.log_collection_query(
        "team",
        &format!("{:?}", query),
        start_time.elapsed().as_millis(),
        Some(paged.items.len()),
    );
    LOGGER.log_request("GET", "/team", Some(auth_user.member_id), 200);

    Json(paged)
}

pub async fn get_member(
    State(state): State<AppState>,
    Extension(_auth_user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<MemberResponse>, AppError> {
    let member = state.store.get_member(id).await?;
    Ok(Json(MemberResponse::from(member)))
}

/// Invited members start Pending with no credentials; registering with the
/// invited email completes the account.
pub async fn invite_member(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(payload): Json<InviteMemberRequest>,
) -> Result<Json<MemberResponse>, AppError> {
    if !auth_user.can_manage() {
        return Err(AppError::Forbidden(
            "Only admins and managers can invite team members".to_string(),
        ));
    }
    payload.validate()?;

    let now = Utc::now();
    let member = TeamMember {
        id: Uuid::new_v4(),
        name: payload.name,
        email: payload.email,
        phone: None,
        role: payload.role,
        department: payload.department,
        status: MemberStatus::Pending,
        password_hash: None,
        created_at: now,
        updated_at: now,
    };

    let member = state.store.insert_member(member).await?;

    LOGGER.log_business_event(
        "member_invited",
        Some(auth_user.member_id),
        [(
            "invited_member_id".to_string(),
            serde_json::Value::String(member.id.to_string()),
        )]
        .iter()
        .cloned()
        .collect(),
    );

    Ok(Json(MemberResponse::from(member)))
}

pub async fn update_member(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateMemberRequest>,
) -> Result<Json<MemberResponse>, AppError> {
    if !auth_user.can_manage() {
        return Err(AppError::Forbidden(
            "Only admins and managers can edit team members".to_string(),
        ));
    }
    payload.validate()?;

    let member = state
        .store
        .update_member(id, |member| {
            if let Some(name) = payload.name {
                member.name = name;
            }
            if let Some(phone) = payload.phone {
                member.phone = Some(phone);
            }
            if let Some(role) = payload.role {
                member.role = role;
            }
            if let Some(department) = payload.department {
                member.department = department;
            }
            if let Some(status) = payload.status {
                member.status = status;
            }
        })
        .await?;

    Ok(Json(MemberResponse::from(member)))
}

/// Fire-and-forget member action; effect is visible on the next reload.
pub async fn dispatch_member_action(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<MemberActionRequest>,
) -> Result<StatusCode, AppError> {
    if !auth_user.can_manage() {
        return Err(AppError::Forbidden(
            "Only admins and managers can dispatch member actions".to_string(),
        ));
    }

    match payload.action {
        MemberAction::ResendInvite => {
            let member = state.store.get_member(id).await?;
            if member.status != MemberStatus::Pending {
                return Err(AppError::BadRequest(
                    "Only pending invitations can be resent".to_string(),
                ));
            }
            // Mail delivery is a stubbed boundary; the event log is the
            // observable effect.
            tracing::info!("Re-sent invitation to {}", member.email);
        }
        MemberAction::Deactivate => {
            state
                .store
                .update_member(id, |member| member.status = MemberStatus::Inactive)
                .await?;
        }
        MemberAction::Reactivate => {
            state
                .store
                .update_member(id, |member| member.status = MemberStatus::Active)
                .await?;
        }
    }

    LOGGER.log_business_event(
        "member_action_dispatched",
        Some(auth_user.member_id),
        [
            (
                "target_member_id".to_string(),
                serde_json::Value::String(id.to_string()),
            ),
            ("action".to_string(), serde_json::json!(payload.action)),
        ]
        .iter()
        .cloned()
        .collect(),
    );

    Ok(StatusCode::ACCEPTED)
}
