use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// A team member doubles as the authenticated principal: invited members
/// start out Pending with no password hash until they register.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamMember {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: MemberRole,
    pub department: String,
    pub status: MemberStatus,
    #[serde(skip_serializing, default)]
    pub password_hash: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberRole {
    Admin,
    Manager,
    Member,
    Viewer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberStatus {
    Active,
    Pending,
    Inactive,
}

/// Closed set of list-item actions the dashboard can dispatch on a member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberAction {
    ResendInvite,
    Deactivate,
    Reactivate,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 6))]
    pub password: String,
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(length(min = 1))]
    pub department: String,
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct InviteMemberRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub name: String,
    pub role: MemberRole,
    #[validate(length(min = 1))]
    pub department: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateMemberRequest {
    #[validate(length(min = 1))]
    pub name: Option<String>,
    pub phone: Option<String>,
    pub role: Option<MemberRole>,
    #[validate(length(min = 1))]
    pub department: Option<String>,
    pub status: Option<MemberStatus>,
}

#[derive(Debug, Serialize)]
pub struct MemberResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: MemberRole,
    pub department: String,
    pub status: MemberStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub member: MemberResponse,
}

impl From<TeamMember> for MemberResponse {
    fn from(member: TeamMember) -> Self {
        Self {
            id: member.id,
            name: member.name,
            email: member.email,
            phone: member.phone,
            role: member.role,
            department: member.department,
            status: member.status,
            created_at: member.created_at,
            updated_at: member.updated_at,
        }
    }
}
