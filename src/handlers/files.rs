use axum::{
    body::Body,
    extract::{Extension, Path, Query, State},
    http::{header, StatusCode},
    response::Response,
};
use serde::Deserialize;
use std::path::PathBuf;
use tokio::fs;
use uuid::Uuid;

use crate::{
    middleware::auth::AuthUser, store::CollectionStore, utils::jwt::verify_jwt, AppState,
};

pub async fn serve_file(
    Extension(auth_user): Extension<AuthUser>,
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Response<Body>, StatusCode> {
    // Admins and managers can open any stored resume; everyone else only
    // the files they uploaded themselves.
    let can_access = if auth_user.can_manage() {
        true
    } else {
        check_file_ownership(&state.store, &filename, auth_user.member_id).await
    };

    if !can_access {
        return Err(StatusCode::FORBIDDEN);
    }

    read_stored_file(&state.upload_dir, &filename).await
}

#[derive(Deserialize)]
pub struct FileQuery {
    token: String,
}

/// Download variant for clients that cannot set an Authorization header;
/// the bearer token rides in the query string instead.
pub async fn serve_file_with_token(
    State(state): State<AppState>,
    Path(filename): Path<String>,
    Query(params): Query<FileQuery>,
) -> Result<Response<Body>, StatusCode> {
    let claims = verify_jwt(&params.token, &state.jwt_secret)
        .map_err(|_| StatusCode::UNAUTHORIZED)?;

    let can_access = if claims.role == "admin" || claims.role == "manager" {
        true
    } else {
        check_file_ownership(&state.store, &filename, claims.sub).await
    };

    if !can_access {
        return Err(StatusCode::FORBIDDEN);
    }

    read_stored_file(&state.upload_dir, &filename).await
}

async fn read_stored_file(upload_dir: &str, filename: &str) -> Result<Response<Body>, StatusCode> {
    // Stored names are uuid.ext; anything path-like is not ours.
    if filename.contains('/') || filename.contains('\\') || filename.contains("..") {
        return Err(StatusCode::FORBIDDEN);
    }

    let file_path = PathBuf::from(upload_dir).join(filename);
    if !file_path.exists() {
        return Err(StatusCode::NOT_FOUND);
    }

    let file_content = fs::read(&file_path)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let content_type = match file_path.extension().and_then(|ext| ext.to_str()) {
        Some("pdf") => "application/pdf",
        Some("doc") => "application/msword",
        Some("docx") => {
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
        }
        Some("txt") => "text/plain",
        Some("zip") => "application/zip",
        _ => "application/octet-stream",
    };

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_LENGTH, file_content.len())
        .body(Body::from(file_content))
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}

async fn check_file_ownership(
    store: &CollectionStore,
    filename: &str,
    member_id: Uuid,
) -> bool {
    store
        .list_resumes()
        .await
        .iter()
        .any(|resume| {
            resume.uploaded_by == member_id
                && resume.file_path.as_deref() == Some(filename)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn serves_a_stored_file_with_its_content_type() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::write(dir.path().join("abc.pdf"), b"%PDF-1.4")
            .await
            .unwrap();

        let response = read_stored_file(dir.path().to_str().unwrap(), "abc.pdf")
            .await
            .unwrap();
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/pdf"
        );
    }

    #[tokio::test]
    async fn path_like_names_are_forbidden() {
        let dir = tempfile::tempdir().unwrap();
        let result = read_stored_file(dir.path().to_str().unwrap(), "../secrets.txt").await;
        assert!(matches!(result, Err(StatusCode::FORBIDDEN)));
    }

    #[tokio::test]
    async fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let result = read_stored_file(dir.path().to_str().unwrap(), "nope.pdf").await;
        assert!(matches!(result, Err(StatusCode::NOT_FOUND)));
    }
}
