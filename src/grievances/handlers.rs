use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::header,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use serde_json::{json, Value};
use tracing::instrument;

use crate::{
    error::ApiError,
    grievances::{dto::GrievanceUpdate, service::GrievanceSubmission},
    state::AppState,
    store::{Attachment, Grievance},
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/add",
            post(add_grievance).layer(DefaultBodyLimit::max(10 * 1024 * 1024)),
        )
        .route("/getAll", get(get_all))
        .route("/update/:id", put(update_grievance))
        .route("/download/:id", get(download))
}

/// POST /add (multipart): description, category, userId, userName,
/// optional title and file.
#[instrument(skip(state, multipart))]
async fn add_grievance(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let mut description = None;
    let mut category = None;
    let mut user_id = None;
    let mut user_name = None;
    let mut title = None;
    let mut attachment = None;

    while let Some(field) = multipart.next_field().await.map_err(bad_request)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "description" => description = Some(field.text().await.map_err(bad_request)?),
            "category" => category = Some(field.text().await.map_err(bad_request)?),
            "userId" => user_id = Some(field.text().await.map_err(bad_request)?),
            "userName" => user_name = Some(field.text().await.map_err(bad_request)?),
            "title" => title = Some(field.text().await.map_err(bad_request)?),
            "file" => {
                let file_name = field.file_name().unwrap_or("attachment").to_string();
                let file_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field.bytes().await.map_err(bad_request)?;
                attachment = Some(Attachment {
                    file_name,
                    file_type,
                    data: data.to_vec(),
                });
            }
            _ => {}
        }
    }

    let submission = GrievanceSubmission {
        description: required("description", description)?,
        category: required("category", category)?,
        user_id: required("userId", user_id)?,
        user_name: required("userName", user_name)?,
        title,
        attachment,
    };
    state.grievances.submit(submission).await?;
    Ok(Json(json!({ "message": "Grievance submitted successfully" })))
}

#[instrument(skip(state))]
async fn get_all(State(state): State<AppState>) -> Result<Json<Vec<Grievance>>, ApiError> {
    Ok(Json(state.grievances.list().await?))
}

#[instrument(skip(state, payload))]
async fn update_grievance(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<GrievanceUpdate>,
) -> Result<Json<Grievance>, ApiError> {
    Ok(Json(state.grievances.update(id, payload).await?))
}

#[instrument(skip(state))]
async fn download(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let attachment = state.grievances.attachment(id).await?;
    let headers = [
        (header::CONTENT_TYPE, attachment.file_type),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", attachment.file_name),
        ),
    ];
    Ok((headers, attachment.data))
}

fn bad_request<E: std::fmt::Display>(err: E) -> ApiError {
    ApiError::BadRequest(err.to_string())
}

fn required(name: &str, value: Option<String>) -> Result<String, ApiError> {
    value.ok_or_else(|| ApiError::BadRequest(format!("missing form field: {name}")))
}
