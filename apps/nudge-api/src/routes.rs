use axum::{
	Json, Router,
	extract::{Path, Query, State},
	http::{HeaderMap, StatusCode},
	response::{IntoResponse, Response},
	routing::{get, post, put},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::state::AppState;
use nudge_service::{
	CreateTaskRequest, LabelResponse, LabelingContext, LabelingStatusReport, RecommendRequest,
	RecommendResponse, ServiceError, TaskListRequest, TaskListResponse, TaskResponse,
	UpdateLabelRequest, UpdateTaskRequest,
};

/// The authentication layer in front of this service resolves the caller and
/// forwards their identity in this header; every handler scopes its queries
/// with it.
const USER_ID_HEADER: &str = "x-user-id";

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/v1/tasks", post(create_task).get(list_tasks))
		.route("/v1/tasks/{task_id}", get(get_task).put(update_task).delete(delete_task))
		.route("/v1/tasks/{task_id}/labels", get(task_labels))
		.route("/v1/tasks/{task_id}/labels/primary", get(task_primary_labels))
		.route("/v1/tasks/{task_id}/labeling", get(labeling_status))
		.route("/v1/tasks/{task_id}/relabel", post(relabel_task))
		.route("/v1/labels/{label_id}", put(update_label).delete(delete_label))
		.route("/v1/recommendations", post(recommend))
		.with_state(state)
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn create_task(
	State(state): State<AppState>,
	headers: HeaderMap,
	Json(payload): Json<CreateTaskRequest>,
) -> Result<(StatusCode, Json<TaskResponse>), ApiError> {
	let user_id = user_id_from_headers(&headers)?;
	let write = state.service.create_task(user_id, payload).await?;

	dispatch_labeling(&state, user_id, write.task.task_id);

	Ok((StatusCode::CREATED, Json(write.task)))
}

async fn list_tasks(
	State(state): State<AppState>,
	headers: HeaderMap,
	Query(query): Query<TaskListRequest>,
) -> Result<Json<TaskListResponse>, ApiError> {
	let user_id = user_id_from_headers(&headers)?;
	let response = state.service.list_tasks(user_id, query).await?;

	Ok(Json(response))
}

async fn get_task(
	State(state): State<AppState>,
	headers: HeaderMap,
	Path(task_id): Path<Uuid>,
) -> Result<Json<TaskResponse>, ApiError> {
	let user_id = user_id_from_headers(&headers)?;
	let response = state.service.get_task(user_id, task_id).await?;

	Ok(Json(response))
}

async fn update_task(
	State(state): State<AppState>,
	headers: HeaderMap,
	Path(task_id): Path<Uuid>,
	Json(payload): Json<UpdateTaskRequest>,
) -> Result<Json<TaskResponse>, ApiError> {
	let user_id = user_id_from_headers(&headers)?;
	let write = state.service.update_task(user_id, task_id, payload).await?;

	if write.relabel {
		dispatch_labeling(&state, user_id, task_id);
	}

	Ok(Json(write.task))
}

#[derive(Debug, Deserialize)]
struct DeleteTaskQuery {
	#[serde(default)]
	hard_delete: bool,
}

async fn delete_task(
	State(state): State<AppState>,
	headers: HeaderMap,
	Path(task_id): Path<Uuid>,
	Query(query): Query<DeleteTaskQuery>,
) -> Result<StatusCode, ApiError> {
	let user_id = user_id_from_headers(&headers)?;

	state.service.delete_task(user_id, task_id, query.hard_delete).await?;

	Ok(StatusCode::NO_CONTENT)
}

async fn task_labels(
	State(state): State<AppState>,
	headers: HeaderMap,
	Path(task_id): Path<Uuid>,
) -> Result<Json<Vec<LabelResponse>>, ApiError> {
	let user_id = user_id_from_headers(&headers)?;
	let labels = state.service.task_labels(user_id, task_id, false).await?;

	Ok(Json(labels))
}

async fn task_primary_labels(
	State(state): State<AppState>,
	headers: HeaderMap,
	Path(task_id): Path<Uuid>,
) -> Result<Json<Vec<LabelResponse>>, ApiError> {
	let user_id = user_id_from_headers(&headers)?;
	let labels = state.service.task_labels(user_id, task_id, true).await?;

	Ok(Json(labels))
}

async fn labeling_status(
	State(state): State<AppState>,
	headers: HeaderMap,
	Path(task_id): Path<Uuid>,
) -> Result<Json<LabelingStatusReport>, ApiError> {
	let user_id = user_id_from_headers(&headers)?;
	let report = state.service.labeling_status(user_id, task_id).await?;

	Ok(Json(report))
}

#[derive(Debug, Serialize)]
struct RelabelAccepted {
	message: &'static str,
	task_id: Uuid,
}

async fn relabel_task(
	State(state): State<AppState>,
	headers: HeaderMap,
	Path(task_id): Path<Uuid>,
	payload: Option<Json<LabelingContext>>,
) -> Result<(StatusCode, Json<RelabelAccepted>), ApiError> {
	let user_id = user_id_from_headers(&headers)?;

	// Reject unknown tasks up front; the run itself is fire-and-forget.
	state.service.get_task(user_id, task_id).await?;

	let context = payload.map(|Json(context)| context);
	let service = state.service.clone();

	tokio::spawn(async move {
		service.run_labeling(user_id, task_id, context).await;
	});

	Ok((
		StatusCode::ACCEPTED,
		Json(RelabelAccepted { message: "Re-labeling triggered", task_id }),
	))
}

async fn update_label(
	State(state): State<AppState>,
	headers: HeaderMap,
	Path(label_id): Path<Uuid>,
	Json(payload): Json<UpdateLabelRequest>,
) -> Result<Json<LabelResponse>, ApiError> {
	let user_id = user_id_from_headers(&headers)?;
	let label = state.service.update_label(user_id, label_id, payload).await?;

	Ok(Json(label))
}

async fn delete_label(
	State(state): State<AppState>,
	headers: HeaderMap,
	Path(label_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
	let user_id = user_id_from_headers(&headers)?;

	state.service.delete_label(user_id, label_id).await?;

	Ok(StatusCode::NO_CONTENT)
}

async fn recommend(
	State(state): State<AppState>,
	headers: HeaderMap,
	Json(payload): Json<RecommendRequest>,
) -> Result<Json<RecommendResponse>, ApiError> {
	let user_id = user_id_from_headers(&headers)?;
	let response = state.service.recommend(user_id, payload).await?;

	Ok(Json(response))
}

/// Labeling runs are independent fire-and-forget units, one per task
/// mutation; nothing awaits them and nothing orders them across tasks.
fn dispatch_labeling(state: &AppState, user_id: Uuid, task_id: Uuid) {
	let service = state.service.clone();

	tokio::spawn(async move {
		service.run_labeling(user_id, task_id, None).await;
	});
}

fn user_id_from_headers(headers: &HeaderMap) -> Result<Uuid, ApiError> {
	let raw = headers
		.get(USER_ID_HEADER)
		.and_then(|value| value.to_str().ok())
		.ok_or_else(|| {
			ApiError::new(
				StatusCode::UNAUTHORIZED,
				"missing_user",
				format!("The {USER_ID_HEADER} header is required."),
			)
		})?;

	raw.parse().map_err(|_| {
		ApiError::new(
			StatusCode::UNAUTHORIZED,
			"invalid_user",
			format!("The {USER_ID_HEADER} header must be a UUID."),
		)
	})
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: String,
	message: String,
}
impl ApiError {
	fn new(status: StatusCode, error_code: impl Into<String>, message: impl Into<String>) -> Self {
		Self { status, error_code: error_code.into(), message: message.into() }
	}
}
impl From<ServiceError> for ApiError {
	fn from(err: ServiceError) -> Self {
		let message = err.to_string();

		match err {
			ServiceError::NotFound { .. } =>
				Self::new(StatusCode::NOT_FOUND, "not_found", message),
			ServiceError::InvalidRequest { .. } | ServiceError::Validation { .. } =>
				Self::new(StatusCode::BAD_REQUEST, "invalid_request", message),
			ServiceError::Provider { .. } =>
				Self::new(StatusCode::BAD_GATEWAY, "provider_error", message),
			ServiceError::Storage { .. } | ServiceError::Vector { .. } =>
				Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", message),
		}
	}
}
impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body = ErrorBody { error_code: self.error_code, message: self.message };

		(self.status, Json(body)).into_response()
	}
}
