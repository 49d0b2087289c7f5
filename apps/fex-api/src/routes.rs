use axum::{
	Json, Router,
	extract::{State, rejection::JsonRejection},
	http::StatusCode,
	response::{IntoResponse, Response},
	routing::{get, post},
};
use serde::Serialize;

use fex_service::{Error as ServiceError, SearchRequest, SearchResponse};
use fex_storage::models::CompanyStats;

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/v1/companies/search", post(search))
		.route("/v1/companies/stats", get(stats))
		.with_state(state)
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn search(
	State(state): State<AppState>,
	payload: Result<Json<SearchRequest>, JsonRejection>,
) -> Result<Json<SearchResponse>, ApiError> {
	let Json(payload) = payload.map_err(|err| {
		json_error(StatusCode::BAD_REQUEST, "INVALID_REQUEST", err.body_text(), None)
	})?;
	let response = state.service.search(payload).await?;

	Ok(Json(response))
}

async fn stats(State(state): State<AppState>) -> Result<Json<CompanyStats>, ApiError> {
	let response = state.service.stats().await?;

	Ok(Json(response))
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
	fields: Option<Vec<String>>,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: String,
	message: String,
	fields: Option<Vec<String>>,
}
impl ApiError {
	fn new(
		status: StatusCode,
		error_code: impl Into<String>,
		message: impl Into<String>,
		fields: Option<Vec<String>>,
	) -> Self {
		Self { status, error_code: error_code.into(), message: message.into(), fields }
	}
}
impl From<ServiceError> for ApiError {
	fn from(err: ServiceError) -> Self {
		match err {
			ServiceError::InvalidRequest { message } => json_error(
				StatusCode::BAD_REQUEST,
				"INVALID_REQUEST",
				message,
				Some(vec!["$.query".to_string()]),
			),
			ServiceError::Provider { message } => {
				tracing::error!(error = %message, "Provider error escaped the service.");

				json_error(
					StatusCode::BAD_GATEWAY,
					"PROVIDER_UNAVAILABLE",
					"An upstream provider is unavailable.",
					None,
				)
			},
			ServiceError::Storage { message } | ServiceError::Unavailable { message } => {
				tracing::warn!(error = %message, "Company store is unavailable.");

				json_error(
					StatusCode::SERVICE_UNAVAILABLE,
					"STORAGE_UNAVAILABLE",
					"Company data is temporarily unavailable.",
					None,
				)
			},
		}
	}
}
impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body =
			ErrorBody { error_code: self.error_code, message: self.message, fields: self.fields };

		(self.status, Json(body)).into_response()
	}
}

pub fn json_error(
	status: StatusCode,
	code: &str,
	message: impl Into<String>,
	fields: Option<Vec<String>>,
) -> ApiError {
	ApiError::new(status, code, message, fields)
}
