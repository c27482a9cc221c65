use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{
        header::{COOKIE, SET_COOKIE},
        HeaderMap, HeaderValue,
    },
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use tracing::error;

use super::error::AppError;
use crate::actions::session::session_from_cookie_header;
use crate::actions::{
    ActionResult, HomeView, Interview, SessionOutcome, SignInParams, SignUpParams, User,
};
use crate::TalkBotix;

type AppState = State<Arc<TalkBotix>>;

#[derive(Deserialize)]
pub struct ResetPasswordRequest {
    email: String,
}

fn session_cookie(headers: &HeaderMap) -> Option<&str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find_map(session_from_cookie_header)
}

fn with_cookie(outcome: SessionOutcome) -> Response {
    let mut response = Json(outcome.result).into_response();

    if let Some(cookie) = outcome.cookie {
        match HeaderValue::from_str(&cookie.header_value()) {
            Ok(value) => {
                response.headers_mut().insert(SET_COOKIE, value);
            }
            Err(e) => error!(error = %e, "Session cookie is not a valid header value"),
        }
    }

    response
}

pub async fn sign_up_handler(
    State(app): AppState,
    payload: Result<Json<SignUpParams>, JsonRejection>,
) -> Result<Json<ActionResult>, AppError> {
    let Json(params) = payload?;
    Ok(Json(app.sign_up(params).await))
}

pub async fn sign_in_handler(
    State(app): AppState,
    payload: Result<Json<SignInParams>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(params) = payload?;
    Ok(with_cookie(app.sign_in(params).await))
}

pub async fn sign_out_handler(State(app): AppState) -> Response {
    with_cookie(app.sign_out())
}

pub async fn reset_password_handler(
    State(app): AppState,
    payload: Result<Json<ResetPasswordRequest>, JsonRejection>,
) -> Result<Json<ActionResult>, AppError> {
    let Json(request) = payload?;
    Ok(Json(app.reset_password(&request.email).await))
}

pub async fn me_handler(State(app): AppState, headers: HeaderMap) -> Json<Option<User>> {
    Json(app.get_current_user(session_cookie(&headers)).await)
}

pub async fn home_handler(State(app): AppState, headers: HeaderMap) -> Json<HomeView> {
    Json(app.home(session_cookie(&headers)).await)
}

pub async fn interview_handler(
    State(app): AppState,
    Path(id): Path<String>,
) -> Result<Json<Interview>, AppError> {
    app.get_interview_details_by_id(&id)
        .await
        .map(Json)
        .ok_or(AppError::NotFound("Interview"))
}
