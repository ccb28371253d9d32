use actix_web::{
    HttpRequest, HttpResponse, delete, get, post, put,
    web::{self, Path},
};
use tracing::{Instrument, instrument};

use crate::{
    api::{
        endpoints::get_trace_id,
        rest::{DeleteQuery, StatusQuery},
        state::AppState,
    },
    model::{
        apperror::ApplicationError,
        listing::ListQuery,
        meetings::{ChapterMeetingInput, TrainingInput},
    },
};

/**
 * Endpoint to retrieve a page of chapter meetings.
 */
#[instrument(level = "info", skip(http_request, app_state, query, status), fields(service = "listChapterMeetings", trace_id = get_trace_id(&http_request), result))]
#[get("/chapter-meetings")]
pub async fn meeting_list(
    http_request: HttpRequest,
    query: web::Query<ListQuery>,
    status: web::Query<StatusQuery>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let _ = app_state.jwt_service.validate(&http_request)?;
    let page = app_state.meeting_service.get_meeting_list(query.into_inner(), status.into_inner().status).instrument(span).await?;
    Ok(HttpResponse::Ok().json(page))
}

/**
 * Endpoint to retrieve one chapter meeting.
 */
#[instrument(skip(http_request, app_state), fields(service = "getChapterMeeting", trace_id = get_trace_id(&http_request), result))]
#[get("/chapter-meetings/{meetingId}")]
pub async fn meeting_get(path: Path<i64>, http_request: HttpRequest, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let _ = app_state.jwt_service.validate(&http_request)?;
    let meeting = app_state.meeting_service.get_meeting(path.into_inner()).instrument(span).await?;
    Ok(HttpResponse::Ok().json(meeting))
}

/**
 * Endpoint to add a new chapter meeting.
 */
#[instrument(level = "info", skip(http_request, app_state, request_body), fields(service = "addChapterMeeting", trace_id = get_trace_id(&http_request), result))]
#[post("/chapter-meetings")]
pub async fn meeting_add(http_request: HttpRequest, request_body: web::Json<ChapterMeetingInput>, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let _ = app_state.jwt_service.validate(&http_request)?;
    let meeting = app_state.meeting_service.add_meeting(request_body.into_inner()).instrument(span).await?;
    Ok(HttpResponse::Created().json(meeting))
}

/**
 * Endpoint to update a chapter meeting.
 */
#[instrument(skip(http_request, app_state, request_body), fields(service = "updateChapterMeeting", trace_id = get_trace_id(&http_request), result))]
#[put("/chapter-meetings/{meetingId}")]
pub async fn meeting_update(
    path: Path<i64>,
    http_request: HttpRequest,
    request_body: web::Json<ChapterMeetingInput>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let _ = app_state.jwt_service.validate(&http_request)?;
    let meeting = app_state.meeting_service.update_meeting(path.into_inner(), request_body.into_inner()).instrument(span).await?;
    Ok(HttpResponse::Ok().json(meeting))
}

/**
 * Endpoint to delete a chapter meeting. Requires the confirm=true acknowledgement.
 */
#[instrument(skip(http_request, app_state), fields(service = "deleteChapterMeeting", trace_id = get_trace_id(&http_request), result))]
#[delete("/chapter-meetings/{meetingId}")]
pub async fn meeting_delete(
    path: Path<i64>,
    http_request: HttpRequest,
    confirm: web::Query<DeleteQuery>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let _ = app_state.jwt_service.validate(&http_request)?;
    confirm.require_confirmation()?;
    app_state.meeting_service.delete_meeting(path.into_inner()).instrument(span).await?;
    Ok(HttpResponse::NoContent().finish())
}

/**
 * Endpoint to retrieve a page of trainings.
 */
#[instrument(level = "info", skip(http_request, app_state, query, status), fields(service = "listTrainings", trace_id = get_trace_id(&http_request), result))]
#[get("/trainings")]
pub async fn training_list(
    http_request: HttpRequest,
    query: web::Query<ListQuery>,
    status: web::Query<StatusQuery>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let _ = app_state.jwt_service.validate(&http_request)?;
    let page = app_state.meeting_service.get_training_list(query.into_inner(), status.into_inner().status).instrument(span).await?;
    Ok(HttpResponse::Ok().json(page))
}

/**
 * Endpoint to retrieve one training.
 */
#[instrument(skip(http_request, app_state), fields(service = "getTraining", trace_id = get_trace_id(&http_request), result))]
#[get("/trainings/{trainingId}")]
pub async fn training_get(path: Path<i64>, http_request: HttpRequest, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let _ = app_state.jwt_service.validate(&http_request)?;
    let training = app_state.meeting_service.get_training(path.into_inner()).instrument(span).await?;
    Ok(HttpResponse::Ok().json(training))
}

/**
 * Endpoint to add a new training.
 */
#[instrument(level = "info", skip(http_request, app_state, request_body), fields(service = "addTraining", trace_id = get_trace_id(&http_request), result))]
#[post("/trainings")]
pub async fn training_add(http_request: HttpRequest, request_body: web::Json<TrainingInput>, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let _ = app_state.jwt_service.validate(&http_request)?;
    let training = app_state.meeting_service.add_training(request_body.into_inner()).instrument(span).await?;
    Ok(HttpResponse::Created().json(training))
}

/**
 * Endpoint to update a training.
 */
#[instrument(skip(http_request, app_state, request_body), fields(service = "updateTraining", trace_id = get_trace_id(&http_request), result))]
#[put("/trainings/{trainingId}")]
pub async fn training_update(
    path: Path<i64>,
    http_request: HttpRequest,
    request_body: web::Json<TrainingInput>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let _ = app_state.jwt_service.validate(&http_request)?;
    let training = app_state.meeting_service.update_training(path.into_inner(), request_body.into_inner()).instrument(span).await?;
    Ok(HttpResponse::Ok().json(training))
}

/**
 * Endpoint to delete a training. Requires the confirm=true acknowledgement.
 */
#[instrument(skip(http_request, app_state), fields(service = "deleteTraining", trace_id = get_trace_id(&http_request), result))]
#[delete("/trainings/{trainingId}")]
pub async fn training_delete(
    path: Path<i64>,
    http_request: HttpRequest,
    confirm: web::Query<DeleteQuery>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let _ = app_state.jwt_service.validate(&http_request)?;
    confirm.require_confirmation()?;
    app_state.meeting_service.delete_training(path.into_inner()).instrument(span).await?;
    Ok(HttpResponse::NoContent().finish())
}
