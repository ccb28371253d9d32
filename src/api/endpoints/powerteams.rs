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
    model::{apperror::ApplicationError, listing::ListQuery, powerteams::PowerTeamInput},
};

/**
 * Endpoint to retrieve a page of power teams.
 */
#[instrument(level = "info", skip(http_request, app_state, query, status), fields(service = "listPowerTeams", trace_id = get_trace_id(&http_request), result))]
#[get("/powerteams")]
pub async fn powerteam_list(
    http_request: HttpRequest,
    query: web::Query<ListQuery>,
    status: web::Query<StatusQuery>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let _ = app_state.jwt_service.validate(&http_request)?;
    let page = app_state.powerteam_service.get_powerteam_list(query.into_inner(), status.into_inner().status).instrument(span).await?;
    Ok(HttpResponse::Ok().json(page))
}

/**
 * Endpoint to retrieve one power team.
 */
#[instrument(skip(http_request, app_state), fields(service = "getPowerTeam", trace_id = get_trace_id(&http_request), result))]
#[get("/powerteams/{powerTeamId}")]
pub async fn powerteam_get(path: Path<i64>, http_request: HttpRequest, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let _ = app_state.jwt_service.validate(&http_request)?;
    let powerteam = app_state.powerteam_service.get_powerteam(path.into_inner()).instrument(span).await?;
    Ok(HttpResponse::Ok().json(powerteam))
}

/**
 * Endpoint to add a new power team.
 */
#[instrument(level = "info", skip(http_request, app_state, request_body), fields(service = "addPowerTeam", trace_id = get_trace_id(&http_request), result))]
#[post("/powerteams")]
pub async fn powerteam_add(http_request: HttpRequest, request_body: web::Json<PowerTeamInput>, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let _ = app_state.jwt_service.validate(&http_request)?;
    let powerteam = app_state.powerteam_service.add_powerteam(request_body.into_inner()).instrument(span).await?;
    Ok(HttpResponse::Created().json(powerteam))
}

/**
 * Endpoint to update a power team.
 */
#[instrument(skip(http_request, app_state, request_body), fields(service = "updatePowerTeam", trace_id = get_trace_id(&http_request), result))]
#[put("/powerteams/{powerTeamId}")]
pub async fn powerteam_update(
    path: Path<i64>,
    http_request: HttpRequest,
    request_body: web::Json<PowerTeamInput>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let _ = app_state.jwt_service.validate(&http_request)?;
    let powerteam = app_state.powerteam_service.update_powerteam(path.into_inner(), request_body.into_inner()).instrument(span).await?;
    Ok(HttpResponse::Ok().json(powerteam))
}

/**
 * Endpoint to delete a power team. Requires the confirm=true acknowledgement.
 */
#[instrument(skip(http_request, app_state), fields(service = "deletePowerTeam", trace_id = get_trace_id(&http_request), result))]
#[delete("/powerteams/{powerTeamId}")]
pub async fn powerteam_delete(
    path: Path<i64>,
    http_request: HttpRequest,
    confirm: web::Query<DeleteQuery>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let _ = app_state.jwt_service.validate(&http_request)?;
    confirm.require_confirmation()?;
    app_state.powerteam_service.delete_powerteam(path.into_inner()).instrument(span).await?;
    Ok(HttpResponse::NoContent().finish())
}
