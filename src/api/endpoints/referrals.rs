use actix_web::{
    HttpRequest, HttpResponse, delete, get, patch, post, put,
    web::{self, Path},
};
use serde::Deserialize;
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
        referrals::{ReferenceInput, ReferenceStatusInput, RequirementInput, ThankYouSlipInput},
    },
};

/**
 * Filters for the thank-you slip list.
 */
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlipFilterQuery {
    pub giver_id: Option<i64>,
    pub receiver_id: Option<i64>,
}

/**
 * Filters for the requirement list.
 */
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequirementFilterQuery {
    pub member_id: Option<i64>,
    pub status: Option<String>,
    pub urgency: Option<String>,
}

/**
 * Endpoint to retrieve a page of references.
 */
#[instrument(level = "info", skip(http_request, app_state, query, status), fields(service = "listReferences", trace_id = get_trace_id(&http_request), result))]
#[get("/references")]
pub async fn reference_list(
    http_request: HttpRequest,
    query: web::Query<ListQuery>,
    status: web::Query<StatusQuery>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let _ = app_state.jwt_service.validate(&http_request)?;
    let page = app_state.referral_service.get_reference_list(query.into_inner(), None, None, status.into_inner().status).instrument(span).await?;
    Ok(HttpResponse::Ok().json(page))
}

/**
 * Endpoint to retrieve the references given by the caller.
 */
#[instrument(level = "info", skip(http_request, app_state, query, status), fields(service = "listGivenReferences", trace_id = get_trace_id(&http_request), result))]
#[get("/references/given")]
pub async fn reference_given_list(
    http_request: HttpRequest,
    query: web::Query<ListQuery>,
    status: web::Query<StatusQuery>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let session = app_state.jwt_service.validate(&http_request)?;
    let page = app_state
        .referral_service
        .get_reference_list(query.into_inner(), Some(session.member_id), None, status.into_inner().status)
        .instrument(span)
        .await?;
    Ok(HttpResponse::Ok().json(page))
}

/**
 * Endpoint to retrieve the references received by the caller.
 */
#[instrument(level = "info", skip(http_request, app_state, query, status), fields(service = "listReceivedReferences", trace_id = get_trace_id(&http_request), result))]
#[get("/references/received")]
pub async fn reference_received_list(
    http_request: HttpRequest,
    query: web::Query<ListQuery>,
    status: web::Query<StatusQuery>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let session = app_state.jwt_service.validate(&http_request)?;
    let page = app_state
        .referral_service
        .get_reference_list(query.into_inner(), None, Some(session.member_id), status.into_inner().status)
        .instrument(span)
        .await?;
    Ok(HttpResponse::Ok().json(page))
}

/**
 * Endpoint to retrieve one reference with its status history.
 */
#[instrument(skip(http_request, app_state), fields(service = "getReference", trace_id = get_trace_id(&http_request), result))]
#[get("/references/{referenceId}")]
pub async fn reference_get(path: Path<i64>, http_request: HttpRequest, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let _ = app_state.jwt_service.validate(&http_request)?;
    let reference = app_state.referral_service.get_reference(path.into_inner()).instrument(span).await?;
    Ok(HttpResponse::Ok().json(reference))
}

/**
 * Endpoint to give a new reference.
 */
#[instrument(level = "info", skip(http_request, app_state, request_body), fields(service = "addReference", trace_id = get_trace_id(&http_request), result))]
#[post("/references")]
pub async fn reference_add(http_request: HttpRequest, request_body: web::Json<ReferenceInput>, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let session = app_state.jwt_service.validate(&http_request)?;
    let reference = app_state.referral_service.add_reference(&session, request_body.into_inner()).instrument(span).await?;
    Ok(HttpResponse::Created().json(reference))
}

/**
 * Endpoint to update a reference's editable fields.
 */
#[instrument(skip(http_request, app_state, request_body), fields(service = "updateReference", trace_id = get_trace_id(&http_request), result))]
#[put("/references/{referenceId}")]
pub async fn reference_update(
    path: Path<i64>,
    http_request: HttpRequest,
    request_body: web::Json<ReferenceInput>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let session = app_state.jwt_service.validate(&http_request)?;
    let reference = app_state.referral_service.update_reference(&session, path.into_inner(), request_body.into_inner()).instrument(span).await?;
    Ok(HttpResponse::Ok().json(reference))
}

/**
 * Endpoint for the receiver to move a reference through its lifecycle.
 */
#[instrument(skip(http_request, app_state, request_body), fields(service = "updateReferenceStatus", trace_id = get_trace_id(&http_request), result))]
#[patch("/references/{referenceId}/status")]
pub async fn reference_status_update(
    path: Path<i64>,
    http_request: HttpRequest,
    request_body: web::Json<ReferenceStatusInput>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let session = app_state.jwt_service.validate(&http_request)?;
    let reference = app_state.referral_service.transition_reference_status(&session, path.into_inner(), request_body.into_inner()).instrument(span).await?;
    Ok(HttpResponse::Ok().json(reference))
}

/**
 * Endpoint to delete a reference. Requires the confirm=true acknowledgement.
 */
#[instrument(skip(http_request, app_state), fields(service = "deleteReference", trace_id = get_trace_id(&http_request), result))]
#[delete("/references/{referenceId}")]
pub async fn reference_delete(
    path: Path<i64>,
    http_request: HttpRequest,
    confirm: web::Query<DeleteQuery>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let session = app_state.jwt_service.validate(&http_request)?;
    confirm.require_confirmation()?;
    app_state.referral_service.delete_reference(&session, path.into_inner()).instrument(span).await?;
    Ok(HttpResponse::NoContent().finish())
}

/**
 * Endpoint to retrieve a page of thank-you slips.
 */
#[instrument(level = "info", skip(http_request, app_state, query, filter), fields(service = "listThankYouSlips", trace_id = get_trace_id(&http_request), result))]
#[get("/thankyou-slips")]
pub async fn slip_list(
    http_request: HttpRequest,
    query: web::Query<ListQuery>,
    filter: web::Query<SlipFilterQuery>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let _ = app_state.jwt_service.validate(&http_request)?;
    let filter = filter.into_inner();
    let page = app_state.referral_service.get_slip_list(query.into_inner(), filter.giver_id, filter.receiver_id).instrument(span).await?;
    Ok(HttpResponse::Ok().json(page))
}

/**
 * Endpoint to retrieve one thank-you slip.
 */
#[instrument(skip(http_request, app_state), fields(service = "getThankYouSlip", trace_id = get_trace_id(&http_request), result))]
#[get("/thankyou-slips/{slipId}")]
pub async fn slip_get(path: Path<i64>, http_request: HttpRequest, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let _ = app_state.jwt_service.validate(&http_request)?;
    let slip = app_state.referral_service.get_slip(path.into_inner()).instrument(span).await?;
    Ok(HttpResponse::Ok().json(slip))
}

/**
 * Endpoint to give a new thank-you slip.
 */
#[instrument(level = "info", skip(http_request, app_state, request_body), fields(service = "addThankYouSlip", trace_id = get_trace_id(&http_request), result))]
#[post("/thankyou-slips")]
pub async fn slip_add(http_request: HttpRequest, request_body: web::Json<ThankYouSlipInput>, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let session = app_state.jwt_service.validate(&http_request)?;
    let slip = app_state.referral_service.add_slip(&session, request_body.into_inner()).instrument(span).await?;
    Ok(HttpResponse::Created().json(slip))
}

/**
 * Endpoint to update a thank-you slip.
 */
#[instrument(skip(http_request, app_state, request_body), fields(service = "updateThankYouSlip", trace_id = get_trace_id(&http_request), result))]
#[put("/thankyou-slips/{slipId}")]
pub async fn slip_update(
    path: Path<i64>,
    http_request: HttpRequest,
    request_body: web::Json<ThankYouSlipInput>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let session = app_state.jwt_service.validate(&http_request)?;
    let slip = app_state.referral_service.update_slip(&session, path.into_inner(), request_body.into_inner()).instrument(span).await?;
    Ok(HttpResponse::Ok().json(slip))
}

/**
 * Endpoint to delete a thank-you slip. Requires the confirm=true acknowledgement.
 */
#[instrument(skip(http_request, app_state), fields(service = "deleteThankYouSlip", trace_id = get_trace_id(&http_request), result))]
#[delete("/thankyou-slips/{slipId}")]
pub async fn slip_delete(
    path: Path<i64>,
    http_request: HttpRequest,
    confirm: web::Query<DeleteQuery>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let session = app_state.jwt_service.validate(&http_request)?;
    confirm.require_confirmation()?;
    app_state.referral_service.delete_slip(&session, path.into_inner()).instrument(span).await?;
    Ok(HttpResponse::NoContent().finish())
}

/**
 * Endpoint to retrieve a page of requirements.
 */
#[instrument(level = "info", skip(http_request, app_state, query, filter), fields(service = "listRequirements", trace_id = get_trace_id(&http_request), result))]
#[get("/requirements")]
pub async fn requirement_list(
    http_request: HttpRequest,
    query: web::Query<ListQuery>,
    filter: web::Query<RequirementFilterQuery>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let _ = app_state.jwt_service.validate(&http_request)?;
    let filter = filter.into_inner();
    let page = app_state.referral_service.get_requirement_list(query.into_inner(), filter.member_id, filter.status, filter.urgency).instrument(span).await?;
    Ok(HttpResponse::Ok().json(page))
}

/**
 * Endpoint to retrieve one requirement.
 */
#[instrument(skip(http_request, app_state), fields(service = "getRequirement", trace_id = get_trace_id(&http_request), result))]
#[get("/requirements/{requirementId}")]
pub async fn requirement_get(path: Path<i64>, http_request: HttpRequest, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let _ = app_state.jwt_service.validate(&http_request)?;
    let requirement = app_state.referral_service.get_requirement(path.into_inner()).instrument(span).await?;
    Ok(HttpResponse::Ok().json(requirement))
}

/**
 * Endpoint to raise a new requirement.
 */
#[instrument(level = "info", skip(http_request, app_state, request_body), fields(service = "addRequirement", trace_id = get_trace_id(&http_request), result))]
#[post("/requirements")]
pub async fn requirement_add(http_request: HttpRequest, request_body: web::Json<RequirementInput>, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let session = app_state.jwt_service.validate(&http_request)?;
    let requirement = app_state.referral_service.add_requirement(&session, request_body.into_inner()).instrument(span).await?;
    Ok(HttpResponse::Created().json(requirement))
}

/**
 * Endpoint to update a requirement.
 */
#[instrument(skip(http_request, app_state, request_body), fields(service = "updateRequirement", trace_id = get_trace_id(&http_request), result))]
#[put("/requirements/{requirementId}")]
pub async fn requirement_update(
    path: Path<i64>,
    http_request: HttpRequest,
    request_body: web::Json<RequirementInput>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let session = app_state.jwt_service.validate(&http_request)?;
    let requirement = app_state.referral_service.update_requirement(&session, path.into_inner(), request_body.into_inner()).instrument(span).await?;
    Ok(HttpResponse::Ok().json(requirement))
}

/**
 * Endpoint to delete a requirement. Requires the confirm=true acknowledgement.
 */
#[instrument(skip(http_request, app_state), fields(service = "deleteRequirement", trace_id = get_trace_id(&http_request), result))]
#[delete("/requirements/{requirementId}")]
pub async fn requirement_delete(
    path: Path<i64>,
    http_request: HttpRequest,
    confirm: web::Query<DeleteQuery>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let session = app_state.jwt_service.validate(&http_request)?;
    confirm.require_confirmation()?;
    app_state.referral_service.delete_requirement(&session, path.into_inner()).instrument(span).await?;
    Ok(HttpResponse::NoContent().finish())
}
