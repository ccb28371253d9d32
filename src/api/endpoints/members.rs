use actix_web::{
    HttpRequest, HttpResponse, delete, get, patch, post, put,
    web::{self, Path},
};
use serde::Deserialize;
use tracing::{Instrument, instrument};

use crate::{
    api::{endpoints::get_trace_id, rest::DeleteQuery, state::AppState},
    model::{
        apperror::ApplicationError,
        listing::ListQuery,
        members::{MemberInput, MemberStatusInput},
    },
};

/**
 * Filters for the member list.
 */
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberFilterQuery {
    pub status: Option<String>,
    pub account_type: Option<String>,
    pub chapter_id: Option<i64>,
}

/**
 * Endpoint to retrieve a page of members.
 */
#[instrument(level = "info", skip(http_request, app_state, query, filter), fields(service = "listMembers", trace_id = get_trace_id(&http_request), result))]
#[get("/members")]
pub async fn member_list(
    http_request: HttpRequest,
    query: web::Query<ListQuery>,
    filter: web::Query<MemberFilterQuery>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let _ = app_state.jwt_service.validate(&http_request)?;
    let filter = filter.into_inner();
    let page = app_state.member_service.get_member_list(query.into_inner(), filter.status, filter.account_type, filter.chapter_id).instrument(span).await?;
    Ok(HttpResponse::Ok().json(page))
}

/**
 * Endpoint to retrieve one member.
 */
#[instrument(skip(http_request, app_state), fields(service = "getMember", trace_id = get_trace_id(&http_request), result))]
#[get("/members/{memberId}")]
pub async fn member_get(path: Path<i64>, http_request: HttpRequest, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let _ = app_state.jwt_service.validate(&http_request)?;
    let member = app_state.member_service.get_member(path.into_inner()).instrument(span).await?;
    Ok(HttpResponse::Ok().json(member))
}

/**
 * Endpoint to add a new member.
 */
#[instrument(level = "info", skip(http_request, app_state, request_body), fields(service = "addMember", trace_id = get_trace_id(&http_request), result))]
#[post("/members")]
pub async fn member_add(http_request: HttpRequest, request_body: web::Json<MemberInput>, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let _ = app_state.jwt_service.validate(&http_request)?;
    let member = app_state.member_service.add_member(request_body.into_inner()).instrument(span).await?;
    Ok(HttpResponse::Created().json(member))
}

/**
 * Endpoint to update a member.
 */
#[instrument(skip(http_request, app_state, request_body), fields(service = "updateMember", trace_id = get_trace_id(&http_request), result))]
#[put("/members/{memberId}")]
pub async fn member_update(
    path: Path<i64>,
    http_request: HttpRequest,
    request_body: web::Json<MemberInput>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let _ = app_state.jwt_service.validate(&http_request)?;
    let member = app_state.member_service.update_member(path.into_inner(), request_body.into_inner()).instrument(span).await?;
    Ok(HttpResponse::Ok().json(member))
}

/**
 * Endpoint to flip a member's active/inactive status. Admin only.
 */
#[instrument(skip(http_request, app_state, request_body), fields(service = "updateMemberStatus", trace_id = get_trace_id(&http_request), result))]
#[patch("/members/{memberId}/user-status")]
pub async fn member_status_update(
    path: Path<i64>,
    http_request: HttpRequest,
    request_body: web::Json<MemberStatusInput>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let session = app_state.jwt_service.validate(&http_request)?;
    let member = app_state.member_service.update_member_status(&session, path.into_inner(), request_body.into_inner()).instrument(span).await?;
    Ok(HttpResponse::Ok().json(member))
}

/**
 * Endpoint to delete a member. Requires the confirm=true acknowledgement.
 */
#[instrument(skip(http_request, app_state), fields(service = "deleteMember", trace_id = get_trace_id(&http_request), result))]
#[delete("/members/{memberId}")]
pub async fn member_delete(
    path: Path<i64>,
    http_request: HttpRequest,
    confirm: web::Query<DeleteQuery>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let _ = app_state.jwt_service.validate(&http_request)?;
    confirm.require_confirmation()?;
    app_state.member_service.delete_member(path.into_inner()).instrument(span).await?;
    Ok(HttpResponse::NoContent().finish())
}
