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
    model::{apperror::ApplicationError, listing::ListQuery, packages::PackageInput},
};

/**
 * Endpoint to retrieve a page of packages.
 */
#[instrument(level = "info", skip(http_request, app_state, query, status), fields(service = "listPackages", trace_id = get_trace_id(&http_request), result))]
#[get("/packages")]
pub async fn package_list(
    http_request: HttpRequest,
    query: web::Query<ListQuery>,
    status: web::Query<StatusQuery>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let _ = app_state.jwt_service.validate(&http_request)?;
    let page = app_state.package_service.get_package_list(query.into_inner(), status.into_inner().status).instrument(span).await?;
    Ok(HttpResponse::Ok().json(page))
}

/**
 * Endpoint to retrieve one package.
 */
#[instrument(skip(http_request, app_state), fields(service = "getPackage", trace_id = get_trace_id(&http_request), result))]
#[get("/packages/{packageId}")]
pub async fn package_get(path: Path<i64>, http_request: HttpRequest, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let _ = app_state.jwt_service.validate(&http_request)?;
    let package = app_state.package_service.get_package(path.into_inner()).instrument(span).await?;
    Ok(HttpResponse::Ok().json(package))
}

/**
 * Endpoint to add a new package.
 */
#[instrument(level = "info", skip(http_request, app_state, request_body), fields(service = "addPackage", trace_id = get_trace_id(&http_request), result))]
#[post("/packages")]
pub async fn package_add(http_request: HttpRequest, request_body: web::Json<PackageInput>, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let _ = app_state.jwt_service.validate(&http_request)?;
    let package = app_state.package_service.add_package(request_body.into_inner()).instrument(span).await?;
    Ok(HttpResponse::Created().json(package))
}

/**
 * Endpoint to update a package.
 */
#[instrument(skip(http_request, app_state, request_body), fields(service = "updatePackage", trace_id = get_trace_id(&http_request), result))]
#[put("/packages/{packageId}")]
pub async fn package_update(
    path: Path<i64>,
    http_request: HttpRequest,
    request_body: web::Json<PackageInput>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let _ = app_state.jwt_service.validate(&http_request)?;
    let package = app_state.package_service.update_package(path.into_inner(), request_body.into_inner()).instrument(span).await?;
    Ok(HttpResponse::Ok().json(package))
}

/**
 * Endpoint to delete a package. Requires the confirm=true acknowledgement.
 */
#[instrument(skip(http_request, app_state), fields(service = "deletePackage", trace_id = get_trace_id(&http_request), result))]
#[delete("/packages/{packageId}")]
pub async fn package_delete(
    path: Path<i64>,
    http_request: HttpRequest,
    confirm: web::Query<DeleteQuery>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let _ = app_state.jwt_service.validate(&http_request)?;
    confirm.require_confirmation()?;
    app_state.package_service.delete_package(path.into_inner()).instrument(span).await?;
    Ok(HttpResponse::NoContent().finish())
}
