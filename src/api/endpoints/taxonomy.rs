use actix_web::{
    HttpRequest, HttpResponse, delete, get, post, put,
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
        taxonomy::{CategoryInput, StateInput, SubCategoryInput},
    },
};

/**
 * Filters for the sub category list.
 */
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubCategoryFilterQuery {
    pub category_id: Option<i64>,
    pub status: Option<String>,
}

/**
 * Endpoint to retrieve a page of categories.
 */
#[instrument(level = "info", skip(http_request, app_state, query, status), fields(service = "listCategories", trace_id = get_trace_id(&http_request), result))]
#[get("/categories")]
pub async fn category_list(
    http_request: HttpRequest,
    query: web::Query<ListQuery>,
    status: web::Query<StatusQuery>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let _ = app_state.jwt_service.validate(&http_request)?;
    let page = app_state.taxonomy_service.get_category_list(query.into_inner(), status.into_inner().status).instrument(span).await?;
    Ok(HttpResponse::Ok().json(page))
}

/**
 * Endpoint to retrieve one category.
 */
#[instrument(skip(http_request, app_state), fields(service = "getCategory", trace_id = get_trace_id(&http_request), result))]
#[get("/categories/{categoryId}")]
pub async fn category_get(path: Path<i64>, http_request: HttpRequest, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let _ = app_state.jwt_service.validate(&http_request)?;
    let category = app_state.taxonomy_service.get_category(path.into_inner()).instrument(span).await?;
    Ok(HttpResponse::Ok().json(category))
}

/**
 * Endpoint to add a new category.
 */
#[instrument(level = "info", skip(http_request, app_state, request_body), fields(service = "addCategory", trace_id = get_trace_id(&http_request), result))]
#[post("/categories")]
pub async fn category_add(http_request: HttpRequest, request_body: web::Json<CategoryInput>, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let _ = app_state.jwt_service.validate(&http_request)?;
    let category = app_state.taxonomy_service.add_category(request_body.into_inner()).instrument(span).await?;
    Ok(HttpResponse::Created().json(category))
}

/**
 * Endpoint to update a category.
 */
#[instrument(skip(http_request, app_state, request_body), fields(service = "updateCategory", trace_id = get_trace_id(&http_request), result))]
#[put("/categories/{categoryId}")]
pub async fn category_update(
    path: Path<i64>,
    http_request: HttpRequest,
    request_body: web::Json<CategoryInput>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let _ = app_state.jwt_service.validate(&http_request)?;
    let category = app_state.taxonomy_service.update_category(path.into_inner(), request_body.into_inner()).instrument(span).await?;
    Ok(HttpResponse::Ok().json(category))
}

/**
 * Endpoint to delete a category. Requires the confirm=true acknowledgement.
 */
#[instrument(skip(http_request, app_state), fields(service = "deleteCategory", trace_id = get_trace_id(&http_request), result))]
#[delete("/categories/{categoryId}")]
pub async fn category_delete(
    path: Path<i64>,
    http_request: HttpRequest,
    confirm: web::Query<DeleteQuery>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let _ = app_state.jwt_service.validate(&http_request)?;
    confirm.require_confirmation()?;
    app_state.taxonomy_service.delete_category(path.into_inner()).instrument(span).await?;
    Ok(HttpResponse::NoContent().finish())
}

/**
 * Endpoint to retrieve a page of sub categories.
 */
#[instrument(level = "info", skip(http_request, app_state, query, filter), fields(service = "listSubCategories", trace_id = get_trace_id(&http_request), result))]
#[get("/subcategories")]
pub async fn subcategory_list(
    http_request: HttpRequest,
    query: web::Query<ListQuery>,
    filter: web::Query<SubCategoryFilterQuery>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let _ = app_state.jwt_service.validate(&http_request)?;
    let filter = filter.into_inner();
    let page = app_state.taxonomy_service.get_subcategory_list(query.into_inner(), filter.category_id, filter.status).instrument(span).await?;
    Ok(HttpResponse::Ok().json(page))
}

/**
 * Endpoint to retrieve one sub category.
 */
#[instrument(skip(http_request, app_state), fields(service = "getSubCategory", trace_id = get_trace_id(&http_request), result))]
#[get("/subcategories/{subCategoryId}")]
pub async fn subcategory_get(path: Path<i64>, http_request: HttpRequest, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let _ = app_state.jwt_service.validate(&http_request)?;
    let subcategory = app_state.taxonomy_service.get_subcategory(path.into_inner()).instrument(span).await?;
    Ok(HttpResponse::Ok().json(subcategory))
}

/**
 * Endpoint to add a new sub category.
 */
#[instrument(level = "info", skip(http_request, app_state, request_body), fields(service = "addSubCategory", trace_id = get_trace_id(&http_request), result))]
#[post("/subcategories")]
pub async fn subcategory_add(http_request: HttpRequest, request_body: web::Json<SubCategoryInput>, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let _ = app_state.jwt_service.validate(&http_request)?;
    let subcategory = app_state.taxonomy_service.add_subcategory(request_body.into_inner()).instrument(span).await?;
    Ok(HttpResponse::Created().json(subcategory))
}

/**
 * Endpoint to update a sub category.
 */
#[instrument(skip(http_request, app_state, request_body), fields(service = "updateSubCategory", trace_id = get_trace_id(&http_request), result))]
#[put("/subcategories/{subCategoryId}")]
pub async fn subcategory_update(
    path: Path<i64>,
    http_request: HttpRequest,
    request_body: web::Json<SubCategoryInput>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let _ = app_state.jwt_service.validate(&http_request)?;
    let subcategory = app_state.taxonomy_service.update_subcategory(path.into_inner(), request_body.into_inner()).instrument(span).await?;
    Ok(HttpResponse::Ok().json(subcategory))
}

/**
 * Endpoint to delete a sub category. Requires the confirm=true acknowledgement.
 */
#[instrument(skip(http_request, app_state), fields(service = "deleteSubCategory", trace_id = get_trace_id(&http_request), result))]
#[delete("/subcategories/{subCategoryId}")]
pub async fn subcategory_delete(
    path: Path<i64>,
    http_request: HttpRequest,
    confirm: web::Query<DeleteQuery>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let _ = app_state.jwt_service.validate(&http_request)?;
    confirm.require_confirmation()?;
    app_state.taxonomy_service.delete_subcategory(path.into_inner()).instrument(span).await?;
    Ok(HttpResponse::NoContent().finish())
}

/**
 * Endpoint to retrieve a page of states.
 */
#[instrument(level = "info", skip(http_request, app_state, query), fields(service = "listStates", trace_id = get_trace_id(&http_request), result))]
#[get("/states")]
pub async fn state_list(http_request: HttpRequest, query: web::Query<ListQuery>, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let _ = app_state.jwt_service.validate(&http_request)?;
    let page = app_state.taxonomy_service.get_state_list(query.into_inner()).instrument(span).await?;
    Ok(HttpResponse::Ok().json(page))
}

/**
 * Endpoint to retrieve one state.
 */
#[instrument(skip(http_request, app_state), fields(service = "getState", trace_id = get_trace_id(&http_request), result))]
#[get("/states/{stateId}")]
pub async fn state_get(path: Path<i64>, http_request: HttpRequest, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let _ = app_state.jwt_service.validate(&http_request)?;
    let state = app_state.taxonomy_service.get_state(path.into_inner()).instrument(span).await?;
    Ok(HttpResponse::Ok().json(state))
}

/**
 * Endpoint to add a new state.
 */
#[instrument(level = "info", skip(http_request, app_state, request_body), fields(service = "addState", trace_id = get_trace_id(&http_request), result))]
#[post("/states")]
pub async fn state_add(http_request: HttpRequest, request_body: web::Json<StateInput>, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let _ = app_state.jwt_service.validate(&http_request)?;
    let state = app_state.taxonomy_service.add_state(request_body.into_inner()).instrument(span).await?;
    Ok(HttpResponse::Created().json(state))
}

/**
 * Endpoint to update a state.
 */
#[instrument(skip(http_request, app_state, request_body), fields(service = "updateState", trace_id = get_trace_id(&http_request), result))]
#[put("/states/{stateId}")]
pub async fn state_update(
    path: Path<i64>,
    http_request: HttpRequest,
    request_body: web::Json<StateInput>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let _ = app_state.jwt_service.validate(&http_request)?;
    let state = app_state.taxonomy_service.update_state(path.into_inner(), request_body.into_inner()).instrument(span).await?;
    Ok(HttpResponse::Ok().json(state))
}

/**
 * Endpoint to delete a state. Requires the confirm=true acknowledgement.
 */
#[instrument(skip(http_request, app_state), fields(service = "deleteState", trace_id = get_trace_id(&http_request), result))]
#[delete("/states/{stateId}")]
pub async fn state_delete(
    path: Path<i64>,
    http_request: HttpRequest,
    confirm: web::Query<DeleteQuery>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let _ = app_state.jwt_service.validate(&http_request)?;
    confirm.require_confirmation()?;
    app_state.taxonomy_service.delete_state(path.into_inner()).instrument(span).await?;
    Ok(HttpResponse::NoContent().finish())
}
