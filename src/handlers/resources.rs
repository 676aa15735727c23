//! HTTP surface of the uniform CRUD resources: list, get, create, update
//! and delete, each on the same dispatch template as every other endpoint.

use axum::{extract::State, response::Response, routing::get, Extension, Router};

use crate::dispatch::Dispatch;
use crate::error::ApiError;
use crate::extract::{Payload, PathParams, QueryParams};
use crate::middleware::{ApiResponse, ApiResult, HeaderIdentity, Page, RequestIdentity};
use crate::resource::{Customer, Employee, GlAccount, Possession, Resource, ResourceKey, RoleTemplate, TaskStatus, Vendor};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(resource::<RoleTemplate>())
        .merge(resource::<TaskStatus>())
        .merge(resource::<Possession>())
        .merge(resource::<Employee>())
        .merge(resource::<GlAccount>())
        .merge(resource::<Vendor>())
        .merge(resource::<Customer>())
}

fn resource<R: Resource>() -> Router<AppState> {
    let collection = format!("/{}", R::PATH);
    let item = format!("/{}/:{}", R::PATH, R::PARAM);

    let router = Router::new()
        .route(&collection, get(list::<R>).post(create::<R>))
        .route(&item, get(fetch::<R>).put(update::<R>).delete(remove::<R>));

    if R::HEADER_IDENTITY {
        router.layer(Extension(HeaderIdentity))
    } else {
        router
    }
}

fn admit<R: Resource>(dispatch: &Dispatch) -> Result<(), ApiError> {
    if R::NUMERIC_TENANT {
        dispatch.numeric_tenant()?;
    }
    Ok(())
}

fn key_of<R: Resource>(params: &PathParams) -> Result<R::Key, ApiError> {
    params
        .text(R::PARAM)
        .ok()
        .and_then(R::Key::parse)
        .ok_or_else(|| ApiError::bad_request(format!("Invalid {}", R::KEY_LABEL)))
}

fn not_found<R: Resource>() -> String {
    format!("{} not found", R::NOUN)
}

/// GET /api/v1/{path}?offset&limit
async fn list<R: Resource>(State(state): State<AppState>, identity: RequestIdentity, query: QueryParams) -> Response {
    let dispatch = Dispatch::begin(&state, R::ENDPOINTS.list, &identity);
    let services = &state.services;

    let outcome: ApiResult<Page<R::Record>> = async {
        admit::<R>(&dispatch)?;
        let page = query.page()?;
        let (records, total) = dispatch
            .invoke(|scope, tenant| async move { R::store(services).list(&scope, &tenant, page).await })
            .await?;
        Ok(ApiResponse::ok(Page::new(records, total, &page)))
    }
    .await;

    dispatch.finish(outcome)
}

/// GET /api/v1/{path}/{key}
async fn fetch<R: Resource>(State(state): State<AppState>, identity: RequestIdentity, params: PathParams) -> Response {
    let dispatch = Dispatch::begin(&state, R::ENDPOINTS.get, &identity);
    let services = &state.services;

    let outcome: ApiResult<R::Record> = async {
        admit::<R>(&dispatch)?;
        let key = key_of::<R>(&params)?;
        let record = dispatch
            .lookup(&not_found::<R>(), |scope, tenant| async move {
                R::store(services).get(&scope, &tenant, &key).await
            })
            .await?;
        Ok(ApiResponse::ok(record))
    }
    .await;

    dispatch.finish(outcome)
}

/// POST /api/v1/{path}
async fn create<R: Resource>(
    State(state): State<AppState>,
    identity: RequestIdentity,
    body: Result<Payload<R::Create>, ApiError>,
) -> Response {
    let dispatch = Dispatch::begin(&state, R::ENDPOINTS.create, &identity);
    let services = &state.services;

    let outcome: ApiResult<R::Record> = async {
        admit::<R>(&dispatch)?;
        let Payload(input) = body?;
        R::validate(&input)?;

        let actor = dispatch.user();
        let record = dispatch
            .invoke(|scope, tenant| async move { R::store(services).create(&scope, &tenant, actor, input).await })
            .await?;
        Ok(ApiResponse::created(record))
    }
    .await;

    dispatch.finish(outcome)
}

/// PUT /api/v1/{path}/{key}
async fn update<R: Resource>(
    State(state): State<AppState>,
    identity: RequestIdentity,
    params: PathParams,
    body: Result<Payload<R::Update>, ApiError>,
) -> Response {
    let dispatch = Dispatch::begin(&state, R::ENDPOINTS.update, &identity);
    let services = &state.services;

    let outcome: ApiResult<R::Record> = async {
        admit::<R>(&dispatch)?;
        let key = key_of::<R>(&params)?;
        let Payload(input) = body?;
        R::validate_update(&input)?;

        let record = dispatch
            .lookup(&not_found::<R>(), |scope, tenant| async move {
                R::store(services).update(&scope, &tenant, &key, input).await
            })
            .await?;
        Ok(ApiResponse::ok(record))
    }
    .await;

    dispatch.finish(outcome)
}

/// DELETE /api/v1/{path}/{key}
async fn remove<R: Resource>(State(state): State<AppState>, identity: RequestIdentity, params: PathParams) -> Response {
    let dispatch = Dispatch::begin(&state, R::ENDPOINTS.delete, &identity);
    let services = &state.services;

    let outcome: ApiResult<()> = async {
        admit::<R>(&dispatch)?;
        let key = key_of::<R>(&params)?;
        let removed = dispatch
            .invoke(|scope, tenant| async move { R::store(services).delete(&scope, &tenant, &key).await })
            .await?;
        if !removed {
            return Err(ApiError::not_found(not_found::<R>()));
        }
        Ok(ApiResponse::no_content())
    }
    .await;

    dispatch.finish(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bad_path_key_names_the_resource() {
        let params = PathParams::from(std::collections::HashMap::from([("id".to_string(), "x".to_string())]));
        let err = key_of::<Vendor>(&params).unwrap_err();
        assert_eq!(err.message(), "Invalid vendor ID");
    }
}
