use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::IntoResponse,
    routing::{get, post},
};
use devtrack_core::{AddPackageInput, AddPackageUpdateInput, Package};

use crate::{ApiError, AppState, PACKAGES_PATH};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_packages).post(create_package))
        .route("/{code}", get(get_package))
        .route("/{code}/updates", post(add_update))
}

async fn list_packages(State(svc): State<AppState>) -> Result<Json<Vec<Package>>, ApiError> {
    Ok(Json(svc.list_packages().await?))
}

async fn get_package(
    State(svc): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<Package>, ApiError> {
    Ok(Json(svc.get_package(&code).await?))
}

async fn create_package(
    State(svc): State<AppState>,
    body: Result<Json<AddPackageInput>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(body) = body?;
    let package = svc.create_package(body).await?;
    let location = format!("{PACKAGES_PATH}/{}", package.code);

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(package),
    ))
}

async fn add_update(
    State(svc): State<AppState>,
    Path(code): Path<String>,
    body: Result<Json<AddPackageUpdateInput>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let Json(body) = body?;
    svc.add_update(&code, body).await?;
    Ok(StatusCode::NO_CONTENT)
}
