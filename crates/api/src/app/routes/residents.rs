use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::Value;

use registry_core::{parse_bulk, Resident, ResidentId, ResidentPatch};

use crate::app::dto;
use crate::app::errors::{self, Operation};
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_resident).get(list_residents))
        .route(
            "/bulk",
            post(create_residents_bulk)
                .get(get_bulk_resident)
                .put(update_bulk_resident)
                .delete(delete_bulk_resident),
        )
        .route(
            "/:id",
            get(get_resident).put(update_resident).delete(delete_resident),
        )
}

pub async fn create_residents_bulk(
    Extension(services): Extension<Arc<AppServices>>,
    body: Option<Json<Value>>,
) -> axum::response::Response {
    let body = dto::body_or_empty(body);
    let residents = match parse_bulk(&body) {
        Ok(r) => r,
        Err(e) => return errors::domain_error_to_response(Operation::SaveBulk, e),
    };

    match services.residents().create_bulk(&residents).await {
        Ok(()) => dto::message(StatusCode::CREATED, "Residents added successfully"),
        Err(e) => errors::repository_error_to_response(Operation::SaveBulk, e),
    }
}

pub async fn create_resident(
    Extension(services): Extension<Arc<AppServices>>,
    body: Option<Json<Value>>,
) -> axum::response::Response {
    let body = dto::body_or_empty(body);
    let resident = match Resident::from_json(&body) {
        Ok(r) => r,
        Err(e) => return errors::domain_error_to_response(Operation::Save, e),
    };

    match services.residents().create(&resident).await {
        Ok(()) => dto::message(StatusCode::CREATED, "Saved successfully"),
        Err(e) => errors::repository_error_to_response(Operation::Save, e),
    }
}

pub async fn get_resident(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    fetch(&services, ResidentId::new(id)).await
}

async fn fetch(services: &AppServices, id: ResidentId) -> axum::response::Response {
    match services.residents().get(&id).await {
        Ok(fields) => (StatusCode::OK, Json(fields)).into_response(),
        Err(e) => errors::repository_error_to_response(Operation::Fetch, e),
    }
}

pub async fn list_residents(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.residents().list().await {
        Ok(residents) => {
            let items = residents
                .into_iter()
                .map(dto::stored_resident_to_json)
                .collect::<Vec<_>>();
            (StatusCode::OK, Json(items)).into_response()
        }
        Err(e) => errors::repository_error_to_response(Operation::FetchAll, e),
    }
}

pub async fn update_resident(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    body: Option<Json<Value>>,
) -> axum::response::Response {
    update(&services, ResidentId::new(id), body).await
}

async fn update(
    services: &AppServices,
    id: ResidentId,
    body: Option<Json<Value>>,
) -> axum::response::Response {
    let body = dto::body_or_empty(body);
    let patch = match ResidentPatch::from_json(&body) {
        Ok(p) => p,
        Err(e) => return errors::domain_error_to_response(Operation::Update, e),
    };

    match services.residents().update(&id, &patch).await {
        Ok(()) => dto::message(StatusCode::OK, "Resident updated successfully"),
        Err(e) => errors::repository_error_to_response(Operation::Update, e),
    }
}

pub async fn delete_resident(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    delete(&services, ResidentId::new(id)).await
}

async fn delete(services: &AppServices, id: ResidentId) -> axum::response::Response {
    match services.residents().delete(&id).await {
        Ok(()) => dto::message(StatusCode::OK, "Resident deleted successfully"),
        Err(e) => errors::repository_error_to_response(Operation::Delete, e),
    }
}

// The static `/bulk` segment shadows `/:id`, so a resident whose id is
// literally `bulk` is reached through these.

const BULK_ID: &str = "bulk";

pub async fn get_bulk_resident(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    fetch(&services, ResidentId::new(BULK_ID)).await
}

pub async fn update_bulk_resident(
    Extension(services): Extension<Arc<AppServices>>,
    body: Option<Json<Value>>,
) -> axum::response::Response {
    update(&services, ResidentId::new(BULK_ID), body).await
}

pub async fn delete_bulk_resident(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    delete(&services, ResidentId::new(BULK_ID)).await
}
