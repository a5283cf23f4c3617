//! HTTP handlers. Validation stops at the request boundary; everything
//! past it degrades per category inside the service.

use actix_web::{get, post, web, HttpResponse, Responder};
use serde_json::json;

use crate::error::{RecsError, Result};
use crate::recommender::RecommendationService;
use crate::types::RecommendationRequest;

pub struct AppState {
    pub service: RecommendationService,
}

#[get("/health")]
pub async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(json!({
        "status": "healthy",
        "service": "recs-service",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

#[post("/api/v1/recommendations")]
pub async fn recommendations(
    state: web::Data<AppState>,
    body: web::Json<RecommendationRequest>,
) -> Result<HttpResponse> {
    let request = body.into_inner();
    validate_location(&request)?;
    let response = state.service.recommend(request).await;
    Ok(HttpResponse::Ok().json(response))
}

fn validate_location(request: &RecommendationRequest) -> Result<()> {
    if !request.location.is_valid() {
        return Err(RecsError::InvalidLocation(format!(
            "latitude/longitude out of range: ({}, {})",
            request.location.latitude, request.location.longitude
        )));
    }
    Ok(())
}
