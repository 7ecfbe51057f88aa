//! HTTP routes for quotes and checkout sessions.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use uuid::Uuid;

use crate::error::Result;
use crate::AppState;

use super::requests::{
    ApplyCouponRequest, ApplyFormattingRequest, CreateSessionRequest, MetadataQuery,
    QuoteRequest, SelectPackageRequest, SetAddonsRequest, ToggleAddonRequest,
    UpdateConfigurationRequest,
};
use super::responses::{ProviderMetadataResponse, QuoteResponse, SessionResponse};
use super::services;
use super::store::PricingStore;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/pricing/quote", post(quote))
        .route("/api/pricing/metadata", post(quote_metadata))
        .route("/api/checkout/sessions", post(create_session))
        .route(
            "/api/checkout/sessions/:id",
            get(get_session).delete(delete_session),
        )
        .route("/api/checkout/sessions/:id/package", put(select_package))
        .route("/api/checkout/sessions/:id/addons", put(set_addons))
        .route("/api/checkout/sessions/:id/addons/toggle", post(toggle_addon))
        .route(
            "/api/checkout/sessions/:id/addons/:addon_id",
            delete(remove_addon),
        )
        .route(
            "/api/checkout/sessions/:id/configuration",
            put(update_configuration),
        )
        .route("/api/checkout/sessions/:id/formatting", put(apply_formatting))
        .route(
            "/api/checkout/sessions/:id/coupon",
            put(apply_coupon).delete(clear_coupon),
        )
        .route("/api/checkout/sessions/:id/reset", post(reset_session))
        .route("/api/checkout/sessions/:id/metadata", get(session_metadata))
}

fn fresh_store(state: &AppState) -> PricingStore {
    PricingStore::with_fees(state.config.pricing_mode, state.config.scenario_fees)
}

fn fit_metadata(
    store: &PricingStore,
    state: &AppState,
    query: MetadataQuery,
) -> Result<ProviderMetadataResponse> {
    let limit = query.limit.unwrap_or(state.config.metadata_limit);
    let metadata = store.to_payment_metadata().fit(limit)?;
    Ok(ProviderMetadataResponse {
        minimized: metadata.is_minimized(),
        limit,
        metadata,
    })
}

/// Price a complete selection without creating a session
async fn quote(
    State(state): State<AppState>,
    Json(req): Json<QuoteRequest>,
) -> Json<QuoteResponse> {
    let store = req.into_store(fresh_store(&state));
    Json(QuoteResponse::from(&store))
}

async fn quote_metadata(
    State(state): State<AppState>,
    Query(query): Query<MetadataQuery>,
    Json(req): Json<QuoteRequest>,
) -> Result<Json<ProviderMetadataResponse>> {
    let store = req.into_store(fresh_store(&state));
    Ok(Json(fit_metadata(&store, &state, query)?))
}

async fn create_session(
    State(state): State<AppState>,
    body: Option<Json<CreateSessionRequest>>,
) -> (StatusCode, Json<SessionResponse>) {
    let mode = body
        .and_then(|Json(req)| req.mode)
        .unwrap_or(state.config.pricing_mode);
    let session = services::create_session(&state.cache, mode, state.config.scenario_fees).await;
    (StatusCode::CREATED, Json(SessionResponse::from(&session)))
}

async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionResponse>> {
    let session = services::get_session(&state.cache, id).await?;
    Ok(Json(SessionResponse::from(&session)))
}

async fn delete_session(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<StatusCode> {
    services::delete_session(&state.cache, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn select_package(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<SelectPackageRequest>,
) -> Result<Json<SessionResponse>> {
    let session =
        services::select_package(&state.db, &state.cache, id, req.package_id.as_deref()).await?;
    Ok(Json(SessionResponse::from(&session)))
}

async fn set_addons(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<SetAddonsRequest>,
) -> Result<Json<SessionResponse>> {
    let session = services::set_addons(&state.db, &state.cache, id, &req.addon_ids).await?;
    Ok(Json(SessionResponse::from(&session)))
}

async fn toggle_addon(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<ToggleAddonRequest>,
) -> Result<Json<SessionResponse>> {
    let session = services::toggle_addon(&state.db, &state.cache, id, &req.addon_id).await?;
    Ok(Json(SessionResponse::from(&session)))
}

async fn remove_addon(
    State(state): State<AppState>,
    Path((id, addon_id)): Path<(Uuid, String)>,
) -> Result<Json<SessionResponse>> {
    let session = services::remove_addon(&state.cache, id, &addon_id).await?;
    Ok(Json(SessionResponse::from(&session)))
}

async fn update_configuration(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateConfigurationRequest>,
) -> Result<Json<SessionResponse>> {
    let session = services::update_configuration(&state.cache, id, req.into()).await?;
    Ok(Json(SessionResponse::from(&session)))
}

async fn apply_formatting(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<ApplyFormattingRequest>,
) -> Result<Json<SessionResponse>> {
    let session =
        services::apply_formatting_cost(&state.cache, id, req.word_count, req.price_per_word)
            .await?;
    Ok(Json(SessionResponse::from(&session)))
}

async fn apply_coupon(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<ApplyCouponRequest>,
) -> Result<Json<SessionResponse>> {
    let session = services::apply_coupon(&state.cache, id, &req.code, req.discount_amount).await?;
    Ok(Json(SessionResponse::from(&session)))
}

async fn clear_coupon(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionResponse>> {
    let session = services::clear_coupon(&state.cache, id).await?;
    Ok(Json(SessionResponse::from(&session)))
}

async fn reset_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionResponse>> {
    let session = services::reset_session(&state.cache, id).await?;
    Ok(Json(SessionResponse::from(&session)))
}

async fn session_metadata(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<MetadataQuery>,
) -> Result<Json<ProviderMetadataResponse>> {
    let session = services::get_session(&state.cache, id).await?;
    Ok(Json(fit_metadata(&session.store, &state, query)?))
}
