use axum::{extract::{State, Path}, response::IntoResponse, Json, http::StatusCode};
use crate::state::AppState;
use crate::api::extractors::auth::AuthUser;
use crate::api::extractors::body::{AppJson, AppQuery};
use crate::api::dtos::requests::{AvailabilityQuery, CreatePropertyRequest, PropertySearchQuery, UpdatePropertyRequest};
use crate::api::dtos::responses::AvailabilityResponse;
use crate::domain::models::{
    auth::Principal,
    property::{validate_price, NewPropertyParams, Property, PropertyDetails, PropertySearch},
    user::Role,
};
use crate::domain::services::availability::{blocked_ranges, validate_stay};
use crate::error::AppError;
use chrono::Utc;
use std::sync::Arc;
use tracing::info;
use validator::Validate;

async fn load_owned(state: &AppState, caller: &Principal, property_id: &str) -> Result<Property, AppError> {
    let property = state.property_repo.find_by_id(property_id).await?
        .ok_or(AppError::NotFound("Property not found".into()))?;

    if !caller.is_admin() && !property.is_owned_by(&caller.id) {
        return Err(AppError::Forbidden("Only the host can manage this property".into()));
    }
    Ok(property)
}

pub async fn create_property(
    State(state): State<Arc<AppState>>,
    AuthUser(caller): AuthUser,
    AppJson(payload): AppJson<CreatePropertyRequest>,
) -> Result<impl IntoResponse, AppError> {
    if !caller.has_any_role(&[Role::Host, Role::Admin]) {
        return Err(AppError::Forbidden("Only hosts can list properties".into()));
    }
    payload.validate()?;

    let property = Property::new(NewPropertyParams {
        host_id: caller.id.clone(),
        title: payload.title.trim().to_string(),
        description: payload.description,
        location: payload.location.trim().to_string(),
        price_per_night: payload.price_per_night,
    })?;

    let created = state.property_repo.create(&property).await?;
    info!("Created property {} for host {}", created.id, created.host_id);
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn search_properties(
    State(state): State<Arc<AppState>>,
    AppQuery(query): AppQuery<PropertySearchQuery>,
) -> Result<impl IntoResponse, AppError> {
    query.validate()?;

    let search = PropertySearch::from(query);
    if let Some((check_in, check_out)) = search.stay_window() {
        validate_stay(check_in, check_out)?;
    }
    if let (Some(min), Some(max)) = (search.min_price, search.max_price) {
        if min > max {
            return Err(AppError::Validation("min_price cannot exceed max_price".into()));
        }
    }

    let properties = state.property_repo.search(&search).await?;
    Ok(Json(properties))
}

pub async fn get_property(
    State(state): State<Arc<AppState>>,
    Path(property_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let property = state.property_repo.find_by_id(&property_id).await?
        .ok_or(AppError::NotFound("Property not found".into()))?;
    let reviews = state.review_repo.summary(&property.id).await?;
    Ok(Json(PropertyDetails { property, reviews }))
}

pub async fn get_availability(
    State(state): State<Arc<AppState>>,
    Path(property_id): Path<String>,
    AppQuery(window): AppQuery<AvailabilityQuery>,
) -> Result<impl IntoResponse, AppError> {
    validate_stay(window.from, window.to)?;

    let property = state.property_repo.find_by_id(&property_id).await?
        .ok_or(AppError::NotFound("Property not found".into()))?;

    let bookings = state.booking_repo.list_blocking(&property.id, window.from, window.to).await?;

    Ok(Json(AvailabilityResponse {
        property_id: property.id,
        from: window.from,
        to: window.to,
        blocked: blocked_ranges(&bookings),
    }))
}

pub async fn update_property(
    State(state): State<Arc<AppState>>,
    AuthUser(caller): AuthUser,
    Path(property_id): Path<String>,
    AppJson(payload): AppJson<UpdatePropertyRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let mut property = load_owned(&state, &caller, &property_id).await?;

    if let Some(title) = payload.title { property.title = title.trim().to_string(); }
    if let Some(description) = payload.description { property.description = description; }
    if let Some(location) = payload.location { property.location = location.trim().to_string(); }
    if let Some(price) = payload.price_per_night {
        validate_price(price)?;
        property.price_per_night = price;
    }
    property.updated_at = Utc::now();

    let updated = state.property_repo.update(&property).await?;
    info!("Updated property {}", updated.id);
    Ok(Json(updated))
}

pub async fn delete_property(
    State(state): State<Arc<AppState>>,
    AuthUser(caller): AuthUser,
    Path(property_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let property = load_owned(&state, &caller, &property_id).await?;
    state.property_repo.delete(&property.id, Utc::now().date_naive()).await?;
    info!("Deleted property {}", property.id);
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_host_properties(
    State(state): State<Arc<AppState>>,
    AuthUser(caller): AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let properties = state.property_repo.list_by_host(&caller.id).await?;
    Ok(Json(properties))
}
