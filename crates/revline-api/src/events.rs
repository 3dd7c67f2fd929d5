use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;

use revline_db::models::{CarRow, EventRow, NewCar, NewRegistration, RegistrationRow, RegistrationUpdate};
use revline_types::api::{
    CarDto, CarInput, CheckRegistrationRequest, CheckRegistrationResponse, Claims, EventDto,
    EventsResponse, MessageResponse, RegisterEventRequest, RegistrationDto, RegistrationResponse,
    UpdateRegistrationRequest,
};

use crate::auth::AppState;
use crate::error::{ApiError, join_error};
use crate::extract::{ApiJson, ApiQuery};

pub async fn list_events(
    State(state): State<AppState>,
    Extension(_claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let events = tokio::task::spawn_blocking(move || db.db.list_events())
        .await
        .map_err(join_error)??;

    Ok(Json(EventsResponse {
        success: true,
        events: events.into_iter().map(event_dto).collect(),
    }))
}

pub async fn check_registration(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CheckRegistrationRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let registered =
        tokio::task::spawn_blocking(move || db.db.is_registered(req.event_id, &req.email))
            .await
            .map_err(join_error)??;

    let message = if registered {
        "This email is already registered for this event"
    } else {
        "This email is not registered for this event"
    };
    Ok(Json(CheckRegistrationResponse { registered, message: message.into() }))
}

pub async fn register_event(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegisterEventRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.name.trim().is_empty() {
        return Err(ApiError::Validation("registrant name is required".into()));
    }
    if !req.email.contains('@') {
        return Err(ApiError::Validation("a valid email is required".into()));
    }

    let registration = NewRegistration {
        event_id: req.event_id,
        user_id: req.user_id,
        name: req.name,
        email: req.email,
        phone: req.phone,
        cars: req.cars.into_iter().map(new_car).collect(),
    };

    let db = state.clone();
    tokio::task::spawn_blocking(move || db.db.create_registration(&registration))
        .await
        .map_err(join_error)??;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse { success: true, message: "registration complete".into() }),
    ))
}

#[derive(Debug, Deserialize)]
pub struct RegistrationQuery {
    #[serde(rename = "eventId")]
    pub event_id: i64,
}

/// Caller-scoped read: a registration owned by anyone else is reported as
/// absent rather than revealed.
pub async fn get_registration_details(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<RegistrationQuery>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let found = tokio::task::spawn_blocking(move || {
        db.db.get_registration_for_user(query.event_id, claims.sub)
    })
    .await
    .map_err(join_error)??;

    let (registration, cars) = found.ok_or(ApiError::NotFound("no registration for this event"))?;
    Ok(Json(RegistrationResponse {
        success: true,
        registration: registration_dto(registration, cars),
    }))
}

pub async fn update_event_registration(
    State(state): State<AppState>,
    Path(registration_id): Path<i64>,
    Extension(claims): Extension<Claims>,
    ApiJson(req): ApiJson<UpdateRegistrationRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.name.trim().is_empty() {
        return Err(ApiError::Validation("registrant name is required".into()));
    }
    if !req.email.contains('@') {
        return Err(ApiError::Validation("a valid email is required".into()));
    }

    let update = RegistrationUpdate {
        name: req.name,
        email: req.email,
        phone: req.phone,
        cars: req.cars.into_iter().map(new_car).collect(),
    };

    let db = state.clone();
    tokio::task::spawn_blocking(move || {
        db.db.update_registration(registration_id, claims.sub, &update)
    })
    .await
    .map_err(join_error)??;

    Ok(Json(MessageResponse { success: true, message: "registration updated".into() }))
}

fn event_dto(row: EventRow) -> EventDto {
    EventDto {
        id: row.id,
        name: row.name,
        location: row.location,
        event_date: row.event_date,
        description: row.description,
    }
}

fn new_car(car: CarInput) -> NewCar {
    NewCar {
        make: car.make,
        model: car.model,
        year: car.year,
        color: car.color,
        mileage: car.mileage,
        modifications: car.modifications,
    }
}

fn registration_dto(reg: RegistrationRow, cars: Vec<CarRow>) -> RegistrationDto {
    RegistrationDto {
        id: reg.id,
        event_id: reg.event_id,
        name: reg.name,
        email: reg.email,
        phone: reg.phone,
        cars: cars
            .into_iter()
            .map(|car| CarDto {
                id: car.id,
                make: car.make,
                model: car.model,
                year: car.year,
                color: car.color,
                mileage: car.mileage,
                modifications: car.modifications,
            })
            .collect(),
    }
}
