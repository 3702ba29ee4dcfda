use actix_web::{web, HttpResponse};
use actix_web_httpauth::middleware::HttpAuthentication;
use chrono::{NaiveDate, NaiveTime, Weekday};
use serde::Deserialize;
use serde_json::json;

use crate::{
    auth::{staff_validator, AuthUser},
    error::ServiceError,
    services::{
        appointments,
        appointments::StatusUpdate,
        history, slots,
    },
    state::AppState,
};

#[derive(Deserialize)]
struct SlotForm {
    starts_at: String,
    ends_at: Option<String>,
}

#[derive(Deserialize)]
struct BatchForm {
    range_start: String,
    range_end: String,
    window_open: String,
    window_close: String,
    duration_minutes: i64,
    weekdays: Vec<String>,
}

#[derive(Deserialize)]
pub struct HistoryQuery {
    pub from: Option<String>,
    pub to: Option<String>,
    pub order: Option<String>,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/staff")
            .wrap(HttpAuthentication::basic(staff_validator))
            .service(
                web::resource("/slots")
                    .route(web::get().to(list_slots))
                    .route(web::post().to(add_slot)),
            )
            .service(web::resource("/slots/batch").route(web::post().to(add_slots_batch)))
            .service(web::resource("/slots/{id}").route(web::delete().to(delete_slot)))
            .service(web::resource("/appointments").route(web::get().to(list_pending)))
            .service(
                web::resource("/appointments/{id}/status").route(web::post().to(update_status)),
            )
            .service(web::resource("/history").route(web::get().to(own_history))),
    );
}

async fn list_slots(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthUser>,
) -> Result<HttpResponse, ServiceError> {
    let rows = slots::open_slots_for_staff(&state.db, &auth.id).await?;
    Ok(HttpResponse::Ok().json(rows))
}

async fn add_slot(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthUser>,
    form: web::Json<SlotForm>,
) -> Result<HttpResponse, ServiceError> {
    let slot = slots::add_slot(&state.db, &auth.id, &form.starts_at, form.ends_at.as_deref()).await?;
    Ok(HttpResponse::Created().json(slot))
}

async fn add_slots_batch(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthUser>,
    form: web::Json<BatchForm>,
) -> Result<HttpResponse, ServiceError> {
    let range_start = parse_date(&form.range_start, "range_start")?;
    let range_end = parse_date(&form.range_end, "range_end")?;
    let window_open = parse_time(&form.window_open, "window_open")?;
    let window_close = parse_time(&form.window_close, "window_close")?;
    let weekdays = form
        .weekdays
        .iter()
        .map(|day| {
            day.parse::<Weekday>()
                .map_err(|_| ServiceError::Invalid(format!("unknown weekday '{day}'")))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let generated = slots::enumerate_slots(
        range_start,
        range_end,
        window_open,
        window_close,
        form.duration_minutes,
        &weekdays,
    )?;
    let inserted = slots::add_slots_batch(&state.db, &auth.id, &generated).await?;
    log::info!("{} generated {} slot(s)", auth.display_name, inserted.len());
    Ok(HttpResponse::Created().json(inserted))
}

async fn delete_slot(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthUser>,
    path: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    let slot_id = path.into_inner();
    let slot = slots::get_slot(&state.db, &slot_id).await?;
    if slot.staff_id != auth.id {
        return Ok(forbidden("this slot belongs to another staff member"));
    }
    slots::delete_slot(&state.db, &slot_id).await?;
    Ok(HttpResponse::NoContent().finish())
}

async fn list_pending(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthUser>,
) -> Result<HttpResponse, ServiceError> {
    let rows = appointments::pending_for_staff(&state.db, &auth.id).await?;
    Ok(HttpResponse::Ok().json(rows))
}

async fn update_status(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthUser>,
    path: web::Path<String>,
    form: web::Json<StatusUpdate>,
) -> Result<HttpResponse, ServiceError> {
    let appointment_id = path.into_inner();
    let owner = appointments::owner_of(&state.db, &appointment_id).await?;
    if owner != auth.id {
        return Ok(forbidden("this appointment belongs to another staff member"));
    }
    appointments::set_status(&state.db, &appointment_id, &form).await?;
    log::info!(
        "{} set appointment {} to {}",
        auth.display_name,
        appointment_id,
        form.status
    );
    Ok(HttpResponse::Ok().json(json!({ "ok": true })))
}

async fn own_history(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthUser>,
    query: web::Query<HistoryQuery>,
) -> Result<HttpResponse, ServiceError> {
    let descending = query.order.as_deref() == Some("desc");
    let items = history::history(
        &state.db,
        Some(&auth.id),
        query.from.as_deref(),
        query.to.as_deref(),
        descending,
    )
    .await?;
    Ok(HttpResponse::Ok().json(items))
}

fn forbidden(message: &str) -> HttpResponse {
    HttpResponse::Forbidden().json(json!({ "error": "forbidden", "message": message }))
}

fn parse_date(value: &str, field: &'static str) -> Result<NaiveDate, ServiceError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| ServiceError::Invalid(format!("{field} must be a YYYY-MM-DD date")))
}

fn parse_time(value: &str, field: &'static str) -> Result<NaiveTime, ServiceError> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value.trim(), "%H:%M:%S"))
        .map_err(|_| ServiceError::Invalid(format!("{field} must be a HH:MM time")))
}
