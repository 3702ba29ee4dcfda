use actix_web::{web, HttpResponse};
use serde_json::json;

use crate::{
    db,
    error::ServiceError,
    services::{reservation, reservation::AppointmentDraft, slots},
    state::AppState,
};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/health").route(web::get().to(health)))
        .service(web::resource("/slots").route(web::get().to(list_open_slots)))
        .service(web::resource("/slots/{id}/reserve").route(web::post().to(reserve)));
}

async fn health(state: web::Data<AppState>) -> HttpResponse {
    match db::check_store(&state.db).await {
        Ok(()) => HttpResponse::Ok().json(json!({ "status": "ok" })),
        Err((fault, message)) => HttpResponse::ServiceUnavailable().json(json!({
            "status": "unavailable",
            "class": fault.as_str(),
            "message": message,
        })),
    }
}

async fn list_open_slots(state: web::Data<AppState>) -> Result<HttpResponse, ServiceError> {
    let slots = slots::open_slots(&state.db).await?;
    Ok(HttpResponse::Ok().json(slots))
}

async fn reserve(
    state: web::Data<AppState>,
    path: web::Path<String>,
    draft: web::Json<AppointmentDraft>,
) -> Result<HttpResponse, ServiceError> {
    let slot_id = path.into_inner();
    let appointment = reservation::reserve(&state.db, &slot_id, &draft).await?;
    log::info!(
        "slot {} reserved for {} (appointment {})",
        slot_id,
        appointment.candidate_name,
        appointment.id
    );
    Ok(HttpResponse::Created().json(appointment))
}
