use actix_web::{web, HttpResponse};
use actix_web_httpauth::middleware::HttpAuthentication;

use crate::{
    auth::{admin_validator, AuthUser},
    error::ServiceError,
    routes::staff::HistoryQuery,
    services::{appointments, history, staff, staff::StaffDraft},
    state::AppState,
};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/admin")
            .wrap(HttpAuthentication::basic(admin_validator))
            .service(
                web::resource("/staff")
                    .route(web::get().to(list_staff))
                    .route(web::post().to(create_staff)),
            )
            .service(web::resource("/staff/{id}").route(web::delete().to(delete_staff)))
            .service(web::resource("/appointments").route(web::get().to(list_pending)))
            .service(web::resource("/history").route(web::get().to(global_history))),
    );
}

async fn list_staff(state: web::Data<AppState>) -> Result<HttpResponse, ServiceError> {
    let rows = staff::list_staff(&state.db).await?;
    Ok(HttpResponse::Ok().json(rows))
}

async fn create_staff(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthUser>,
    draft: web::Json<StaffDraft>,
) -> Result<HttpResponse, ServiceError> {
    let created = staff::create_staff(&state.db, &draft).await?;
    log::info!(
        "{} created staff account {} ({})",
        auth.display_name,
        created.username,
        created.id
    );
    Ok(HttpResponse::Created().json(created))
}

async fn delete_staff(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthUser>,
    path: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    let staff_id = path.into_inner();
    staff::delete_staff(&state.db, &staff_id).await?;
    log::info!("{} deleted staff account {}", auth.display_name, staff_id);
    Ok(HttpResponse::NoContent().finish())
}

async fn list_pending(state: web::Data<AppState>) -> Result<HttpResponse, ServiceError> {
    let rows = appointments::pending_all(&state.db).await?;
    Ok(HttpResponse::Ok().json(rows))
}

async fn global_history(
    state: web::Data<AppState>,
    query: web::Query<HistoryQuery>,
) -> Result<HttpResponse, ServiceError> {
    let descending = query.order.as_deref() == Some("desc");
    let items = history::history(
        &state.db,
        None,
        query.from.as_deref(),
        query.to.as_deref(),
        descending,
    )
    .await?;
    Ok(HttpResponse::Ok().json(items))
}
