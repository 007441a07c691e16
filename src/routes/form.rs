use actix_web::http::StatusCode;
use actix_web::{HttpResponse, Responder, delete, get, post, put, web};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::FormError;
use crate::form::notification::Level;
use crate::form::validation::Field;
use crate::handlers::form;
use crate::models::timeslot::TimeSlot;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
struct FieldInput {
    field: Field,
    #[serde(default)]
    value: String,
}

#[derive(Debug, Deserialize)]
struct BlurInput {
    field: Field,
}

#[derive(Debug, Deserialize)]
struct TimeInput {
    slot: Option<TimeSlot>,
}

async fn open(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Created().json(form::open_form(&state).await)
}

#[get("/{id}")]
async fn show(state: web::Data<AppState>, id: web::Path<Uuid>) -> Result<HttpResponse, FormError> {
    let view = form::get_form(&state, id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(view))
}

#[put("/{id}/field")]
async fn set_field(
    state: web::Data<AppState>,
    id: web::Path<Uuid>,
    input: web::Json<FieldInput>,
) -> Result<HttpResponse, FormError> {
    let FieldInput { field, value } = input.into_inner();
    let view = form::set_field(&state, id.into_inner(), field, value).await?;
    Ok(HttpResponse::Ok().json(view))
}

#[post("/{id}/blur")]
async fn blur(
    state: web::Data<AppState>,
    id: web::Path<Uuid>,
    input: web::Json<BlurInput>,
) -> Result<HttpResponse, FormError> {
    let error = form::blur(&state, id.into_inner(), input.field).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "error": error })))
}

#[put("/{id}/time")]
async fn select_time(
    state: web::Data<AppState>,
    id: web::Path<Uuid>,
    input: web::Json<TimeInput>,
) -> Result<HttpResponse, FormError> {
    let view = form::select_time(&state, id.into_inner(), input.slot).await?;
    Ok(HttpResponse::Ok().json(view))
}

#[post("/{id}/submit")]
async fn submit(state: web::Data<AppState>, id: web::Path<Uuid>) -> Result<HttpResponse, FormError> {
    let outcome = form::submit(&state, id.into_inner()).await?;
    let status = match outcome.notification.level {
        Level::Success => StatusCode::CREATED,
        Level::Error => StatusCode::BAD_GATEWAY,
    };
    Ok(HttpResponse::build(status).json(outcome))
}

#[delete("/{id}")]
async fn close(state: web::Data<AppState>, id: web::Path<Uuid>) -> Result<HttpResponse, FormError> {
    form::close_form(&state, id.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

pub fn init(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("").route(web::post().to(open)))
        .service(show)
        .service(set_field)
        .service(blur)
        .service(select_time)
        .service(submit)
        .service(close);
}
