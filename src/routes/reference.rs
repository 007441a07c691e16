use actix_web::{HttpResponse, Responder, get, web};
use serde::Deserialize;

use crate::form::validation::parse_date_input;
use crate::handlers::reference::{get_availability, get_branches};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
struct AvailabilityQuery {
    branch: i64,
    date: String,
}

#[get("/branches")]
async fn branches(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(get_branches(&state).await)
}

#[get("/availability")]
async fn availability(state: web::Data<AppState>, query: web::Query<AvailabilityQuery>) -> impl Responder {
    let Some(date) = parse_date_input(&query.date) else {
        return HttpResponse::BadRequest().body("date must be YYYY-MM-DD");
    };

    HttpResponse::Ok().json(get_availability(&state, query.branch, date).await)
}

pub fn init(cfg: &mut web::ServiceConfig) {
    cfg.service(branches).service(availability);
}
