use actix_web::{HttpResponse, Responder, get, web};
use serde_json::json;

use crate::state::AppState;

#[get("/ping")]
async fn ping() -> impl Responder {
    HttpResponse::Ok().body("pong")
}

/// Ready once both reference lists have loaded at least once.
#[get("/ready")]
async fn ready(state: web::Data<AppState>) -> impl Responder {
    state.references.revalidate();
    let branches = state.references.branches().await.map(drop);
    let counts = state.references.counts().await.map(drop);

    let ready = branches.is_loaded() && counts.is_loaded();

    let body = json!({ "branches": branches, "counts": counts });
    if ready {
        HttpResponse::Ok().json(body)
    } else {
        HttpResponse::ServiceUnavailable().json(body)
    }
}

pub fn init(cfg: &mut web::ServiceConfig) {
    cfg.service(ping).service(ready);
}
