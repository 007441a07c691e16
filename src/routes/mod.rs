pub mod form;
pub mod health;
pub mod reference;

use actix_web::web;

pub fn init(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/health").configure(health::init))
        .service(web::scope("/reference").configure(reference::init))
        .service(web::scope("/form").configure(form::init));
}
