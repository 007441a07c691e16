pub mod availability;
pub mod controller;
pub mod notification;
pub mod validation;
