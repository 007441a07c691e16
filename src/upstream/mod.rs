pub mod client;
pub mod constants;
