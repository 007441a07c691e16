pub mod form;
pub mod reference;
