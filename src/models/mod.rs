pub mod booking;
pub mod branch;
pub mod queue;
pub mod timeslot;
