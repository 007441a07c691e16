// booking backend endpoints, relative to BOOKING_API
pub const BRANCHES_PATH: &str = "branches";
pub const CHECK_PATH: &str = "check";
pub const CREATE_PATH: &str = "create";

// reference cache keys
pub const BRANCHES_KEY: &str = "/branches";
pub const CHECK_KEY: &str = "/check";
