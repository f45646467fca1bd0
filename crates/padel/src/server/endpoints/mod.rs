pub mod auth;
pub mod classes;
pub mod pairing;
pub mod status;
pub mod waitlist;
