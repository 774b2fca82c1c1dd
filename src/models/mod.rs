pub mod address;
pub mod message;
pub mod otp;
pub mod user;
