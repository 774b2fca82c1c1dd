pub mod address_service;
pub mod mail_service;
pub mod message_constants;
pub mod message_service;
pub mod otp_service;
pub mod password;
pub mod token_service;
pub mod user_service;
