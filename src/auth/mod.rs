pub mod dto;
pub mod extractors;
pub mod jwt;
pub mod password;
pub mod services;

pub use jwt::JwtKeys;
pub use services::CredentialService;
