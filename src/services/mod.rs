pub mod auth;
pub mod dpop;
pub mod oauth;
