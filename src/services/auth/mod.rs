pub mod jwt;
pub mod token_issuer;

pub use jwt::{IssuerError, JwtIssuer};
pub use token_issuer::{IssuedAccessToken, TokenIssuer};
