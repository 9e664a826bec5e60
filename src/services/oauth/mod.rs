pub mod access_request;
pub mod arguments;

pub use access_request::{BindingMode, HttpTarget, TokenRequest};
pub use arguments::Arguments;
