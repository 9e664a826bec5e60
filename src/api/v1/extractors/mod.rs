pub mod dpop;

pub use dpop::{DpopExtractor, DpopRequest};
