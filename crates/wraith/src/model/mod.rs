//! Immutable request/response value model and the pure matching predicate.

mod body;
mod matcher;
mod request;
mod response;

pub use body::{BodyContent, BodyPattern};
pub use matcher::matches;
pub use request::{AppRequest, HeaderlessKey, RequestPattern, ValueMatcher};
pub use response::{AppResponse, DefaultResponse, ResponseProducer};
