//! Request pipeline: request id, access logging, authentication and error shaping.

mod auth;
mod error_handler;
mod logging;
mod request_id;

pub use auth::{AuthFailure, authenticate};
pub use error_handler::{error_parts, error_response_middleware};
pub use logging::logging_middleware;
pub use request_id::{ClientMeta, REQUEST_ID_HEADER, RequestId, request_id_middleware};
