mod error;
mod handlers;
mod middleware;
mod responses;
mod server;

pub use error::{rejection_status, AppError, ErrorBody, ErrorDetail};
pub use middleware::{AdminAuth, AuthResult};
pub use responses::*;
pub use server::{app, router, ApiServer, AppState};
