pub mod attendance;
pub mod device;
pub mod employee;
pub mod sync;

use crate::store::StoreError;
use actix_web::error::{ErrorInternalServerError, ErrorNotFound};
use tracing::error;

/// Maps a repository failure to an HTTP error, logging anything that is not a plain miss.
pub(crate) fn store_failure(e: StoreError, action: &str) -> actix_web::Error {
    match e {
        StoreError::NotFound(what) => ErrorNotFound(format!("{what} not found")),
        other => {
            error!(error = %other, action, "Store operation failed");
            ErrorInternalServerError("Internal Server Error")
        }
    }
}
