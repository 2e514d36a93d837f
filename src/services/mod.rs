pub mod books;
pub mod categories;
pub mod invoices;
pub mod payments;
pub mod reports;
pub mod storage;
pub mod users;

use crate::errors::ServiceError;

/// Pages are 1-based at the API boundary; a zero page or size is caller
/// error, not an empty result.
pub(crate) fn check_pagination(page: u64, size: u64) -> Result<(), ServiceError> {
    if page < 1 {
        return Err(ServiceError::ValidationError(
            "page must be a positive integer".to_string(),
        ));
    }
    if size < 1 {
        return Err(ServiceError::ValidationError(
            "size must be a positive integer".to_string(),
        ));
    }
    Ok(())
}
