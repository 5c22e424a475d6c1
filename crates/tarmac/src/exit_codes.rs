//! Exit codes for the CLI

use tarmac_core::TarmacError;

/// General error
pub const ERROR: i32 = 1;

/// Exit code for an error that reached `main`
///
/// Library errors carry their own code; anything else is a general error.
pub fn for_error(err: &anyhow::Error) -> i32 {
    err.downcast_ref::<TarmacError>()
        .map(TarmacError::exit_code)
        .unwrap_or(ERROR)
}
