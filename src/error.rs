//! Process-boundary error and exit statuses.
//!
//! Everything that can stop the binary funnels into [`ImpError`], whose
//! [`exit_code`](ImpError::exit_code) follows the BSD `sysexits.h`
//! conventions:
//!
//! | Status | Meaning |
//! |--------|---------|
//! | 0 | success |
//! | 65 (`EX_DATAERR`) | an input file could not be processed |
//! | 70 (`EX_SOFTWARE`) | unexpected internal failure |
//! | 78 (`EX_CONFIG`) | bad config file or target table |
//! | 130 | interrupted by SIGINT |

use crate::config::ConfigError;
use crate::process::ProcessError;
use thiserror::Error;

pub const EXIT_PROCESSING: i32 = 65;
pub const EXIT_INTERNAL: i32 = 70;
pub const EXIT_CONFIG: i32 = 78;
pub const EXIT_INTERRUPTED: i32 = 130;

#[derive(Error, Debug)]
pub enum ImpError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("{0}")]
    Processing(#[from] ProcessError),
    #[error("Internal error: {0}")]
    Internal(String),
    #[error("Interrupted")]
    Interrupted,
}

impl ImpError {
    pub fn exit_code(&self) -> i32 {
        match self {
            ImpError::Config(_) => EXIT_CONFIG,
            ImpError::Processing(e) if e.is_configuration() => EXIT_CONFIG,
            ImpError::Processing(ProcessError::Interrupted { .. }) => EXIT_INTERRUPTED,
            ImpError::Processing(_) => EXIT_PROCESSING,
            ImpError::Internal(_) => EXIT_INTERNAL,
            ImpError::Interrupted => EXIT_INTERRUPTED,
        }
    }
}
