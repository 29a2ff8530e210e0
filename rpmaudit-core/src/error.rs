use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid input: {0}")]
    Input(String),

    #[error("Failed to resolve release {release}: {reason}")]
    ReleaseResolution { release: String, reason: String },

    #[error("Failed to extract packages from {pull_ref}: {reason}")]
    Extraction { pull_ref: String, reason: String },

    #[error("Availability query for {package} failed: {reason}")]
    AvailabilityQuery { package: String, reason: String },

    #[error("Reference environment error: {0}")]
    ReferenceEnvironment(String),

    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn resolution(release: &str, reason: impl ToString) -> Self {
        Error::ReleaseResolution {
            release: release.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn extraction(pull_ref: &str, reason: impl ToString) -> Self {
        Error::Extraction {
            pull_ref: pull_ref.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn query(package: &str, reason: impl ToString) -> Self {
        Error::AvailabilityQuery {
            package: package.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Whether this error is confined to a single image and may be isolated
    /// instead of aborting the run.
    pub fn is_per_image(&self) -> bool {
        matches!(
            self,
            Error::Extraction { .. } | Error::AvailabilityQuery { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
