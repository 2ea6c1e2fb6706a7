use crate::period::PeriodMode;

#[derive(Debug, thiserror::Error)]
pub enum RecapError {
    #[error("invalid periode {periode:?} for mode {mode}")]
    InvalidPeriod { periode: String, mode: PeriodMode },

    #[error("invalid page {0}: pages start at 1")]
    InvalidPage(u32),

    #[error("invalid page size {size}: must be between 1 and {max}")]
    InvalidPageSize { size: u32, max: u32 },

    #[error("failed to read roster or attendance: {0}")]
    DataAccess(#[from] sqlx::Error),

    #[error("failed to read {path}: {source}")]
    Source {
        path: String,
        #[source]
        source: csv::Error,
    },
}

impl RecapError {
    /// Caller mistakes that no retry will fix.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            RecapError::InvalidPeriod { .. }
                | RecapError::InvalidPage(_)
                | RecapError::InvalidPageSize { .. }
        )
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, RecapError::DataAccess(_))
    }
}
