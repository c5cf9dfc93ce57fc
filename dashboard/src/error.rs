pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    UtilsError(#[from] chainwatch_utils::Error),

    #[error(transparent)]
    Query(#[from] QueryError),
}

impl Error {
    pub fn is_connect(&self) -> bool {
        match self {
            Self::UtilsError(error) => error.is_connect(),
            Self::Query(_) => false,
        }
    }

    /// The query was rejected before anything was sent.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Query(error) if error.is_validation())
    }
}

/// User-facing outcome of a failed history query. The `Display` output is
/// the exact message shown to the user.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    #[error("token and date range required")]
    MissingInput,

    #[error("start cannot be after end")]
    StartAfterEnd,

    #[error("start cannot equal end")]
    StartEqualsEnd,

    #[error("failed to fetch historical data")]
    FetchFailed,
}

impl QueryError {
    /// Validation errors are raised before any request is issued.
    pub fn is_validation(&self) -> bool {
        !matches!(self, QueryError::FetchFailed)
    }
}
