//! Error taxonomy for the report pipeline
//!
//! Nothing retries: every error surfaces to the caller of the query and
//! aborts it.

/// Failure to establish an authenticated session
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("login request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("login page returned HTTP {0}")]
    LoginPageStatus(u16),

    #[error("csrf token not found on login page")]
    CsrfTokenMissing,

    #[error("login rejected with HTTP {0}")]
    LoginRejected(u16),
}

/// Failure to fetch a page once authenticated
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request for {path} failed: {source}")]
    Request {
        path: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("request for {path} returned HTTP {status}")]
    Status { path: String, status: u16 },
}

/// Report page lacks the structure the parser relies on
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("report page has no section headings")]
    NoSections,

    #[error("report page has no dated report heading")]
    MissingDate,

    #[error("invalid report date {text:?}: {source}")]
    InvalidDate {
        text: String,
        #[source]
        source: chrono::ParseError,
    },
}

/// Any failure of a full query
#[derive(Debug, thiserror::Error)]
pub enum HiMamaError {
    #[error("authentication failed: {0}")]
    Auth(#[from] AuthError),

    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("parse failed for report {report_id}: {source}")]
    Parse {
        report_id: String,
        #[source]
        source: ParseError,
    },
}

pub type HiMamaResult<T> = Result<T, HiMamaError>;
