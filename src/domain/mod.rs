//! Domain models - report data and error taxonomy
//!
//! - `types` - `Report`, `DataPoint`, `LatestMap` and friends
//! - `error` - `AuthError`, `FetchError`, `ParseError`, `HiMamaError`

pub mod error;
pub mod types;

pub use error::{AuthError, FetchError, HiMamaError, HiMamaResult, ParseError};
pub use types::{ChildData, DataPoint, Field, FlatRecord, LatestEntry, LatestMap, Report, ReportId};
