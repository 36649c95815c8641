use thiserror::Error;

use crate::schema::Field;
use crate::types::EntityId;

/// Fatal ingestion failure. No timeline is produced when one of these is returned.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// A required column could not be found under any of its accepted names.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("missing required column {field} (accepted names: {})", .field.aliases().join(", "))]
pub struct SchemaError {
    pub field: Field,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("telemetry document is empty")]
    Empty,
    #[error("telemetry document has a header but no data rows")]
    NoDataRows,
}

/// Non-fatal anomaly absorbed during ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Warning {
    /// A cell could not be coerced; the field's default was used instead.
    #[error("line {line}: could not read {field} from {value:?}, using default")]
    RecordCoercion {
        /// 1-based line in the source document, header and blank lines included.
        line: usize,
        field: Field,
        value: String,
    },
    /// A combat counter went backwards between consecutive records of one entity.
    #[error("{entity}: {counter} decreased from {from} to {to} at {timestamp_ms}ms")]
    MalformedCounter {
        entity: EntityId,
        counter: &'static str,
        from: u32,
        to: u32,
        timestamp_ms: i64,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
