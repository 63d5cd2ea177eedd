use thiserror::Error;

/// Core error type raised while copying or overriding record attributes.
#[derive(Debug, Error)]
pub enum Error {
    /// An override names an attribute the record does not declare.
    #[error("unknown attribute '{attribute}'")]
    UnknownAttribute { attribute: String },
    /// The overridden attributes no longer describe a valid record.
    #[error("incompatible attribute value: {reason}")]
    IncompatibleValue { reason: String },
    /// The record does not serialize to a map of named attributes.
    #[error("record type {record_type} does not expose named attributes")]
    NotAnObject { record_type: &'static str },
    /// Serialization of a record or override value failed.
    #[error("encode error: {0}")]
    Encode(String),
}

/// Convenience alias for results returned by the core crate.
pub type Result<T> = std::result::Result<T, Error>;
