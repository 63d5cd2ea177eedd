use serde::Serialize;
use serde::de::DeserializeOwned;

/// A record type that blueprints can produce.
///
/// The serde attribute names of the record are its top-level attributes: they
/// are what overrides address, what the copier transfers, and what storage
/// adapters receive as columns.
///
/// Attributes are whatever the record serializes. A field marked
/// `#[serde(skip_serializing_if = ..)]` is absent from the attribute map while
/// it is skipped, so an override naming it then fails as an unknown attribute.
///
/// ```
/// use fixtura_core::Record;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Debug, Clone, Serialize, Deserialize)]
/// struct Badge {
///     code: String,
///     label: String,
/// }
///
/// impl Record for Badge {
///     fn identity_field() -> Option<&'static str> {
///         Some("code")
///     }
/// }
///
/// assert_eq!(Badge::identity_field(), Some("code"));
/// ```
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Attribute explicitly tagged as the identity of the record.
    ///
    /// When `None`, the factory falls back to its configured default identity
    /// attribute name.
    fn identity_field() -> Option<&'static str> {
        None
    }
}
