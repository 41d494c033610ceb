//! Extractors pull named verification values out of an inbound request.
//!
//! An extractor is configured with a mapping of `output key → source name`,
//! for example `signature → x-signature`. Extraction never fails: a missing
//! source yields an empty string, which [`Extractor::validate`] then rejects.

pub mod header;
pub mod query;

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::http::request::Parts;
use tracing::warn;

use crate::error::ReceiverError;
use crate::services::Parameters;

pub use header::HeaderExtractor;
pub use query::QueryExtractor;

/// Field name the pipeline hands to the authenticator.
pub const SIGNATURE_FIELD: &str = "signature";

/// Values extracted from a single request, keyed by output key.
pub type ExtractedFields = BTreeMap<String, String>;

/// Derives named string fields from an inbound request.
pub trait Extractor: Send + Sync {
    /// Read the configured values out of the request head.
    fn extract(&self, parts: &Parts) -> ExtractedFields;

    /// Check the extracted values are usable.
    fn validate(&self, fields: &ExtractedFields) -> Result<(), ReceiverError>;
}

/// Build the extractor named by `class`.
///
/// Unknown class names fall back to [`EmptyExtractor`].
pub fn create_extractor(
    class: &str,
    params: &Parameters,
) -> Result<Arc<dyn Extractor>, ReceiverError> {
    match class {
        "HeaderExtractor" => Ok(Arc::new(HeaderExtractor::new(params)?)),
        "QueryExtractor" => Ok(Arc::new(QueryExtractor::new(params)?)),
        other => {
            warn!(class = %other, "extractor_class_unknown_using_empty");
            Ok(Arc::new(EmptyExtractor))
        }
    }
}

/// Extractor that returns nothing and accepts everything.
#[derive(Debug, Clone, Default)]
pub struct EmptyExtractor;

impl Extractor for EmptyExtractor {
    fn extract(&self, _parts: &Parts) -> ExtractedFields {
        ExtractedFields::new()
    }

    fn validate(&self, _fields: &ExtractedFields) -> Result<(), ReceiverError> {
        Ok(())
    }
}

/// Shared validation for the mapping extractors: the first empty field fails.
pub(crate) fn require_non_empty(fields: &ExtractedFields) -> Result<(), ReceiverError> {
    match fields.iter().find(|(_, value)| value.is_empty()) {
        Some((field, _)) => Err(ReceiverError::Validation {
            field: field.clone(),
        }),
        None => Ok(()),
    }
}

/// Reject an empty source mapping; `kind` names the extractor in the error.
pub(crate) fn require_mapping(kind: &str, params: &Parameters) -> Result<(), ReceiverError> {
    if params.is_empty() {
        return Err(ReceiverError::Config(format!(
            "{kind} requires at least one field mapping"
        )));
    }
    Ok(())
}
