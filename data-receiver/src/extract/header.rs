//! Extraction from request headers.

use axum::http::request::Parts;

use super::{require_mapping, require_non_empty, ExtractedFields, Extractor};
use crate::error::ReceiverError;
use crate::services::Parameters;

/// Reads each configured header into its output key.
///
/// For `signature → x-signature`, the value of header `x-signature` is stored
/// under `signature`. Missing or non-UTF-8 headers become empty strings.
#[derive(Debug, Clone)]
pub struct HeaderExtractor {
    headers: Parameters,
}

impl HeaderExtractor {
    pub fn new(params: &Parameters) -> Result<Self, ReceiverError> {
        require_mapping("HeaderExtractor", params)?;
        Ok(Self {
            headers: params.clone(),
        })
    }
}

impl Extractor for HeaderExtractor {
    fn extract(&self, parts: &Parts) -> ExtractedFields {
        self.headers
            .iter()
            .map(|(key, header)| {
                let value = parts
                    .headers
                    .get(header.as_str())
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default();
                (key.clone(), value.to_string())
            })
            .collect()
    }

    fn validate(&self, fields: &ExtractedFields) -> Result<(), ReceiverError> {
        require_non_empty(fields)
    }
}
