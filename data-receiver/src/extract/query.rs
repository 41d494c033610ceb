//! Extraction from URL query parameters.

use axum::http::request::Parts;
use url::form_urlencoded;

use super::{require_mapping, require_non_empty, ExtractedFields, Extractor};
use crate::error::ReceiverError;
use crate::services::Parameters;

/// Reads each configured query parameter into its output key.
///
/// The first occurrence of a repeated parameter wins.
#[derive(Debug, Clone)]
pub struct QueryExtractor {
    params: Parameters,
}

impl QueryExtractor {
    pub fn new(params: &Parameters) -> Result<Self, ReceiverError> {
        require_mapping("QueryExtractor", params)?;
        Ok(Self {
            params: params.clone(),
        })
    }
}

impl Extractor for QueryExtractor {
    fn extract(&self, parts: &Parts) -> ExtractedFields {
        let query = parts.uri.query().unwrap_or_default();

        self.params
            .iter()
            .map(|(key, name)| {
                let value = form_urlencoded::parse(query.as_bytes())
                    .find(|(k, _)| k == name.as_str())
                    .map(|(_, v)| v.into_owned())
                    .unwrap_or_default();
                (key.clone(), value)
            })
            .collect()
    }

    fn validate(&self, fields: &ExtractedFields) -> Result<(), ReceiverError> {
        require_non_empty(fields)
    }
}
