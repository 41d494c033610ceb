//! Authenticators decide whether a message matches the signature sent with it.

pub mod signer;

use std::sync::Arc;

use tracing::warn;

use crate::error::ReceiverError;
use crate::services::Parameters;

pub use signer::{HashAlgorithm, SignatureEncoding, Signer};

/// Verifies a raw message against a caller-supplied signature.
pub trait Authenticator: Send + Sync {
    fn authenticate(&self, message: &[u8], signature: &str) -> Result<(), ReceiverError>;
}

/// Build the authenticator named by `class`.
///
/// Unknown class names fall back to [`EmptyAuthenticator`].
pub fn create_authenticator(
    class: &str,
    params: &Parameters,
) -> Result<Arc<dyn Authenticator>, ReceiverError> {
    match class {
        "Signer" => Ok(Arc::new(Signer::from_params(params)?)),
        other => {
            warn!(class = %other, "authenticator_class_unknown_using_empty");
            Ok(Arc::new(EmptyAuthenticator))
        }
    }
}

/// Accepts every message.
#[derive(Debug, Clone, Default)]
pub struct EmptyAuthenticator;

impl Authenticator for EmptyAuthenticator {
    fn authenticate(&self, _message: &[u8], _signature: &str) -> Result<(), ReceiverError> {
        Ok(())
    }
}
