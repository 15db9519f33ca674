//! Signed operation requests.
//!
//! The caller of an operation is the ed25519 public key that signed it, so a
//! request can only ever act on behalf of its signer.

use base64::{engine::general_purpose, Engine as _};
use dmt_ledger::{AccountId, Operation};
use ed25519_dalek::{Signature, Signer, SigningKey, VerifyingKey};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

const DOMAIN_TAG: &[u8] = b"dmt-request";

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SignedRequest {
    pub caller: AccountId,
    pub nonce: u64,
    pub operation: Operation,
    /// Base64 ed25519 signature over [`SignedRequest::digest`].
    pub signature: String,
}

#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("failed to encode operation: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("caller {0} is not a valid ed25519 public key")]
    InvalidKey(AccountId),
    #[error("signature is not valid base64 or has the wrong length")]
    MalformedSignature,
    #[error("signature does not match caller {0}")]
    InvalidSignature(AccountId),
}

impl SignedRequest {
    pub fn sign(sk: &SigningKey, nonce: u64, operation: Operation) -> Result<Self, RequestError> {
        let caller = AccountId::new(sk.verifying_key().to_bytes());
        let digest = request_digest(&caller, nonce, &operation)?;
        let signature = sk.sign(&digest);
        Ok(Self {
            caller,
            nonce,
            operation,
            signature: general_purpose::STANDARD.encode(signature.to_bytes()),
        })
    }

    /// sha256(tag || caller || nonce_le || json(operation))
    pub fn digest(&self) -> Result<[u8; 32], RequestError> {
        request_digest(&self.caller, self.nonce, &self.operation)
    }

    pub fn verify(&self) -> Result<(), RequestError> {
        let key = VerifyingKey::from_bytes(self.caller.as_bytes())
            .map_err(|_| RequestError::InvalidKey(self.caller))?;
        let raw = general_purpose::STANDARD
            .decode(&self.signature)
            .map_err(|_| RequestError::MalformedSignature)?;
        let signature =
            Signature::from_slice(&raw).map_err(|_| RequestError::MalformedSignature)?;
        let digest = self.digest()?;
        key.verify_strict(&digest, &signature)
            .map_err(|_| RequestError::InvalidSignature(self.caller))
    }
}

fn request_digest(
    caller: &AccountId,
    nonce: u64,
    operation: &Operation,
) -> Result<[u8; 32], RequestError> {
    let mut h = Sha256::new();
    h.update(DOMAIN_TAG);
    h.update(caller.as_bytes());
    h.update(nonce.to_le_bytes());
    h.update(serde_json::to_vec(operation)?);
    Ok(h.finalize().into())
}
