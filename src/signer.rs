//! Account key handling and payload signatures.
//!
//! Trustless accounts sign `sha256(payload)` with secp256k1 and send the 65-byte
//! `r || s || v` form (`v` is the recovery parity, 0 or 1). Exchange-managed
//! accounts sign with HMAC-SHA256 keyed by the account secret. The scheme is picked
//! from the key material: a `0x`-prefixed hex key is a secp256k1 key, anything
//! else is an HMAC secret.

use std::fmt;
use std::str::FromStr as _;

use alloy::primitives::{Address, B256, Signature as EcdsaSignature, U256, hex};
use alloy::signers::SignerSync as _;
use alloy::signers::local::PrivateKeySigner;
use hmac::{Hmac, Mac as _};
use secrecy::{ExposeSecret as _, SecretString};
use serde::{Serialize, Serializer};
use sha2::{Digest as _, Sha256};

use crate::Result;
use crate::error::Error;

type HmacSha256 = Hmac<Sha256>;

const ECDSA_SIGNATURE_LEN: usize = 65;

#[non_exhaustive]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Scheme {
    Ecdsa,
    Hmac,
}

/// Signs canonical payloads with the account key.
///
/// Immutable after construction, so one instance can be shared by concurrent
/// signing calls.
#[derive(Clone)]
pub struct Signer {
    key: Key,
}

#[derive(Clone)]
enum Key {
    Ecdsa(PrivateKeySigner),
    Hmac(SecretString),
}

impl Signer {
    pub fn from_secret(secret: &SecretString) -> Result<Self> {
        let raw = secret.expose_secret().trim();
        if raw.is_empty() {
            return Err(Error::signing("private key is empty"));
        }

        let key = if raw.starts_with("0x") {
            let signer = PrivateKeySigner::from_str(raw)
                .map_err(|e| Error::signing(format!("invalid secp256k1 private key: {e}")))?;
            Key::Ecdsa(signer)
        } else {
            Key::Hmac(SecretString::from(raw))
        };

        Ok(Self { key })
    }

    #[must_use]
    pub fn scheme(&self) -> Scheme {
        match self.key {
            Key::Ecdsa(_) => Scheme::Ecdsa,
            Key::Hmac(_) => Scheme::Hmac,
        }
    }

    /// Address derived from the public key, for secp256k1 keys.
    #[must_use]
    pub fn address(&self) -> Option<Address> {
        match &self.key {
            Key::Ecdsa(signer) => Some(signer.address()),
            Key::Hmac(_) => None,
        }
    }

    pub fn sign(&self, payload: &[u8]) -> Result<Signature> {
        match &self.key {
            Key::Ecdsa(signer) => {
                let signature = signer.sign_hash_sync(&payload_digest(payload))?;
                let mut bytes = [0_u8; ECDSA_SIGNATURE_LEN];
                bytes[..32].copy_from_slice(&signature.r().to_be_bytes::<32>());
                bytes[32..64].copy_from_slice(&signature.s().to_be_bytes::<32>());
                bytes[64] = u8::from(signature.v());
                Ok(Signature::Ecdsa(bytes))
            }
            Key::Hmac(secret) => {
                let mut mac = hmac_for(secret)?;
                mac.update(payload);
                Ok(Signature::Hmac(mac.finalize().into_bytes().into()))
            }
        }
    }

    /// Checks `signature` against `payload` for this key.
    #[must_use]
    pub fn verify(&self, payload: &[u8], signature: &Signature) -> bool {
        match (&self.key, signature) {
            (Key::Ecdsa(signer), Signature::Ecdsa(bytes)) => {
                verify_ecdsa(payload, bytes, signer.address())
            }
            (Key::Hmac(secret), Signature::Hmac(bytes)) => verify_hmac(payload, bytes, secret),
            _ => false,
        }
    }
}

impl fmt::Debug for Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = f.debug_struct("Signer");
        debug.field("scheme", &self.scheme());
        if let Some(address) = self.address() {
            debug.field("address", &address);
        }
        debug.finish_non_exhaustive()
    }
}

/// Verifies a 65-byte `r || s || v` signature by recovering the signing address.
#[must_use]
pub fn verify_ecdsa(payload: &[u8], signature: &[u8], expected: Address) -> bool {
    if signature.len() != ECDSA_SIGNATURE_LEN {
        return false;
    }
    let parity = match signature[64] {
        0 | 27 => false,
        1 | 28 => true,
        _ => return false,
    };
    let signature = EcdsaSignature::new(
        U256::from_be_slice(&signature[..32]),
        U256::from_be_slice(&signature[32..64]),
        parity,
    );
    signature
        .recover_address_from_prehash(&payload_digest(payload))
        .is_ok_and(|recovered| recovered == expected)
}

/// Verifies an HMAC-SHA256 tag in constant time.
#[must_use]
pub fn verify_hmac(payload: &[u8], signature: &[u8], secret: &SecretString) -> bool {
    let Ok(mut mac) = hmac_for(secret) else {
        return false;
    };
    mac.update(payload);
    mac.verify_slice(signature).is_ok()
}

fn payload_digest(payload: &[u8]) -> B256 {
    B256::from_slice(&Sha256::digest(payload))
}

fn hmac_for(secret: &SecretString) -> Result<HmacSha256> {
    HmacSha256::new_from_slice(secret.expose_secret().as_bytes())
        .map_err(|e| Error::signing(format!("unusable hmac key: {e}")))
}

/// Signature over one canonical payload.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Signature {
    Ecdsa([u8; ECDSA_SIGNATURE_LEN]),
    Hmac([u8; 32]),
}

impl Signature {
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Signature::Ecdsa(bytes) => bytes,
            Signature::Hmac(bytes) => bytes,
        }
    }

    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.as_bytes())
    }
}

impl Serialize for Signature {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

/// Canonical bytes together with their signature. Built once per request and
/// consumed by it.
#[non_exhaustive]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SignedPayload {
    pub canonical_bytes: Vec<u8>,
    pub signature: Signature,
    pub account_id: u64,
}

impl SignedPayload {
    pub(crate) fn sign(signer: &Signer, account_id: u64, canonical_bytes: Vec<u8>) -> Result<Self> {
        let signature = signer.sign(&canonical_bytes)?;
        Ok(Self {
            canonical_bytes,
            signature,
            account_id,
        })
    }
}
