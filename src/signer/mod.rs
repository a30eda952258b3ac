// Copyright 2024 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! Signing backends for credential bodies.
//!
//! A context owns exactly one [`Signer`]; the packing halves of credential
//! creation are common code, so a backend only has to provide the
//! cryptographic pair: sign bytes, verify bytes. Backends must be reentrant;
//! the context invokes them without further locking.

/// Module for signing with an in-memory Ed25519 keypair.
pub mod ed25519;
/// Module for the backend that refuses every operation.
pub mod placeholder;

use core::fmt;

use packable::{
    error::UnpackError,
    packer::Packer,
    unpacker::Unpacker,
    Packable,
};
use zeroize::Zeroizing;

pub use self::{ed25519::Ed25519Signer, placeholder::PlaceholderSigner};
use crate::{
    error::{Error, Result},
    types::{pack_bytes_prefixed, unpack_bytes_prefixed},
};

/// An opaque detached signature produced by a signing backend.
#[derive(Clone, Eq, PartialEq, Hash)]
pub struct CredSignature(Box<[u8]>);

impl CredSignature {
    /// Length of the signature in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns whether the signature is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u8>> for CredSignature {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes.into_boxed_slice())
    }
}

impl AsRef<[u8]> for CredSignature {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for CredSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CredSignature({})", prefix_hex::encode(self.0.as_ref()))
    }
}

impl Packable for CredSignature {
    type UnpackError = Error;
    type UnpackVisitor = ();

    fn pack<P: Packer>(&self, packer: &mut P) -> core::result::Result<(), P::Error> {
        pack_bytes_prefixed(&self.0, packer)
    }

    fn unpack<U: Unpacker, const VERIFY: bool>(
        unpacker: &mut U,
        _visitor: &Self::UnpackVisitor,
    ) -> core::result::Result<Self, UnpackError<Self::UnpackError, U::Error>> {
        Ok(Self::from(unpack_bytes_prefixed::<_, VERIFY>(
            unpacker,
            crate::types::cred::MAX_SIGNATURE_LENGTH,
        )?))
    }
}

/// Signs credential bodies.
pub trait Sign: Send + Sync {
    /// Signs `msg` and returns the detached signature.
    fn sign(&self, msg: &[u8]) -> Result<CredSignature>;
}

/// Verifies detached credential signatures.
pub trait Verify: Send + Sync {
    /// Checks `signature` over `msg`.
    fn verify(&self, msg: &[u8], signature: &CredSignature) -> Result<()>;
}

/// The signing backend of a credential context.
#[derive(Debug)]
pub enum Signer {
    /// Signs with an in-memory Ed25519 keypair.
    Ed25519(Ed25519Signer),
    /// Refuses every operation; the backend of an unconfigured context.
    Placeholder(PlaceholderSigner),
}

impl Sign for Signer {
    fn sign(&self, msg: &[u8]) -> Result<CredSignature> {
        match self {
            Self::Ed25519(signer) => signer.sign(msg),
            Self::Placeholder(signer) => signer.sign(msg),
        }
    }
}

impl Verify for Signer {
    fn verify(&self, msg: &[u8], signature: &CredSignature) -> Result<()> {
        match self {
            Self::Ed25519(signer) => signer.verify(msg, signature),
            Self::Placeholder(signer) => signer.verify(msg, signature),
        }
    }
}

impl From<Ed25519Signer> for Signer {
    fn from(signer: Ed25519Signer) -> Self {
        Self::Ed25519(signer)
    }
}

/// Serializable selector for a signing backend.
#[derive(Clone, serde::Serialize, serde::Deserialize)]
pub enum SignerDto {
    /// An Ed25519 backend, seeded from a `0x`-prefixed hex string.
    #[serde(alias = "ed25519")]
    Ed25519(Zeroizing<String>),
    /// The placeholder backend.
    #[serde(alias = "placeholder")]
    Placeholder,
}

impl fmt::Debug for SignerDto {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ed25519(_) => f.debug_tuple("Ed25519").field(&"<redacted seed>").finish(),
            Self::Placeholder => f.debug_tuple("Placeholder").finish(),
        }
    }
}

impl TryFrom<&SignerDto> for Signer {
    type Error = Error;

    fn try_from(dto: &SignerDto) -> Result<Self> {
        Ok(match dto {
            SignerDto::Ed25519(seed) => Self::Ed25519(Ed25519Signer::try_from_hex_seed(seed)?),
            SignerDto::Placeholder => Self::Placeholder(PlaceholderSigner),
        })
    }
}
