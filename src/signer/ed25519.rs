// Copyright 2024 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! Implementation of [`Ed25519Signer`].

use crypto::signatures::ed25519::{PublicKey, SecretKey, Signature};

use crate::{
    error::{Error, Result},
    signer::{CredSignature, Sign, Verify},
};

/// Signing backend holding an Ed25519 keypair in memory.
///
/// Both the controller and the node daemons are seeded with the same cluster
/// key, so one backend covers signing and verification.
pub struct Ed25519Signer {
    secret: SecretKey,
}

impl Ed25519Signer {
    /// Generates a backend with a fresh random keypair.
    pub fn generate() -> Result<Self> {
        Ok(Self {
            secret: SecretKey::generate()?,
        })
    }

    /// Creates a backend from a raw 32-byte seed.
    pub fn from_seed(seed: [u8; SecretKey::LENGTH]) -> Self {
        Self {
            secret: SecretKey::from_bytes(&seed),
        }
    }

    /// Creates a backend from a `0x`-prefixed hex seed.
    pub fn try_from_hex_seed(seed: &str) -> Result<Self> {
        let bytes: [u8; SecretKey::LENGTH] =
            prefix_hex::decode(seed).map_err(|e| Error::Decode(e.to_string()))?;

        Ok(Self::from_seed(bytes))
    }

    /// The public half of the keypair.
    pub fn public_key(&self) -> PublicKey {
        self.secret.public_key()
    }
}

impl core::fmt::Debug for Ed25519Signer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_tuple("Ed25519Signer").finish()
    }
}

impl Sign for Ed25519Signer {
    fn sign(&self, msg: &[u8]) -> Result<CredSignature> {
        Ok(CredSignature::from(self.secret.sign(msg).to_bytes().to_vec()))
    }
}

impl Verify for Ed25519Signer {
    fn verify(&self, msg: &[u8], signature: &CredSignature) -> Result<()> {
        let bytes: [u8; Signature::LENGTH] = signature
            .as_ref()
            .try_into()
            .map_err(|_| Error::InvalidSignature)?;

        if self.secret.public_key().verify(&Signature::from_bytes(bytes), msg) {
            Ok(())
        } else {
            Err(Error::InvalidSignature)
        }
    }
}
