// Copyright 2024 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! Implementation of [`PlaceholderSigner`].

use crate::{
    error::{Error, Result},
    signer::{CredSignature, Sign, Verify},
};

/// Backend of a context that has no signing plugin configured. Every
/// operation fails with [`Error::BackendUnavailable`].
#[derive(Debug, Default)]
pub struct PlaceholderSigner;

impl Sign for PlaceholderSigner {
    fn sign(&self, _msg: &[u8]) -> Result<CredSignature> {
        Err(Error::BackendUnavailable)
    }
}

impl Verify for PlaceholderSigner {
    fn verify(&self, _msg: &[u8], _signature: &CredSignature) -> Result<()> {
        Err(Error::BackendUnavailable)
    }
}
