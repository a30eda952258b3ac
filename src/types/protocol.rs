// Copyright 2024 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! The two-byte wire protocol tag carried with every packed credential.

use core::borrow::Borrow;

use packable::{
    error::{UnpackError, UnpackErrorExt},
    packer::Packer,
    unpacker::Unpacker,
    Packable,
};

use crate::error::Error;

/// A credential wire protocol version.
///
/// Every packed credential starts with its version tag; unpacking a credential
/// at a different version than the caller requested is a typed error, never a
/// silent reinterpretation.
#[derive(
    Copy,
    Clone,
    Debug,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    Hash,
    derive_more::From,
    derive_more::Deref,
    derive_more::Display,
    serde::Serialize,
    serde::Deserialize,
)]
pub struct ProtocolVersion(u16);

impl ProtocolVersion {
    /// The oldest version this crate still decodes.
    pub const MIN: Self = Self(1);
    /// First version that carries the enriched identity in the credential body.
    pub const WITH_IDENTITY: Self = Self(2);
    /// The version new credentials are packed at.
    pub const CURRENT: Self = Self(2);

    /// Returns whether the version is within the supported decode range.
    pub fn is_supported(self) -> bool {
        (Self::MIN.0..=Self::CURRENT.0).contains(&self.0)
    }
}

impl Default for ProtocolVersion {
    fn default() -> Self {
        Self::CURRENT
    }
}

// This implementation is required to make [`ProtocolVersion`] a [`Packable`] visitor.
impl Borrow<()> for ProtocolVersion {
    fn borrow(&self) -> &() {
        &()
    }
}

impl Packable for ProtocolVersion {
    type UnpackError = Error;
    type UnpackVisitor = ();

    fn pack<P: Packer>(&self, packer: &mut P) -> Result<(), P::Error> {
        self.0.pack(packer)
    }

    fn unpack<U: Unpacker, const VERIFY: bool>(
        unpacker: &mut U,
        _visitor: &Self::UnpackVisitor,
    ) -> Result<Self, UnpackError<Self::UnpackError, U::Error>> {
        let version = Self(u16::unpack::<_, VERIFY>(unpacker, &()).coerce()?);

        if VERIFY && !version.is_supported() {
            return Err(UnpackError::Packable(Error::ProtocolVersionMismatch {
                expected: *Self::CURRENT,
                actual: *version,
            }));
        }

        Ok(version)
    }
}
