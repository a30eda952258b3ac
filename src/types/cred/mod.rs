// Copyright 2024 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! Job credentials: the signed authorization a controller hands to compute
//! nodes ahead of a step launch.

pub mod args;
pub mod projection;

use getset::{CopyGetters, Getters};
use packable::{
    error::{UnpackError, UnpackErrorExt},
    packer::Packer,
    unpacker::Unpacker,
    Packable, PackableExt,
};

pub use self::{
    args::JobCredArgs,
    projection::{node_bit_range, rep_count_index, NodeAllocation},
};
use crate::{
    error::Error,
    signer::CredSignature,
    types::{
        identity::Identity, pack_bytes_prefixed, protocol::ProtocolVersion, unpack_bytes_prefixed,
    },
};

pub(crate) const MAX_BODY_LENGTH: usize = 1 << 24;
pub(crate) const MAX_SIGNATURE_LENGTH: usize = 64 * 1024;

/// The signed body of a job credential: version tag, creation time and args.
///
/// This is the byte region the signature covers. Once signed it is cached on
/// the credential verbatim; later mutation of the decoded args never reaches
/// the wire.
pub(crate) struct CredBody {
    pub(crate) version: ProtocolVersion,
    pub(crate) ctime: u64,
    pub(crate) args: JobCredArgs,
}

impl Packable for CredBody {
    type UnpackError = Error;
    type UnpackVisitor = ProtocolVersion;

    fn pack<P: Packer>(&self, packer: &mut P) -> Result<(), P::Error> {
        self.version.pack(packer)?;
        self.ctime.pack(packer)?;
        self.args.pack(packer)?;

        // The enriched identity entered the layout with a protocol revision.
        if self.version >= ProtocolVersion::WITH_IDENTITY {
            match &self.args.id {
                None => 0u8.pack(packer)?,
                Some(id) => {
                    1u8.pack(packer)?;
                    id.pack(packer)?;
                }
            }
        }

        Ok(())
    }

    fn unpack<U: Unpacker, const VERIFY: bool>(
        unpacker: &mut U,
        visitor: &Self::UnpackVisitor,
    ) -> Result<Self, UnpackError<Self::UnpackError, U::Error>> {
        let version = ProtocolVersion::unpack::<_, VERIFY>(unpacker, &())?;

        if VERIFY && version != *visitor {
            return Err(UnpackError::Packable(Error::ProtocolVersionMismatch {
                expected: **visitor,
                actual: *version,
            }));
        }

        let ctime = u64::unpack::<_, VERIFY>(unpacker, &()).coerce()?;
        let mut args = JobCredArgs::unpack::<_, VERIFY>(unpacker, &())?;

        if version >= ProtocolVersion::WITH_IDENTITY {
            args.id = match u8::unpack::<_, VERIFY>(unpacker, &()).coerce()? {
                0 => None,
                1 => Some(Identity::unpack::<_, VERIFY>(unpacker, &())?),
                tag => {
                    return Err(UnpackError::Packable(Error::Decode(format!(
                        "invalid option tag {tag}"
                    ))))
                }
            };
        }

        Ok(Self { version, ctime, args })
    }
}

/// A signed, time-limited authorization to launch one job step.
///
/// Credentials are immutable once constructed; concurrent readers share them
/// through `Arc`. The packed body is cached at exactly one protocol version
/// and is authoritative on the wire.
#[derive(Clone, Debug, Getters, CopyGetters)]
pub struct JobCred {
    /// The authorization payload.
    #[getset(get = "pub")]
    args: JobCredArgs,
    /// Unix seconds at which the controller signed the credential.
    #[getset(get_copy = "pub")]
    ctime: u64,
    /// Whether the signature has been checked on this side of the wire.
    #[getset(get_copy = "pub")]
    verified: bool,
    /// Protocol version the cached body was packed at.
    #[getset(get_copy = "pub")]
    buf_version: ProtocolVersion,
    buffer: Box<[u8]>,
    signature: Option<CredSignature>,
}

impl JobCred {
    pub(crate) fn new(
        args: JobCredArgs,
        ctime: u64,
        buffer: Box<[u8]>,
        buf_version: ProtocolVersion,
        signature: Option<CredSignature>,
    ) -> Self {
        Self {
            args,
            ctime,
            verified: false,
            buf_version,
            buffer,
            signature,
        }
    }

    pub(crate) fn mark_verified(&mut self) {
        self.verified = true;
    }

    /// The cached packed body the signature covers.
    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    /// The detached signature, if the credential was signed.
    pub fn signature(&self) -> Option<&CredSignature> {
        self.signature.as_ref()
    }

    /// Unix timestamp after which a window of `expire_window` seconds rejects
    /// the credential.
    pub fn expires_at(&self, expire_window: u64) -> u64 {
        self.ctime.saturating_add(expire_window)
    }

    /// Packs the credential for the wire by copying the cached body; the
    /// signing backend is not consulted again.
    ///
    /// Requires a signature and the exact protocol version the body was
    /// created at.
    pub fn pack_for_wire(&self, version: ProtocolVersion) -> Result<Vec<u8>, Error> {
        if version != self.buf_version {
            return Err(Error::ProtocolVersionMismatch {
                expected: *self.buf_version,
                actual: *version,
            });
        }
        if self.signature.is_none() {
            return Err(Error::InvalidCredential);
        }

        Ok(self.pack_to_vec())
    }
}

impl Packable for JobCred {
    type UnpackError = Error;
    type UnpackVisitor = ProtocolVersion;

    fn pack<P: Packer>(&self, packer: &mut P) -> Result<(), P::Error> {
        pack_bytes_prefixed(&self.buffer, packer)?;
        match &self.signature {
            None => 0u32.pack(packer),
            Some(signature) => pack_bytes_prefixed(signature.as_ref(), packer),
        }
    }

    fn unpack<U: Unpacker, const VERIFY: bool>(
        unpacker: &mut U,
        visitor: &Self::UnpackVisitor,
    ) -> Result<Self, UnpackError<Self::UnpackError, U::Error>> {
        let buffer = unpack_bytes_prefixed::<_, VERIFY>(unpacker, MAX_BODY_LENGTH)?;
        let sig_bytes = unpack_bytes_prefixed::<_, VERIFY>(unpacker, MAX_SIGNATURE_LENGTH)?;

        let body = CredBody::unpack_verified(buffer.as_slice(), visitor)
            .map_err(|e| UnpackError::Packable(Error::from_unpack(e)))?;

        Ok(Self {
            args: body.args,
            ctime: body.ctime,
            verified: false,
            buf_version: body.version,
            buffer: buffer.into_boxed_slice(),
            signature: (!sig_bytes.is_empty()).then(|| CredSignature::from(sig_bytes)),
        })
    }
}
