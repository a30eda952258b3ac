// Copyright 2024 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! Broadcast credentials: one signed authorization per file-broadcast
//! session, reused across every block of the transfer.

use bitflags::bitflags;
use getset::{CopyGetters, Getters};
use packable::{
    error::{UnpackError, UnpackErrorExt},
    packer::Packer,
    unpacker::Unpacker,
    Packable,
};

use crate::{
    error::Error,
    signer::CredSignature,
    types::{
        nodelist::NodeList, pack_slice, pack_string, protocol::ProtocolVersion, step::StepId,
        unpack_string, unpack_vec,
    },
};

bitflags! {
    /// Flags a broadcast block carries into credential extraction.
    #[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
    pub struct SbcastFlags: u16 {
        /// The block belongs to a shared object shipped alongside the main
        /// file; admission rides on the cache record seeded by the main
        /// transfer instead of a fresh verification.
        const SHARED_OBJECT = 1 << 0;
    }
}

/// What a caller asks the controller to put into a broadcast credential.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SbcastCredArgs {
    /// The step the broadcast belongs to.
    pub step_id: StepId,
    /// Requesting uid.
    pub uid: u32,
    /// Requesting gid.
    pub gid: u32,
    /// Resolved user name; enrichment fills it when absent.
    pub user_name: Option<String>,
    /// Supplementary gids; enrichment fills them when empty.
    pub gids: Vec<u32>,
    /// Nodes the broadcast may reach.
    pub nodes: NodeList,
    /// Unix timestamp after which the credential is dead.
    pub expiration: u64,
}

/// A signed authorization for one file-broadcast session.
#[derive(Clone, Debug, Getters, CopyGetters)]
pub struct SbcastCred {
    /// Protocol version the credential was created at.
    #[getset(get_copy = "pub")]
    version: ProtocolVersion,
    /// Unix seconds at which the credential was signed.
    #[getset(get_copy = "pub")]
    ctime: u64,
    /// Unix timestamp after which the credential is dead.
    #[getset(get_copy = "pub")]
    expiration: u64,
    /// The step the broadcast belongs to.
    #[getset(get_copy = "pub")]
    step_id: StepId,
    /// Broadcasting uid.
    #[getset(get_copy = "pub")]
    uid: u32,
    /// Broadcasting gid.
    #[getset(get_copy = "pub")]
    gid: u32,
    /// Resolved user name.
    #[getset(get = "pub")]
    user_name: String,
    /// Supplementary gids.
    #[getset(get = "pub")]
    gids: Vec<u32>,
    /// Nodes the broadcast may reach.
    #[getset(get = "pub")]
    nodes: NodeList,
    /// Whether the signature has been checked on this side of the wire.
    #[getset(get_copy = "pub")]
    verified: bool,
    signature: CredSignature,
}

/// The fields of a broadcast credential a receiving daemon hands to the
/// transfer machinery, deep-copied out of the credential.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SbcastInfo {
    /// The step the broadcast belongs to.
    pub step_id: StepId,
    /// Broadcasting uid.
    pub uid: u32,
    /// Broadcasting gid.
    pub gid: u32,
    /// Resolved user name.
    pub user_name: String,
    /// Supplementary gids.
    pub gids: Vec<u32>,
    /// Nodes the broadcast may reach.
    pub nodes: NodeList,
}

impl SbcastCred {
    pub(crate) fn new_unsigned(
        args: SbcastCredArgs,
        user_name: String,
        gids: Vec<u32>,
        ctime: u64,
        version: ProtocolVersion,
    ) -> Self {
        Self {
            version,
            ctime,
            expiration: args.expiration,
            step_id: args.step_id,
            uid: args.uid,
            gid: args.gid,
            user_name,
            gids,
            nodes: args.nodes,
            verified: false,
            signature: CredSignature::from(Vec::new()),
        }
    }

    pub(crate) fn attach_signature(&mut self, signature: CredSignature) {
        self.signature = signature;
    }

    pub(crate) fn mark_verified(&mut self) {
        self.verified = true;
    }

    /// The detached signature over the credential body.
    pub fn signature(&self) -> &CredSignature {
        &self.signature
    }

    /// Deep-copies the authorization fields out of the credential.
    pub fn to_info(&self) -> SbcastInfo {
        SbcastInfo {
            step_id: self.step_id,
            uid: self.uid,
            gid: self.gid,
            user_name: self.user_name.clone(),
            gids: self.gids.clone(),
            nodes: self.nodes.clone(),
        }
    }

    /// Packs the signed body region: every field except the signature.
    ///
    /// There is a single body layout so far; a future protocol revision adds
    /// its branch above the current one.
    pub(crate) fn pack_body<P: Packer>(
        &self,
        packer: &mut P,
        _version: ProtocolVersion,
    ) -> Result<(), P::Error> {
        self.ctime.pack(packer)?;
        self.expiration.pack(packer)?;
        self.step_id.pack(packer)?;
        self.uid.pack(packer)?;
        self.gid.pack(packer)?;
        pack_string(&self.user_name, packer)?;
        pack_slice(&self.gids, packer)?;
        self.nodes.pack(packer)?;

        Ok(())
    }

    /// The body bytes the signature covers.
    pub(crate) fn body_to_vec(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        // Infallible: packing into a Vec cannot fail.
        self.pack_body(&mut bytes, self.version).unwrap();

        bytes
    }
}

impl Packable for SbcastCred {
    type UnpackError = Error;
    type UnpackVisitor = ProtocolVersion;

    fn pack<P: Packer>(&self, packer: &mut P) -> Result<(), P::Error> {
        self.version.pack(packer)?;
        self.pack_body(packer, self.version)?;
        self.signature.pack(packer)?;

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
        let expiration = u64::unpack::<_, VERIFY>(unpacker, &()).coerce()?;
        let step_id = StepId::unpack::<_, VERIFY>(unpacker, &())?;
        let uid = u32::unpack::<_, VERIFY>(unpacker, &()).coerce()?;
        let gid = u32::unpack::<_, VERIFY>(unpacker, &()).coerce()?;
        let user_name = unpack_string::<_, VERIFY>(unpacker)?;
        let gids = unpack_vec::<u32, _, VERIFY>(unpacker, &())?;
        let nodes = NodeList::unpack::<_, VERIFY>(unpacker, &())?;
        let signature = CredSignature::unpack::<_, VERIFY>(unpacker, &())?;

        Ok(Self {
            version,
            ctime,
            expiration,
            step_id,
            uid,
            gid,
            user_name,
            gids,
            nodes,
            verified: false,
            signature,
        })
    }
}
