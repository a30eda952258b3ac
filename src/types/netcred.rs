// Copyright 2024 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! Network-address credentials: opaque signed tokens carrying the node
//! address table of a job, for daemons that cannot resolve node names.

use packable::{
    error::UnpackError,
    packer::Packer,
    unpacker::Unpacker,
    Packable,
};

use crate::{
    error::Error,
    signer::CredSignature,
    types::{
        cred::MAX_BODY_LENGTH, pack_bytes_prefixed, pack_string, unpack_bytes_prefixed,
        unpack_string, unpack_vec,
    },
};

/// One node's name and reachable address.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct NodeAddr {
    /// Node name.
    pub name: String,
    /// Address in `host:port` form.
    pub addr: String,
}

impl Packable for NodeAddr {
    type UnpackError = Error;
    type UnpackVisitor = ();

    fn pack<P: Packer>(&self, packer: &mut P) -> Result<(), P::Error> {
        pack_string(&self.name, packer)?;
        pack_string(&self.addr, packer)?;

        Ok(())
    }

    fn unpack<U: Unpacker, const VERIFY: bool>(
        unpacker: &mut U,
        _visitor: &Self::UnpackVisitor,
    ) -> Result<Self, UnpackError<Self::UnpackError, U::Error>> {
        Ok(Self {
            name: unpack_string::<_, VERIFY>(unpacker)?,
            addr: unpack_string::<_, VERIFY>(unpacker)?,
        })
    }
}

/// The address table packed into a network credential.
#[derive(Clone, Debug, Default, Eq, PartialEq, derive_more::Deref, derive_more::From)]
pub struct NodeAddrTable(Vec<NodeAddr>);

impl NodeAddrTable {
    /// Address for a node name, if present.
    pub fn lookup(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| entry.addr.as_str())
    }
}

impl FromIterator<NodeAddr> for NodeAddrTable {
    fn from_iter<I: IntoIterator<Item = NodeAddr>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Packable for NodeAddrTable {
    type UnpackError = Error;
    type UnpackVisitor = ();

    fn pack<P: Packer>(&self, packer: &mut P) -> Result<(), P::Error> {
        crate::types::pack_slice(&self.0, packer)
    }

    fn unpack<U: Unpacker, const VERIFY: bool>(
        unpacker: &mut U,
        _visitor: &Self::UnpackVisitor,
    ) -> Result<Self, UnpackError<Self::UnpackError, U::Error>> {
        Ok(Self(unpack_vec::<NodeAddr, _, VERIFY>(unpacker, &())?))
    }
}

/// An opaque signed token wrapping a packed [`NodeAddrTable`].
///
/// Same outer layout as a job credential: the signed payload blob, then the
/// detached signature.
#[derive(Clone, Debug)]
pub struct NetCred {
    payload: Box<[u8]>,
    signature: CredSignature,
}

impl NetCred {
    pub(crate) fn new(payload: Box<[u8]>, signature: CredSignature) -> Self {
        Self { payload, signature }
    }

    /// The signed payload bytes.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// The detached signature over the payload.
    pub fn signature(&self) -> &CredSignature {
        &self.signature
    }
}

impl Packable for NetCred {
    type UnpackError = Error;
    type UnpackVisitor = ();

    fn pack<P: Packer>(&self, packer: &mut P) -> Result<(), P::Error> {
        pack_bytes_prefixed(&self.payload, packer)?;
        self.signature.pack(packer)?;

        Ok(())
    }

    fn unpack<U: Unpacker, const VERIFY: bool>(
        unpacker: &mut U,
        _visitor: &Self::UnpackVisitor,
    ) -> Result<Self, UnpackError<Self::UnpackError, U::Error>> {
        Ok(Self {
            payload: unpack_bytes_prefixed::<_, VERIFY>(unpacker, MAX_BODY_LENGTH)?.into_boxed_slice(),
            signature: CredSignature::unpack::<_, VERIFY>(unpacker, &())?,
        })
    }
}
