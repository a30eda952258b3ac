// Copyright 2024 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! Network-address credential operations of the context.

use packable::{unpacker::SliceUnpacker, Packable, PackableExt};

use crate::{
    context::CredContext,
    error::{Error, Result},
    signer::{Sign, Verify},
    types::{
        netcred::{NetCred, NodeAddrTable},
        protocol::ProtocolVersion,
    },
};

impl CredContext {
    /// Signs a node address table into an opaque network credential.
    pub fn create_net_cred(&self, table: &NodeAddrTable, version: ProtocolVersion) -> Result<NetCred> {
        let mut payload = Vec::new();
        // Infallible: packing into a Vec cannot fail.
        version.pack(&mut payload).unwrap();
        table.pack(&mut payload).unwrap();

        let signature = self.signer.sign(&payload)?;

        Ok(NetCred::new(payload.into_boxed_slice(), signature))
    }

    /// Verifies a packed network credential and returns the address table.
    pub fn extract_net_cred(&self, bytes: &[u8], version: ProtocolVersion) -> Result<NodeAddrTable> {
        let cred = NetCred::unpack_verified(bytes, &()).map_err(Error::from_unpack)?;

        self.signer.verify(cred.payload(), cred.signature())?;

        let mut unpacker = SliceUnpacker::new(cred.payload());
        let found = ProtocolVersion::unpack::<_, true>(&mut unpacker, &()).map_err(Error::from_unpack)?;

        if found != version {
            return Err(Error::ProtocolVersionMismatch {
                expected: *version,
                actual: *found,
            });
        }

        NodeAddrTable::unpack::<_, true>(&mut unpacker, &()).map_err(Error::from_unpack)
    }
}
