// Copyright 2024 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! Broadcast credential operations of the context.

use log::debug;
use packable::PackableExt;

use crate::{
    context::{cache::signature_hash, CredContext},
    error::{Error, Result},
    signer::{Sign, Verify},
    types::{
        identity::NOBODY,
        protocol::ProtocolVersion,
        sbcast::{SbcastCred, SbcastCredArgs, SbcastFlags, SbcastInfo},
    },
    utils::unix_timestamp_now,
};

impl CredContext {
    /// Creates a signed broadcast credential.
    ///
    /// The user name and supplementary gids are resolved here when the caller
    /// didn't, so receiving daemons never consult their own user database.
    pub fn create_sbcast_cred(
        &self,
        args: SbcastCredArgs,
        version: ProtocolVersion,
    ) -> Result<SbcastCred> {
        if args.uid == NOBODY || args.gid == NOBODY {
            return Err(Error::InvalidPrincipal);
        }

        let user_name = match args.user_name.clone() {
            Some(name) => name,
            None => self.fetch_identity(args.uid, args.gid)?.user_name,
        };

        let mut gids = args.gids.clone();
        if gids.is_empty() && self.send_gids {
            if let Some(provider) = self.identity.as_ref() {
                gids = provider.group_ids(&user_name, args.gid)?;
            }
        }

        let ctime = unix_timestamp_now().as_secs();
        let mut cred = SbcastCred::new_unsigned(args, user_name, gids, ctime, version);
        let signature = self.signer.sign(&cred.body_to_vec())?;
        cred.attach_signature(signature);

        debug!("issued broadcast credential for step {}", cred.step_id());

        Ok(cred)
    }

    /// Packs a broadcast credential for the wire: the body fields, then the
    /// detached signature.
    pub fn pack_sbcast_cred(&self, cred: &SbcastCred, version: ProtocolVersion) -> Result<Vec<u8>> {
        if version != cred.version() {
            return Err(Error::ProtocolVersionMismatch {
                expected: *cred.version(),
                actual: *version,
            });
        }

        Ok(cred.pack_to_vec())
    }

    /// Decodes a packed broadcast credential and checks its signature over
    /// the re-encoded body; on success the credential comes back verified.
    pub fn unpack_sbcast_cred(&self, bytes: &[u8], version: ProtocolVersion) -> Result<SbcastCred> {
        let mut cred = SbcastCred::unpack_verified(bytes, &version).map_err(Error::from_unpack)?;

        self.signer.verify(&cred.body_to_vec(), cred.signature())?;
        cred.mark_verified();

        Ok(cred)
    }

    /// Admits one block of a broadcast against the clock value `now` and
    /// returns a deep copy of the authorization fields.
    ///
    /// The first block of a plain transfer must arrive on a freshly verified
    /// credential and seeds the replay cache; every other block (and every
    /// block of a shared-object set) rides on a prior cache record.
    pub fn extract_sbcast_cred_at(
        &self,
        cred: &SbcastCred,
        block_no: u32,
        flags: SbcastFlags,
        now: u64,
    ) -> Result<SbcastInfo> {
        if now > cred.expiration() {
            return Err(Error::CredentialExpired {
                expired_at: cred.expiration(),
            });
        }

        let hash = signature_hash(cred.signature().as_ref());

        if block_no == 1 && !flags.contains(SbcastFlags::SHARED_OBJECT) {
            if !cred.verified() {
                return Err(Error::InvalidCredential);
            }
            self.replay_cache.seed(cred.expiration(), hash);
        } else if !self.replay_cache.admit(cred.expiration(), hash, now) {
            debug!(
                "broadcast block {block_no} for step {} has no cache record",
                cred.step_id()
            );
            return Err(Error::ReplayRejected);
        }

        if cred.uid() == NOBODY || cred.gid() == NOBODY {
            return Err(Error::InvalidPrincipal);
        }

        Ok(cred.to_info())
    }

    /// [`CredContext::extract_sbcast_cred_at`] against the wall clock.
    pub fn extract_sbcast_cred(
        &self,
        cred: &SbcastCred,
        block_no: u32,
        flags: SbcastFlags,
    ) -> Result<SbcastInfo> {
        self.extract_sbcast_cred_at(cred, block_no, flags, unix_timestamp_now().as_secs())
    }
}
