// Copyright 2024 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! Job credential operations of the context.

use log::debug;
use packable::PackableExt;

use crate::{
    context::CredContext,
    error::{Error, Result},
    signer::{Sign, Verify},
    types::{
        cred::{CredBody, JobCred, JobCredArgs},
        identity::{Identity, NOBODY},
        protocol::ProtocolVersion,
    },
    utils::unix_timestamp_now,
};

impl CredContext {
    /// Creates a job credential for `args`, packed at `version` and signed
    /// when `sign` is set.
    ///
    /// Rejects nobody principals before anything else; the signing backend is
    /// never consulted for them. When enrichment is enabled and `args.id` is
    /// unset, the extended identity is resolved here so the nodes don't have
    /// to.
    pub fn create_job_cred(
        &self,
        mut args: JobCredArgs,
        sign: bool,
        version: ProtocolVersion,
    ) -> Result<JobCred> {
        if args.uid == NOBODY || args.gid == NOBODY {
            return Err(Error::InvalidPrincipal);
        }

        args.truncate_shapes();

        if args.id.is_none() && (self.nss_user_lookup || self.send_gids) {
            args.id = Some(self.fetch_identity(args.uid, args.gid)?);
        }

        let ctime = unix_timestamp_now().as_secs();
        let body = CredBody { version, ctime, args };
        let buffer = body.pack_to_vec();
        let signature = if sign { Some(self.signer.sign(&buffer)?) } else { None };

        debug!(
            "issued job credential for step {} uid {}",
            body.args.step_id, body.args.uid
        );

        Ok(JobCred::new(
            body.args,
            ctime,
            buffer.into_boxed_slice(),
            version,
            signature,
        ))
    }

    /// Decodes a packed job credential and checks its signature; on success
    /// the credential comes back verified.
    pub fn unpack_job_cred(&self, bytes: &[u8], version: ProtocolVersion) -> Result<JobCred> {
        let mut cred = JobCred::unpack_verified(bytes, &version).map_err(Error::from_unpack)?;

        let signature = cred.signature().cloned().ok_or(Error::InvalidCredential)?;
        self.signer.verify(cred.buffer(), &signature)?;
        cred.mark_verified();

        Ok(cred)
    }

    /// Checks a credential's freshness against the clock value `now` and
    /// returns its args.
    ///
    /// The credential must have gone through [`CredContext::unpack_job_cred`]
    /// first; an unverified credential is rejected no matter how fresh.
    pub fn verify_job_cred_at<'a>(&self, cred: &'a JobCred, now: u64) -> Result<&'a JobCredArgs> {
        if !cred.verified() {
            return Err(Error::InvalidCredential);
        }

        let expired_at = cred.expires_at(self.expire_window);
        if now > expired_at {
            debug!(
                "job credential for step {} expired at {expired_at}",
                cred.args().step_id
            );
            return Err(Error::CredentialExpired { expired_at });
        }

        Ok(cred.args())
    }

    /// [`CredContext::verify_job_cred_at`] against the wall clock.
    pub fn verify_job_cred<'a>(&self, cred: &'a JobCred) -> Result<&'a JobCredArgs> {
        self.verify_job_cred_at(cred, unix_timestamp_now().as_secs())
    }

    /// Packs a signed credential for the wire by copying its cached body.
    pub fn pack_job_cred(&self, cred: &JobCred, version: ProtocolVersion) -> Result<Vec<u8>> {
        cred.pack_for_wire(version)
    }

    /// Creates a signed credential at the current protocol version with
    /// identity enrichment forced on, for tests that need a fully populated
    /// credential regardless of context flags.
    #[cfg(feature = "rand")]
    #[cfg_attr(docsrs, doc(cfg(feature = "rand")))]
    pub fn fake_job_cred(&self, mut args: JobCredArgs) -> Result<JobCred> {
        if args.id.is_none() && args.uid != NOBODY {
            args.id = Some(self.fetch_identity(args.uid, args.gid)?);
        }

        self.create_job_cred(args, true, ProtocolVersion::CURRENT)
    }

    pub(crate) fn fetch_identity(&self, uid: u32, gid: u32) -> Result<Identity> {
        let provider = self.identity.as_ref().ok_or_else(|| Error::IdentityLookupFailed {
            uid,
            reason: "no identity provider configured".to_string(),
        })?;

        provider.fetch(uid, gid, self.nss_user_lookup)
    }
}
