// Copyright 2024 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! User identities carried inside credentials and the provider seam used to
//! enrich them at creation time.

use std::{collections::HashMap, sync::Arc};

use packable::{
    error::{UnpackError, UnpackErrorExt},
    packer::Packer,
    unpacker::Unpacker,
    Packable,
};

use crate::{
    error::{Error, Result},
    types::{pack_opt_string, pack_slice, pack_string, unpack_opt_string, unpack_string, unpack_vec},
};

/// Sentinel uid/gid of an unresolved principal. Rejected by every create path.
pub const NOBODY: u32 = u32::MAX;

/// An enriched user identity: the resolved principal plus its supplementary
/// groups, so compute nodes never have to consult their own user database.
#[derive(Clone, Debug, Default, Eq, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Identity {
    /// Resolved uid.
    pub uid: u32,
    /// Resolved primary gid.
    pub gid: u32,
    /// Primary user name.
    pub user_name: String,
    /// Supplementary group ids.
    pub gids: Vec<u32>,
    /// Home directory, present only for NSS-style lookups.
    pub home: Option<String>,
    /// Login shell, present only for NSS-style lookups.
    pub shell: Option<String>,
}

impl Packable for Identity {
    type UnpackError = Error;
    type UnpackVisitor = ();

    fn pack<P: Packer>(&self, packer: &mut P) -> core::result::Result<(), P::Error> {
        self.uid.pack(packer)?;
        self.gid.pack(packer)?;
        pack_string(&self.user_name, packer)?;
        pack_slice(&self.gids, packer)?;
        pack_opt_string(self.home.as_deref(), packer)?;
        pack_opt_string(self.shell.as_deref(), packer)?;

        Ok(())
    }

    fn unpack<U: Unpacker, const VERIFY: bool>(
        unpacker: &mut U,
        _visitor: &Self::UnpackVisitor,
    ) -> core::result::Result<Self, UnpackError<Self::UnpackError, U::Error>> {
        Ok(Self {
            uid: u32::unpack::<_, VERIFY>(unpacker, &()).coerce()?,
            gid: u32::unpack::<_, VERIFY>(unpacker, &()).coerce()?,
            user_name: unpack_string::<_, VERIFY>(unpacker)?,
            gids: unpack_vec::<u32, _, VERIFY>(unpacker, &())?,
            home: unpack_opt_string::<_, VERIFY>(unpacker)?,
            shell: unpack_opt_string::<_, VERIFY>(unpacker)?,
        })
    }
}

/// Resolves identities for credential enrichment.
///
/// The credential subsystem never talks to the system user database directly;
/// deployments plug in whatever resolver backs their site (NSS, LDAP, a static
/// table shipped with the cluster configuration).
pub trait IdentityProvider: Send + Sync {
    /// Full identity for `uid`, supplementary groups included. `with_nss`
    /// additionally asks for the home directory and login shell.
    fn fetch(&self, uid: u32, gid: u32, with_nss: bool) -> Result<Identity>;

    /// Supplementary group ids for an already-resolved user name.
    fn group_ids(&self, user_name: &str, gid: u32) -> Result<Vec<u32>>;
}

impl<T: IdentityProvider + ?Sized> IdentityProvider for Arc<T> {
    fn fetch(&self, uid: u32, gid: u32, with_nss: bool) -> Result<Identity> {
        (**self).fetch(uid, gid, with_nss)
    }

    fn group_ids(&self, user_name: &str, gid: u32) -> Result<Vec<u32>> {
        (**self).group_ids(user_name, gid)
    }
}

/// An [`IdentityProvider`] backed by an in-memory table.
#[derive(Clone, Debug, Default)]
pub struct TableIdentityProvider {
    users: HashMap<u32, Identity>,
}

impl TableIdentityProvider {
    /// Creates an empty provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a user, keyed by its uid.
    pub fn with_user(mut self, identity: Identity) -> Self {
        self.users.insert(identity.uid, identity);
        self
    }
}

impl IdentityProvider for TableIdentityProvider {
    fn fetch(&self, uid: u32, _gid: u32, with_nss: bool) -> Result<Identity> {
        let mut identity = self
            .users
            .get(&uid)
            .cloned()
            .ok_or_else(|| Error::IdentityLookupFailed {
                uid,
                reason: "unknown uid".to_string(),
            })?;

        if !with_nss {
            identity.home = None;
            identity.shell = None;
        }

        Ok(identity)
    }

    fn group_ids(&self, user_name: &str, _gid: u32) -> Result<Vec<u32>> {
        self.users
            .values()
            .find(|id| id.user_name == user_name)
            .map(|id| id.gids.clone())
            .ok_or_else(|| Error::IdentityLookupFailed {
                uid: NOBODY,
                reason: format!("unknown user name {user_name}"),
            })
    }
}
