// Copyright 2024 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! The credential context: process-wide state of the subsystem, packaged in a
//! cheaply clonable handle.
//!
//! Building a context replaces global initialization, dropping the last
//! handle replaces teardown; both are idempotent by construction.

/// Builder of the context.
pub mod builder;
pub(crate) mod cache;
mod job;
mod net;
mod sbcast;

use std::sync::Arc;

pub use self::builder::CredContextBuilder;
use crate::{
    context::cache::ReplayCache,
    signer::Signer,
    types::identity::IdentityProvider,
};

/// Acceptance window applied when the configuration does not set one.
pub(crate) const DEFAULT_EXPIRE_WINDOW: u64 = 120;
/// Smallest configurable acceptance window, in seconds.
pub(crate) const MIN_EXPIRE_WINDOW: u64 = 5;

/// Issues, verifies and extracts workload credentials.
///
/// All operations are reentrant; handles are cheap to clone and share across
/// RPC handler threads.
#[derive(Clone)]
pub struct CredContext {
    pub(crate) inner: Arc<CredContextInner>,
}

impl core::ops::Deref for CredContext {
    type Target = CredContextInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

/// Shared state behind every handle of one context.
pub struct CredContextInner {
    pub(crate) signer: Signer,
    pub(crate) identity: Option<Arc<dyn IdentityProvider>>,
    pub(crate) expire_window: u64,
    pub(crate) restart_time: u64,
    pub(crate) nss_user_lookup: bool,
    pub(crate) send_gids: bool,
    pub(crate) replay_cache: ReplayCache,
}

impl core::fmt::Debug for CredContext {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CredContext")
            .field("signer", &self.signer)
            .field("expire_window", &self.expire_window)
            .field("restart_time", &self.restart_time)
            .field("nss_user_lookup", &self.nss_user_lookup)
            .field("send_gids", &self.send_gids)
            .finish()
    }
}

impl CredContext {
    /// Creates the builder to instantiate a credential context.
    pub fn builder() -> CredContextBuilder {
        CredContextBuilder::new()
    }

    /// Seconds a job credential stays acceptable after its signing time.
    pub fn expire_window(&self) -> u64 {
        self.inner.expire_window
    }

    /// Unix timestamp at which this context was built. Credentials older than
    /// the previous incarnation of the daemon cannot predate this bound.
    pub fn restart_time(&self) -> u64 {
        self.inner.restart_time
    }

    /// Whether identity enrichment also resolves home directory and shell.
    pub fn nss_user_lookup(&self) -> bool {
        self.inner.nss_user_lookup
    }

    /// Whether supplementary gids are resolved into credentials at creation.
    pub fn send_gids(&self) -> bool {
        self.inner.send_gids
    }

    /// The active signing backend.
    pub fn signer(&self) -> &Signer {
        &self.inner.signer
    }
}
