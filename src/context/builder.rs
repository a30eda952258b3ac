// Copyright 2024 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! Builder of the credential context.

use std::sync::Arc;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::{
    context::{cache::ReplayCache, CredContext, CredContextInner, DEFAULT_EXPIRE_WINDOW, MIN_EXPIRE_WINDOW},
    error::{Error, Result},
    signer::{PlaceholderSigner, Signer, SignerDto},
    types::identity::IdentityProvider,
    utils::unix_timestamp_now,
};

/// Builder to construct a [`CredContext`] with sensible default values.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[must_use]
pub struct CredContextBuilder {
    /// Serialized signing backend selector.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signer: Option<SignerDto>,
    /// Seconds a job credential stays acceptable after signing.
    #[serde(default = "default_expire_window")]
    pub expire_window: u64,
    /// Resolve home directory and shell alongside the identity.
    #[serde(default)]
    pub nss_user_lookup: bool,
    /// Resolve supplementary gids into credentials at creation.
    #[serde(default = "default_send_gids")]
    pub send_gids: bool,
    #[serde(skip)]
    signer_instance: Option<Signer>,
    #[serde(skip)]
    identity: Option<Arc<dyn IdentityProvider>>,
}

fn default_expire_window() -> u64 {
    DEFAULT_EXPIRE_WINDOW
}

fn default_send_gids() -> bool {
    true
}

impl Default for CredContextBuilder {
    fn default() -> Self {
        Self {
            signer: None,
            expire_window: DEFAULT_EXPIRE_WINDOW,
            nss_user_lookup: false,
            send_gids: true,
            signer_instance: None,
            identity: None,
        }
    }
}

impl core::fmt::Debug for CredContextBuilder {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CredContextBuilder")
            .field("signer", &self.signer)
            .field("expire_window", &self.expire_window)
            .field("nss_user_lookup", &self.nss_user_lookup)
            .field("send_gids", &self.send_gids)
            .finish()
    }
}

impl CredContextBuilder {
    /// Creates a credential context builder.
    pub fn new() -> Self {
        Default::default()
    }

    /// Sets the fields from a JSON config.
    pub fn from_json(mut self, config: &str) -> Result<Self> {
        self = serde_json::from_str::<Self>(config)?;
        Ok(self)
    }

    /// Applies a workload manager `AuthInfo` option string, e.g.
    /// `cred_expire=300`. Unknown options are left for other subsystems.
    pub fn with_auth_info(mut self, auth_info: &str) -> Result<Self> {
        for opt in auth_info.split(',').map(str::trim).filter(|o| !o.is_empty()) {
            if let Some(value) = opt.strip_prefix("cred_expire=") {
                let secs = value
                    .parse::<u64>()
                    .map_err(|_| Error::InvalidOption(opt.to_string()))?;
                self = self.with_expire_window(secs);
            }
        }

        Ok(self)
    }

    /// Applies a workload manager `LaunchParameters` option string; honors
    /// `enable_nss_slurm` and `disable_send_gids`. Unknown options are left
    /// for other subsystems.
    pub fn with_launch_params(mut self, params: &str) -> Self {
        for opt in params.split(',').map(str::trim) {
            match opt {
                "enable_nss_slurm" => self.nss_user_lookup = true,
                "disable_send_gids" => self.send_gids = false,
                _ => {}
            }
        }

        self
    }

    /// Sets the acceptance window, falling back to the default below the
    /// minimum of 5 seconds.
    pub fn with_expire_window(mut self, secs: u64) -> Self {
        if secs < MIN_EXPIRE_WINDOW {
            warn!(
                "cred_expire={secs} below minimum {MIN_EXPIRE_WINDOW}, keeping default {DEFAULT_EXPIRE_WINDOW}"
            );
            self.expire_window = DEFAULT_EXPIRE_WINDOW;
        } else {
            self.expire_window = secs;
        }

        self
    }

    /// Sets the signing backend instance, overriding any serialized selector.
    pub fn with_signer(mut self, signer: impl Into<Signer>) -> Self {
        self.signer_instance = Some(signer.into());
        self
    }

    /// Sets the serialized signing backend selector.
    pub fn with_signer_config(mut self, dto: SignerDto) -> Self {
        self.signer = Some(dto);
        self
    }

    /// Sets the identity provider used for credential enrichment.
    pub fn with_identity_provider(mut self, provider: impl IdentityProvider + 'static) -> Self {
        self.identity = Some(Arc::new(provider));
        self
    }

    /// Builds the context. The restart timestamp is fixed here, once.
    pub fn finish(self) -> Result<CredContext> {
        let signer = match self.signer_instance {
            Some(signer) => signer,
            None => match &self.signer {
                Some(dto) => Signer::try_from(dto)?,
                None => Signer::Placeholder(PlaceholderSigner),
            },
        };

        // A window below the minimum can still arrive through a JSON config.
        let expire_window = if self.expire_window < MIN_EXPIRE_WINDOW {
            warn!(
                "cred_expire={} below minimum {MIN_EXPIRE_WINDOW}, keeping default {DEFAULT_EXPIRE_WINDOW}",
                self.expire_window
            );
            DEFAULT_EXPIRE_WINDOW
        } else {
            self.expire_window
        };

        Ok(CredContext {
            inner: Arc::new(CredContextInner {
                signer,
                identity: self.identity,
                expire_window,
                restart_time: unix_timestamp_now().as_secs(),
                nss_user_lookup: self.nss_user_lookup,
                send_gids: self.send_gids,
                replay_cache: ReplayCache::default(),
            }),
        })
    }
}
