// Copyright 2024 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! Error handling of the credential subsystem.

use core::convert::Infallible;

use packable::error::{UnexpectedEOF, UnpackError};

/// Type alias of `Result` in stepcred.
pub type Result<T> = core::result::Result<T, Error>;

/// Error type of the credential subsystem.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// No signing backend is available for the requested operation.
    #[error("no signing backend available")]
    BackendUnavailable,
    /// The credential is past its acceptance window.
    #[error("credential expired at {expired_at}")]
    CredentialExpired {
        /// Unix timestamp after which the credential is no longer accepted.
        expired_at: u64,
    },
    /// Crypto.rs error.
    #[error("{0}")]
    Crypto(#[from] crypto::Error),
    /// Structurally invalid packed credential.
    #[error("malformed credential: {0}")]
    Decode(String),
    /// The identity enrichment step failed during credential creation.
    #[error("identity lookup failed for uid {uid}: {reason}")]
    IdentityLookupFailed {
        /// Uid the lookup was attempted for.
        uid: u32,
        /// Provider-reported reason.
        reason: String,
    },
    /// The credential's signature has not been verified.
    #[error("credential signature has not been verified")]
    InvalidCredential,
    /// A host-range string failed to parse.
    #[error("invalid node list: {0}")]
    InvalidNodeList(String),
    /// An option in a configuration string failed to parse.
    #[error("invalid configuration option: {0}")]
    InvalidOption(String),
    /// The uid or gid is the nobody sentinel.
    #[error("uid or gid resolves to the nobody sentinel")]
    InvalidPrincipal,
    /// The signing backend rejected the signature.
    #[error("signature rejected by the signing backend")]
    InvalidSignature,
    /// Serde JSON error.
    #[error("{0}")]
    Json(#[from] serde_json::Error),
    /// The requested and encoded protocol versions differ.
    #[error("protocol version mismatch: expected {expected}, got {actual}")]
    ProtocolVersionMismatch {
        /// The expected protocol version.
        expected: u16,
        /// The actual protocol version.
        actual: u16,
    },
    /// A broadcast block was presented without a matching replay-cache record.
    #[error("replayed broadcast credential rejected")]
    ReplayRejected,
    /// The node is not part of the credential's node list.
    #[error("node {0} is not part of the credential node list")]
    UnknownNode(String),
}

impl Error {
    /// Flattens an unpack error produced while decoding a byte slice.
    pub(crate) fn from_unpack(error: UnpackError<Self, UnexpectedEOF>) -> Self {
        match error {
            UnpackError::Packable(error) => error,
            UnpackError::Unpacker(_) => Self::Decode("unexpected end of input".to_string()),
        }
    }
}

impl From<Infallible> for Error {
    fn from(error: Infallible) -> Self {
        match error {}
    }
}
