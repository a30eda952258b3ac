// Copyright 2024 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! Signed, time-limited capability credentials for distributed workload managers.
//!
//! A controller builds a [`types::cred::JobCredArgs`], signs it through a
//! [`CredContext`] and ships the resulting [`types::cred::JobCred`] to the
//! compute nodes, which verify freshness and project the allocation slice that
//! belongs to them. File broadcasts use the lighter
//! [`types::sbcast::SbcastCred`], replay-protected across blocks by the
//! context's cache.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(rust_2018_idioms)]
#![allow(clippy::module_name_repetitions)]

pub mod context;
pub mod error;
pub mod signer;
pub mod types;
pub mod utils;

pub use self::{
    context::{CredContext, CredContextBuilder},
    error::{Error, Result},
};
