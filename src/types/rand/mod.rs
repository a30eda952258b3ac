// Copyright 2024 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! Random generation of credential fixtures, for tests.

/// Module providing random credential args generation.
pub mod cred;
/// Module providing random identity generation.
pub mod identity;
/// Module providing random node list generation.
pub mod nodelist;
/// Module providing random number generation.
pub mod number;
/// Module providing random broadcast args generation.
pub mod sbcast;
