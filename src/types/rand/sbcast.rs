// Copyright 2024 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

use crate::types::{
    rand::{nodelist::rand_nodelist, number::rand_number_range},
    sbcast::SbcastCredArgs,
    step::StepId,
};

/// Generates broadcast credential args dying at `expiration`.
pub fn rand_sbcast_cred_args(expiration: u64) -> SbcastCredArgs {
    let uid = rand_number_range(1000..60_000u32);
    let gid = rand_number_range(1000..60_000u32);

    SbcastCredArgs {
        step_id: StepId::new(rand_number_range(1..100_000u32), 0),
        uid,
        gid,
        user_name: Some(format!("user{uid}")),
        gids: vec![gid, gid + 1],
        nodes: rand_nodelist(4),
        expiration,
    }
}
