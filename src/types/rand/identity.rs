// Copyright 2024 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

use crate::types::{identity::Identity, rand::number::rand_number_range};

/// Generates a random enriched identity.
pub fn rand_identity() -> Identity {
    let uid = rand_number_range(1000..60000u32);
    let gid = rand_number_range(1000..60000u32);

    Identity {
        uid,
        gid,
        user_name: format!("user{uid}"),
        gids: vec![gid, gid + 1, gid + 2],
        home: Some(format!("/home/user{uid}")),
        shell: Some("/bin/bash".to_string()),
    }
}
