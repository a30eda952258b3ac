// Copyright 2024 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

use crate::types::{nodelist::NodeList, rand::number::rand_number_range};

/// Generates a node list of `count` consecutively numbered nodes.
pub fn rand_nodelist(count: u32) -> NodeList {
    let start = rand_number_range(0..1000u32);

    (start..start + count)
        .map(|n| format!("n{n}"))
        .collect()
}
