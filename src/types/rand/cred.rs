// Copyright 2024 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

use crate::types::{
    coremap::CoreBitmap,
    cred::JobCredArgs,
    rand::{nodelist::rand_nodelist, number::rand_number_range},
    step::StepId,
};

/// Generates job credential args for `nhosts` nodes sharing one
/// `sockets` x `cores` shape, with every job core allocated and a random
/// subset of them granted to the step.
pub fn rand_job_cred_args(nhosts: u32, sockets: u16, cores: u16) -> JobCredArgs {
    let nodes = rand_nodelist(nhosts);
    let bits = nhosts * u32::from(sockets) * u32::from(cores);

    let mut job_core_bitmap = CoreBitmap::new(bits);
    job_core_bitmap.set_range(0..bits);

    let mut step_core_bitmap = CoreBitmap::new(bits);
    for bit in 0..bits {
        if rand_number_range(0..2u8) == 0 {
            step_core_bitmap.set(bit);
        }
    }

    JobCredArgs {
        step_id: StepId::new(rand_number_range(1..100_000u32), 0),
        uid: rand_number_range(1000..60_000u32),
        gid: rand_number_range(1000..60_000u32),
        job_hostlist: nodes.clone(),
        step_hostlist: nodes,
        job_nhosts: nhosts,
        sockets_per_node: vec![sockets],
        cores_per_socket: vec![cores],
        sock_core_rep_count: vec![nhosts],
        job_core_bitmap,
        step_core_bitmap,
        job_mem_alloc: vec![rand_number_range(512..8192u64)],
        job_mem_alloc_rep_count: vec![nhosts],
        ..Default::default()
    }
}
