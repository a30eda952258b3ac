// Copyright 2024 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use stepcred::{
    signer::Ed25519Signer,
    types::{
        coremap::CoreBitmap,
        cred::{node_bit_range, rep_count_index, JobCredArgs},
        gres::GresAllocation,
        identity::{Identity, TableIdentityProvider},
        protocol::ProtocolVersion,
        step::StepId,
    },
    CredContext, Error,
};

// The allocation of the end-to-end scenario: two nodes named n1 and n2, one
// socket of four cores each, all of node n2's cores granted to the job.
fn two_node_args() -> JobCredArgs {
    let mut job_core_bitmap = CoreBitmap::new(8);
    job_core_bitmap.set_range(4..8);
    let mut step_core_bitmap = CoreBitmap::new(8);
    step_core_bitmap.set_range(4..6);

    JobCredArgs {
        step_id: StepId::new(42, 0),
        uid: 1000,
        gid: 1000,
        job_hostlist: "n[1-2]".parse().unwrap(),
        step_hostlist: "n[1-2]".parse().unwrap(),
        job_nhosts: 2,
        sockets_per_node: vec![1, 1],
        cores_per_socket: vec![4, 4],
        sock_core_rep_count: vec![2],
        job_core_bitmap,
        step_core_bitmap,
        job_mem_alloc: vec![1024],
        job_mem_alloc_rep_count: vec![2],
        ..Default::default()
    }
}

fn context() -> CredContext {
    let identity = Identity {
        uid: 1000,
        gid: 1000,
        user_name: "user1000".to_string(),
        gids: vec![1000],
        home: None,
        shell: None,
    };

    CredContext::builder()
        .with_signer(Ed25519Signer::generate().unwrap())
        .with_identity_provider(TableIdentityProvider::new().with_user(identity))
        .finish()
        .unwrap()
}

#[test]
fn projects_the_slice_of_one_node_after_a_wire_round_trip() {
    let ctx = context();

    let cred = ctx
        .create_job_cred(two_node_args(), true, ProtocolVersion::CURRENT)
        .unwrap();
    let wire = ctx.pack_job_cred(&cred, ProtocolVersion::CURRENT).unwrap();
    let cred = ctx.unpack_job_cred(&wire, ProtocolVersion::CURRENT).unwrap();
    let args = ctx.verify_job_cred_at(&cred, cred.ctime()).unwrap();

    let alloc = args.node_allocation("n2").unwrap();
    assert_eq!(alloc.job_cores, "0-3");
    assert_eq!(alloc.step_cores, "0-1");
    assert_eq!(alloc.job_mem_limit, 1024);
    assert_eq!(alloc.step_mem_limit, 1024);

    let alloc = args.node_allocation("n1").unwrap();
    assert_eq!(alloc.job_cores, "");
}

#[test]
fn unknown_node_is_rejected() {
    let args = two_node_args();

    assert!(matches!(
        args.node_allocation("n3"),
        Err(Error::UnknownNode(name)) if name == "n3"
    ));
}

#[test]
fn batch_step_reads_the_first_memory_run() {
    let mut args = two_node_args();
    args.step_id = StepId::batch(42);
    args.job_mem_alloc = vec![1024, 2048];
    args.job_mem_alloc_rep_count = vec![1, 1];

    // Regardless of the node asked about, the batch step sees the first run.
    assert_eq!(args.node_allocation("n1").unwrap().job_mem_limit, 1024);
    assert_eq!(args.node_allocation("n2").unwrap().job_mem_limit, 1024);
}

#[test]
fn per_node_memory_runs_resolve_by_index() {
    let mut args = two_node_args();
    args.job_mem_alloc = vec![1024, 2048];
    args.job_mem_alloc_rep_count = vec![1, 1];

    assert_eq!(args.node_allocation("n1").unwrap().job_mem_limit, 1024);
    assert_eq!(args.node_allocation("n2").unwrap().job_mem_limit, 2048);
}

#[test]
fn step_memory_inherits_the_job_limit() {
    // Absent step memory inherits.
    let args = two_node_args();
    assert_eq!(args.node_allocation("n2").unwrap().step_mem_limit, 1024);

    // An explicit zero inherits too.
    let mut args = two_node_args();
    args.step_mem_alloc = vec![0];
    args.step_mem_alloc_rep_count = vec![2];
    assert_eq!(args.node_allocation("n2").unwrap().step_mem_limit, 1024);

    // A nonzero step limit wins.
    let mut args = two_node_args();
    args.step_mem_alloc = vec![512];
    args.step_mem_alloc_rep_count = vec![2];
    assert_eq!(args.node_allocation("n2").unwrap().step_mem_limit, 512);
}

#[test]
fn gres_projection_follows_the_host_index() {
    let mut args = two_node_args();
    args.job_gres = Some(vec![GresAllocation {
        name: "gpu".to_string(),
        type_name: None,
        node_counts: vec![2, 4],
    }]);

    let alloc = args.node_allocation("n2").unwrap();
    let gres = alloc.job_gres.unwrap();
    assert_eq!(gres.len(), 1);
    assert_eq!(gres[0].count, 4);

    // No gres list, no gres output.
    assert_eq!(two_node_args().node_allocation("n2").unwrap().job_gres, None);
}

fn shape_strategy() -> impl Strategy<Value = (Vec<u16>, Vec<u16>, Vec<u32>)> {
    prop::collection::vec((1..=4u16, 1..=4u16, 1..=3u32), 1..=4).prop_map(|shapes| {
        let sockets: Vec<u16> = shapes.iter().map(|s| s.0).collect();
        let cores: Vec<u16> = shapes.iter().map(|s| s.1).collect();
        let reps: Vec<u32> = shapes.iter().map(|s| s.2).collect();
        (sockets, cores, reps)
    })
}

proptest! {
    // Every node's slice has exactly sockets * cores bits and the slices
    // partition the global bit space.
    #[test]
    fn node_slices_partition_the_bit_space((sockets, cores, reps) in shape_strategy()) {
        let nhosts: u32 = reps.iter().sum();
        let total: u32 = sockets
            .iter()
            .zip(cores.iter().zip(reps.iter()))
            .map(|(&s, (&c, &r))| u32::from(s) * u32::from(c) * r)
            .sum();

        let mut next_bit = 0u32;
        for host_index in 0..nhosts {
            let range = node_bit_range(&sockets, &cores, &reps, host_index).unwrap();
            let shape = rep_count_index(&reps, host_index);

            prop_assert_eq!(range.start, next_bit);
            prop_assert_eq!(
                range.end - range.start,
                u32::from(sockets[shape]) * u32::from(cores[shape])
            );
            next_bit = range.end;
        }

        prop_assert_eq!(next_bit, total);
        prop_assert!(node_bit_range(&sockets, &cores, &reps, nhosts).is_none());
    }

    // The projected core strings carry exactly the bits of each node's slice.
    #[test]
    fn projected_popcounts_sum_to_the_global_popcount(
        (sockets, cores, reps) in shape_strategy(),
        seed in prop::collection::vec(any::<bool>(), 0..256),
    ) {
        let nhosts: u32 = reps.iter().sum();
        let total: u32 = sockets
            .iter()
            .zip(cores.iter().zip(reps.iter()))
            .map(|(&s, (&c, &r))| u32::from(s) * u32::from(c) * r)
            .sum();

        let mut job_core_bitmap = CoreBitmap::new(total);
        for bit in 0..total {
            if seed.get(bit as usize).copied().unwrap_or(false) {
                job_core_bitmap.set(bit);
            }
        }

        let args = JobCredArgs {
            step_id: StepId::new(7, 0),
            uid: 1000,
            gid: 1000,
            job_hostlist: (0..nhosts).map(|n| format!("n{n}")).collect(),
            step_hostlist: (0..nhosts).map(|n| format!("n{n}")).collect(),
            job_nhosts: nhosts,
            sockets_per_node: sockets,
            cores_per_socket: cores,
            sock_core_rep_count: reps,
            job_core_bitmap: job_core_bitmap.clone(),
            step_core_bitmap: CoreBitmap::new(total),
            job_mem_alloc: vec![1024],
            job_mem_alloc_rep_count: vec![nhosts],
            ..Default::default()
        };

        let mut projected: u64 = 0;
        for host_index in 0..nhosts {
            let alloc = args.node_allocation(&format!("n{host_index}")).unwrap();
            if !alloc.job_cores.is_empty() {
                for range in alloc.job_cores.split(',') {
                    let (first, last) = match range.split_once('-') {
                        None => (range.parse::<u64>().unwrap(), range.parse::<u64>().unwrap()),
                        Some((a, b)) => (a.parse().unwrap(), b.parse().unwrap()),
                    };
                    projected += last - first + 1;
                }
            }
        }

        prop_assert_eq!(projected, job_core_bitmap.count());
    }
}
