// Copyright 2024 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

use std::{sync::Arc, thread};

use packable::PackableExt;
use pretty_assertions::assert_eq;
use stepcred::{
    signer::{Ed25519Signer, SignerDto},
    types::{
        identity::{Identity, TableIdentityProvider},
        netcred::{NodeAddr, NodeAddrTable},
        protocol::ProtocolVersion,
        rand::cred::rand_job_cred_args,
    },
    CredContext, Error,
};
use zeroize::Zeroizing;

#[test]
fn builder_populates_from_json() {
    let ctx = CredContext::builder()
        .from_json(r#"{"signer":"placeholder","expireWindow":300,"nssUserLookup":true}"#)
        .unwrap()
        .finish()
        .unwrap();

    assert_eq!(ctx.expire_window(), 300);
    assert!(ctx.nss_user_lookup());
    assert!(ctx.send_gids());
}

#[test]
fn auth_info_sets_the_expire_window() {
    let builder = CredContext::builder().with_auth_info("cred_expire=300").unwrap();
    assert_eq!(builder.expire_window, 300);

    // Below the minimum of 5 the default window stays.
    let builder = CredContext::builder().with_auth_info("cred_expire=2").unwrap();
    assert_eq!(builder.expire_window, 120);

    // Options of other subsystems pass through.
    let builder = CredContext::builder()
        .with_auth_info("token_lifespan=60,cred_expire=600")
        .unwrap();
    assert_eq!(builder.expire_window, 600);

    assert!(matches!(
        CredContext::builder().with_auth_info("cred_expire=soon"),
        Err(Error::InvalidOption(_))
    ));
}

#[test]
fn launch_params_toggle_enrichment_flags() {
    let ctx = CredContext::builder()
        .with_launch_params("enable_nss_slurm,disable_send_gids")
        .finish()
        .unwrap();

    assert!(ctx.nss_user_lookup());
    assert!(!ctx.send_gids());

    let ctx = CredContext::builder().finish().unwrap();
    assert!(!ctx.nss_user_lookup());
    assert!(ctx.send_gids());
}

#[test]
fn unconfigured_backend_refuses_to_sign() {
    let identity = Identity {
        uid: 1000,
        gid: 1000,
        user_name: "user1000".to_string(),
        gids: vec![1000],
        home: None,
        shell: None,
    };
    let ctx = CredContext::builder()
        .with_identity_provider(TableIdentityProvider::new().with_user(identity))
        .finish()
        .unwrap();

    let mut args = rand_job_cred_args(1, 1, 4);
    args.uid = 1000;
    args.gid = 1000;

    assert!(matches!(
        ctx.create_job_cred(args, true, ProtocolVersion::CURRENT),
        Err(Error::BackendUnavailable)
    ));
}

#[test]
fn contexts_sharing_a_seed_verify_each_other() {
    let seed = "0x2d3e5a9f6c1b08a7d4e2f0c9b8a765432d3e5a9f6c1b08a7d4e2f0c9b8a76543";
    let controller = CredContext::builder()
        .with_signer_config(SignerDto::Ed25519(Zeroizing::new(seed.to_string())))
        .finish()
        .unwrap();
    let node = CredContext::builder()
        .with_signer(Ed25519Signer::try_from_hex_seed(seed).unwrap())
        .finish()
        .unwrap();

    let mut args = rand_job_cred_args(2, 1, 4);
    args.id = Some(Identity::default());

    let cred = controller
        .create_job_cred(args, true, ProtocolVersion::CURRENT)
        .unwrap();
    let wire = controller.pack_job_cred(&cred, ProtocolVersion::CURRENT).unwrap();

    let unpacked = node.unpack_job_cred(&wire, ProtocolVersion::CURRENT).unwrap();
    assert!(unpacked.verified());

    // A context with a different key rejects the signature.
    let stranger = CredContext::builder()
        .with_signer(Ed25519Signer::generate().unwrap())
        .finish()
        .unwrap();
    assert!(matches!(
        stranger.unpack_job_cred(&wire, ProtocolVersion::CURRENT),
        Err(Error::InvalidSignature)
    ));
}

#[test]
fn concurrent_readers_share_a_credential() {
    let mut args = rand_job_cred_args(4, 1, 4);
    args.id = Some(Identity::default());
    let node = args.job_hostlist.get(0).unwrap().to_string();

    let ctx = CredContext::builder()
        .with_signer(Ed25519Signer::generate().unwrap())
        .finish()
        .unwrap();
    let cred = Arc::new(
        ctx.create_job_cred(args, true, ProtocolVersion::CURRENT)
            .unwrap(),
    );

    let mut handles = Vec::new();
    for _ in 0..8 {
        let cred = Arc::clone(&cred);
        let node = node.clone();
        handles.push(thread::spawn(move || {
            cred.args().node_allocation(&node).unwrap().job_cores
        }));
    }

    // The owner drops its handle while readers are still projecting.
    let expected = cred.args().node_allocation(&node).unwrap().job_cores;
    drop(cred);

    for handle in handles {
        assert_eq!(handle.join().unwrap(), expected);
    }
}

#[test]
fn net_cred_round_trips_the_address_table() {
    let ctx = CredContext::builder()
        .with_signer(Ed25519Signer::generate().unwrap())
        .finish()
        .unwrap();

    let table: NodeAddrTable = [
        NodeAddr {
            name: "n1".to_string(),
            addr: "10.0.0.1:6818".to_string(),
        },
        NodeAddr {
            name: "n2".to_string(),
            addr: "10.0.0.2:6818".to_string(),
        },
    ]
    .into_iter()
    .collect();

    let cred = ctx.create_net_cred(&table, ProtocolVersion::CURRENT).unwrap();
    let wire = cred.pack_to_vec();

    let extracted = ctx.extract_net_cred(&wire, ProtocolVersion::CURRENT).unwrap();
    assert_eq!(extracted, table);
    assert_eq!(extracted.lookup("n2"), Some("10.0.0.2:6818"));

    assert!(matches!(
        ctx.extract_net_cred(&wire, ProtocolVersion::MIN),
        Err(Error::ProtocolVersionMismatch { .. })
    ));

    let mut tampered = wire;
    let index = tampered.len() / 2;
    tampered[index] ^= 0x01;
    assert!(ctx.extract_net_cred(&tampered, ProtocolVersion::CURRENT).is_err());
}
