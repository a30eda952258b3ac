// Copyright 2024 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

use pretty_assertions::assert_eq;
use stepcred::{
    signer::Ed25519Signer,
    types::{
        cred::JobCredArgs,
        identity::{Identity, TableIdentityProvider, NOBODY},
        protocol::ProtocolVersion,
        rand::cred::rand_job_cred_args,
    },
    CredContext, Error,
};

fn context_for(args: &JobCredArgs) -> CredContext {
    let identity = Identity {
        uid: args.uid,
        gid: args.gid,
        user_name: format!("user{}", args.uid),
        gids: vec![args.gid],
        home: Some(format!("/home/user{}", args.uid)),
        shell: Some("/bin/sh".to_string()),
    };

    CredContext::builder()
        .with_signer(Ed25519Signer::generate().unwrap())
        .with_identity_provider(TableIdentityProvider::new().with_user(identity))
        .finish()
        .unwrap()
}

#[test]
fn create_pack_unpack_verify_round_trip() {
    let args = rand_job_cred_args(2, 1, 4);
    let ctx = context_for(&args);

    let cred = ctx.create_job_cred(args, true, ProtocolVersion::CURRENT).unwrap();
    let wire = ctx.pack_job_cred(&cred, ProtocolVersion::CURRENT).unwrap();
    let unpacked = ctx.unpack_job_cred(&wire, ProtocolVersion::CURRENT).unwrap();

    assert!(unpacked.verified());
    assert_eq!(unpacked.args(), cred.args());
    assert_eq!(unpacked.ctime(), cred.ctime());
    assert_eq!(unpacked.signature(), cred.signature());

    let verified_args = ctx.verify_job_cred_at(&unpacked, unpacked.ctime()).unwrap();
    assert_eq!(verified_args, cred.args());
}

#[test]
fn enrichment_fills_identity_at_creation() {
    let args = rand_job_cred_args(1, 1, 2);
    let ctx = context_for(&args);
    let uid = args.uid;

    let cred = ctx.create_job_cred(args, true, ProtocolVersion::CURRENT).unwrap();

    let id = cred.args().id.as_ref().unwrap();
    assert_eq!(id.uid, uid);
    assert_eq!(id.user_name, format!("user{uid}"));
    // The default context resolves gids but not home/shell.
    assert_eq!(id.home, None);
}

#[test]
fn pack_is_pure() {
    let args = rand_job_cred_args(2, 2, 2);
    let ctx = context_for(&args);

    let cred = ctx.create_job_cred(args, true, ProtocolVersion::CURRENT).unwrap();

    assert_eq!(
        ctx.pack_job_cred(&cred, ProtocolVersion::CURRENT).unwrap(),
        ctx.pack_job_cred(&cred, ProtocolVersion::CURRENT).unwrap()
    );
}

#[test]
fn pack_rejects_foreign_protocol_version() {
    let args = rand_job_cred_args(1, 1, 4);
    let ctx = context_for(&args);

    let cred = ctx.create_job_cred(args, true, ProtocolVersion::CURRENT).unwrap();

    assert!(matches!(
        ctx.pack_job_cred(&cred, ProtocolVersion::MIN),
        Err(Error::ProtocolVersionMismatch { .. })
    ));
}

#[test]
fn unsigned_credential_cannot_cross_the_wire() {
    let args = rand_job_cred_args(1, 1, 4);
    let ctx = context_for(&args);

    let cred = ctx.create_job_cred(args, false, ProtocolVersion::CURRENT).unwrap();

    assert!(cred.signature().is_none());
    assert!(matches!(
        ctx.pack_job_cred(&cred, ProtocolVersion::CURRENT),
        Err(Error::InvalidCredential)
    ));
}

#[test]
fn nobody_is_rejected_before_the_backend_runs() {
    // No signing backend configured: if creation reached the sign path the
    // error would be BackendUnavailable instead of InvalidPrincipal.
    let ctx = CredContext::builder().finish().unwrap();

    let mut args = rand_job_cred_args(1, 1, 4);
    args.uid = NOBODY;
    assert!(matches!(
        ctx.create_job_cred(args.clone(), true, ProtocolVersion::CURRENT),
        Err(Error::InvalidPrincipal)
    ));

    let mut args = rand_job_cred_args(1, 1, 4);
    args.gid = NOBODY;
    assert!(matches!(
        ctx.create_job_cred(args, true, ProtocolVersion::CURRENT),
        Err(Error::InvalidPrincipal)
    ));
}

#[test]
fn freshness_window_is_inclusive() {
    let args = rand_job_cred_args(1, 1, 4);
    let identity = Identity {
        uid: args.uid,
        gid: args.gid,
        user_name: format!("user{}", args.uid),
        gids: vec![args.gid],
        home: None,
        shell: None,
    };
    let ctx = CredContext::builder()
        .with_signer(Ed25519Signer::generate().unwrap())
        .with_identity_provider(TableIdentityProvider::new().with_user(identity))
        .with_auth_info("cred_expire=5")
        .unwrap()
        .finish()
        .unwrap();

    let cred = ctx.create_job_cred(args, true, ProtocolVersion::CURRENT).unwrap();
    let wire = ctx.pack_job_cred(&cred, ProtocolVersion::CURRENT).unwrap();
    let cred = ctx.unpack_job_cred(&wire, ProtocolVersion::CURRENT).unwrap();

    assert!(ctx.verify_job_cred_at(&cred, cred.ctime()).is_ok());
    assert!(ctx.verify_job_cred_at(&cred, cred.ctime() + 5).is_ok());
    assert!(matches!(
        ctx.verify_job_cred_at(&cred, cred.ctime() + 6),
        Err(Error::CredentialExpired { expired_at }) if expired_at == cred.ctime() + 5
    ));
}

#[test]
fn unverified_credential_is_rejected_no_matter_how_fresh() {
    let args = rand_job_cred_args(1, 1, 4);
    let ctx = context_for(&args);

    let cred = ctx.create_job_cred(args, true, ProtocolVersion::CURRENT).unwrap();

    assert!(matches!(
        ctx.verify_job_cred_at(&cred, cred.ctime()),
        Err(Error::InvalidCredential)
    ));
}

#[test]
fn tampered_wire_bytes_are_rejected() {
    let args = rand_job_cred_args(2, 1, 4);
    let ctx = context_for(&args);

    let cred = ctx.create_job_cred(args, true, ProtocolVersion::CURRENT).unwrap();
    let mut wire = ctx.pack_job_cred(&cred, ProtocolVersion::CURRENT).unwrap();

    // Flip one bit inside the signed body.
    let index = wire.len() / 2;
    wire[index] ^= 0x01;

    assert!(ctx.unpack_job_cred(&wire, ProtocolVersion::CURRENT).is_err());
}

#[test]
fn old_protocol_version_round_trips_without_identity() {
    let args = rand_job_cred_args(1, 1, 4);
    let ctx = context_for(&args);

    let cred = ctx.create_job_cred(args, true, ProtocolVersion::MIN).unwrap();
    // Enrichment ran, but the old layout has no field for it.
    assert!(cred.args().id.is_some());

    let wire = ctx.pack_job_cred(&cred, ProtocolVersion::MIN).unwrap();
    let unpacked = ctx.unpack_job_cred(&wire, ProtocolVersion::MIN).unwrap();

    assert!(unpacked.verified());
    assert!(unpacked.args().id.is_none());
    assert_eq!(unpacked.args().step_id, cred.args().step_id);
}

#[test]
fn unpack_rejects_mismatched_version_request() {
    let args = rand_job_cred_args(1, 1, 4);
    let ctx = context_for(&args);

    let cred = ctx.create_job_cred(args, true, ProtocolVersion::CURRENT).unwrap();
    let wire = ctx.pack_job_cred(&cred, ProtocolVersion::CURRENT).unwrap();

    assert!(matches!(
        ctx.unpack_job_cred(&wire, ProtocolVersion::MIN),
        Err(Error::ProtocolVersionMismatch { .. })
    ));
}

#[test]
fn faker_forces_enrichment() {
    let args = rand_job_cred_args(1, 1, 4);
    let ctx = context_for(&args);

    let cred = ctx.fake_job_cred(args).unwrap();

    assert!(cred.args().id.is_some());
    assert!(cred.signature().is_some());
    assert_eq!(cred.buf_version(), ProtocolVersion::CURRENT);
}
