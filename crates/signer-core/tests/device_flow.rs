//! Hardware wallet resolution and signing against the simulated hub.

#![cfg(feature = "simulation")]

// Silence unused crate dependency warnings for test binary
use alloy_primitives as _;
use bip32 as _;
use bip39 as _;
use hex as _;
use k256 as _;
use proptest as _;
use serde as _;
use serde_json as _;
use thiserror as _;
use tracing as _;
use zeroize as _;

use eip712_signer_core::device::simulation::{SessionEvent, SimulatedDevice, SimulatedHub};
use eip712_signer_core::{
    B256, CredentialSelection, CredentialSigner, Digest, Error, ErrorKind, KeySigner, Signature,
    Signer, SigningRequest, TypedDataPayload, crypto, resolve, sign_digest, sign_envelope,
};

const TEST_PHRASE: &str = "test test test test test test test test test test test junk";
const ANVIL_0: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";
const ANVIL_1: &str = "0x70997970C51812dc3A010C7d01b50e0d17dc79C8";

fn device_selection() -> CredentialSelection {
    CredentialSelection::default().with_device()
}

fn hub_with(device: SimulatedDevice) -> SimulatedHub {
    SimulatedHub::new().with_device(device)
}

#[test]
fn no_device_is_reported() {
    let hub = SimulatedHub::new();
    let err = resolve(&device_selection(), &hub).unwrap_err();

    assert!(matches!(err, Error::NoDeviceFound));
    assert_eq!(err.kind(), ErrorKind::Device);
}

#[test]
fn two_devices_are_refused_without_opening_either() {
    let hub = SimulatedHub::new()
        .with_device(SimulatedDevice::new("nano-1", TEST_PHRASE))
        .with_device(SimulatedDevice::new("nano-2", TEST_PHRASE));

    let err = resolve(&device_selection(), &hub).unwrap_err();

    assert!(matches!(err, Error::AmbiguousDevice { count: 2 }));
    assert!(hub.log().events().is_empty());
}

#[test]
fn locked_device_is_reported() {
    let hub = hub_with(SimulatedDevice::new("nano", TEST_PHRASE).locked());
    let err = resolve(&device_selection(), &hub).unwrap_err();

    assert!(matches!(err, Error::DeviceLockedOrUnavailable(_)));
    assert_eq!(hub.log().opened(), 0);
}

#[test]
fn passphrase_comes_from_selection() {
    let hub = hub_with(SimulatedDevice::new("nano", TEST_PHRASE).with_passphrase("hunter2"));

    let err = resolve(&device_selection(), &hub).unwrap_err();
    assert!(matches!(err, Error::DeviceLockedOrUnavailable(_)));

    let selection = device_selection().with_device_passphrase("hunter2");
    assert!(resolve(&selection, &hub).is_ok());
}

#[test]
fn derivation_failure_closes_session() {
    let hub = hub_with(SimulatedDevice::new("nano", TEST_PHRASE).failing_derivation());
    let err = resolve(&device_selection(), &hub).unwrap_err();

    assert!(matches!(err, Error::DeviceDerivation(_)));
    assert_eq!(
        hub.log().events(),
        [
            SessionEvent::Opened("nano".to_string()),
            SessionEvent::Closed("nano".to_string())
        ]
    );
}

#[test]
fn device_signature_matches_key_signer() {
    let hub = hub_with(SimulatedDevice::new("nano", TEST_PHRASE));
    let selection = device_selection().with_hd_path("m/44'/60'/0'/0/1");
    let digest = Digest::from([0x7e; 32]);

    let mut device = resolve(&selection, &hub).unwrap();
    let mut key =
        KeySigner::from_mnemonic(TEST_PHRASE, &"m/44'/60'/0'/0/1".parse().unwrap()).unwrap();

    assert_eq!(device.address().to_string(), ANVIL_1);
    assert_eq!(device.sign(&digest).unwrap(), key.sign(&digest).unwrap());
}

#[test]
fn device_address_is_stable_across_sign() {
    let hub = hub_with(SimulatedDevice::new("nano", TEST_PHRASE));
    let mut signer = resolve(&device_selection(), &hub).unwrap();

    let before = signer.address();
    signer.sign(&Digest::from([0x01; 32])).unwrap();
    signer.sign(&Digest::from([0x02; 32])).unwrap();

    assert_eq!(signer.address(), before);
    assert_eq!(before.to_string(), ANVIL_0);
}

#[test]
fn session_stays_open_until_signer_drops() {
    let hub = hub_with(SimulatedDevice::new("nano", TEST_PHRASE));
    let log = hub.log();

    let signer = resolve(&device_selection(), &hub).unwrap();
    if let CredentialSigner::Device(device) = &signer {
        assert_eq!(device.device_id(), "nano");
        assert_eq!(device.account().address().to_string(), ANVIL_0);
    } else {
        panic!("expected a device signer");
    }
    assert_eq!(log.open_sessions(), 1);

    drop(signer);
    assert_eq!(log.open_sessions(), 0);
    assert_eq!(log.closed(), 1);
}

#[test]
fn raw_recovery_ids_are_normalized() {
    let hub = hub_with(SimulatedDevice::new("nano", TEST_PHRASE).raw_recovery_ids());
    let digest = Digest::from([0x5c; 32]);

    let mut signer = resolve(&device_selection(), &hub).unwrap();
    let sig = signer.sign(&digest).unwrap();

    assert!(matches!(sig.v(), 27 | 28));
    assert_eq!(
        crypto::recover_address(&digest, &sig).unwrap(),
        signer.address()
    );
}

#[test]
fn declined_signing_is_reported_and_session_closed() {
    let hub = hub_with(SimulatedDevice::new("nano", TEST_PHRASE).declining());

    let err = sign_digest(&device_selection(), &hub, &[0x01; 32]).unwrap_err();

    assert!(matches!(err, Error::DeviceSigning(msg) if msg.contains("declined")));
    assert_eq!(hub.log().opened(), 1);
    assert_eq!(hub.log().open_sessions(), 0);
}

#[test]
fn disconnect_is_reported_and_session_closed() {
    let hub = hub_with(SimulatedDevice::new("nano", TEST_PHRASE).disconnecting());

    let err = sign_digest(&device_selection(), &hub, &[0x01; 32]).unwrap_err();

    assert!(matches!(err, Error::DeviceSigning(_)));
    assert_eq!(hub.log().open_sessions(), 0);
}

#[test]
fn canned_signature_for_other_account_is_rejected() {
    let digest = Digest::from([0x11; 32]);
    let foreign = KeySigner::from_mnemonic(TEST_PHRASE, &"m/44'/60'/0'/0/2".parse().unwrap())
        .unwrap()
        .sign(&digest)
        .unwrap();

    let hub = hub_with(SimulatedDevice::new("nano", TEST_PHRASE).with_canned_signature(foreign));
    let mut signer = resolve(&device_selection(), &hub).unwrap();

    let err = signer.sign(&digest).unwrap_err();
    assert!(matches!(err, Error::DeviceSigning(_)));
}

#[test]
fn canned_signature_with_bad_v_is_rejected() {
    let hub = hub_with(
        SimulatedDevice::new("nano", TEST_PHRASE)
            .with_canned_signature(Signature::new([1u8; 32], [1u8; 32], 35)),
    );
    let mut signer = resolve(&device_selection(), &hub).unwrap();

    let err = signer.sign(&Digest::from([0x11; 32])).unwrap_err();
    assert!(matches!(err, Error::DeviceSigning(msg) if msg.contains("35")));
}

#[test]
fn bad_digest_never_reaches_device() {
    let hub = hub_with(SimulatedDevice::new("nano", TEST_PHRASE));

    for len in [0usize, 1, 31, 33, 1000] {
        let err = sign_digest(&device_selection(), &hub, &vec![0xAA; len]).unwrap_err();
        assert!(matches!(err, Error::DigestLength { actual, .. } if actual == len));
    }
    assert!(hub.log().events().is_empty());
}

#[test]
fn sign_digest_with_device_returns_complete_result() {
    let hub = hub_with(SimulatedDevice::new("nano", TEST_PHRASE));
    let signed = sign_digest(&device_selection(), &hub, &[0x42; 32]).unwrap();

    assert_eq!(signed.address.to_string(), ANVIL_0);
    assert_eq!(signed.digest, Digest::from([0x42; 32]));
    assert_eq!(
        crypto::recover_address(&signed.digest, &signed.signature).unwrap(),
        signed.address
    );
    assert_eq!(hub.log().open_sessions(), 0);
}

#[test]
fn envelope_hashes_reach_device() {
    let hub = hub_with(SimulatedDevice::new("nano", TEST_PHRASE));
    let domain = B256::repeat_byte(0xd0);
    let message = B256::repeat_byte(0x5e);
    let payload = TypedDataPayload::new(domain, message);

    let signed = sign_envelope(&device_selection(), &hub, &payload.to_bytes()).unwrap();

    let requests = hub.log().requests();
    assert_eq!(requests.len(), 1);
    let received = requests[0].payload().expect("device got the envelope");
    assert_eq!(received.domain_separator(), domain);
    assert_eq!(received.struct_hash(), message);
    assert_eq!(requests[0].digest(), &payload.digest());

    assert_eq!(signed.digest, payload.digest());
    assert_eq!(
        crypto::recover_address(&signed.digest, &signed.signature).unwrap(),
        signed.address
    );
}

#[test]
fn bare_digest_reaches_device_without_envelope() {
    let hub = hub_with(SimulatedDevice::new("nano", TEST_PHRASE));
    sign_digest(&device_selection(), &hub, &[0x42; 32]).unwrap();

    assert_eq!(
        hub.log().requests(),
        [SigningRequest::from(Digest::from([0x42; 32]))]
    );
}

#[test]
fn envelope_and_digest_signatures_agree() {
    let payload = TypedDataPayload::new(B256::repeat_byte(0x01), B256::repeat_byte(0x02));
    let hub = hub_with(SimulatedDevice::new("nano", TEST_PHRASE));

    let mut signer = resolve(&device_selection(), &hub).unwrap();
    let via_envelope = signer.sign_request(&payload.into()).unwrap();
    let via_digest = signer.sign(&payload.digest()).unwrap();

    assert_eq!(via_envelope, via_digest);
}
