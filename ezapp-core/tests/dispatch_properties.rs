//! Property tests for remote writes through the dispatcher

use ezapp_core::{dispatch, AuthLevel, OpenAccess, Registry, StaticFields};
use ezapp_hal::NoStorage;
use ezapp_protocol::messages::{REQ_POLL, REQ_UPDATE};
use ezapp_protocol::{Frame, FrameParser, MaskOp, MAX_PAYLOAD_SIZE};
use proptest::prelude::*;

type TestRegistry = Registry<StaticFields<8>, NoStorage>;

fn send(registry: &mut TestRegistry, cmd: u8, payload: &[u8]) -> Frame {
    let request: Frame = Frame::new(0x11, cmd, payload).unwrap();
    let mut wire = heapless::Vec::<u8, 256>::new();
    assert!(dispatch(&request, registry, &mut OpenAccess, &mut wire));
    FrameParser::<MAX_PAYLOAD_SIZE>::new().feed_bytes(&wire).unwrap().unwrap()
}

fn mask_op() -> impl Strategy<Value = MaskOp> {
    prop_oneof![
        Just(MaskOp::Set),
        Just(MaskOp::Or),
        Just(MaskOp::And),
        Just(MaskOp::Xor),
    ]
}

fn expected(op: MaskOp, current: u16, data: u16) -> u16 {
    match op {
        MaskOp::Set => data,
        MaskOp::Or => current | data,
        MaskOp::And => current & data,
        MaskOp::Xor => current ^ data,
    }
}

proptest! {
    #[test]
    fn open_updates_apply_mask(initial in any::<u16>(), data in any::<u16>(), op in mask_op()) {
        let mut registry = TestRegistry::new(StaticFields::new(), NoStorage);
        let index = registry.add_slider("Level", u16::MAX).unwrap();
        registry.set_value(index, initial);

        let [lo, hi] = data.to_le_bytes();
        let response = send(&mut registry, REQ_UPDATE, &[index, op as u8, lo, hi]);

        let result = expected(op, initial, data);
        prop_assert_eq!(registry.peek_value(index), result);
        prop_assert_eq!(&response.payload[4..], &result.to_le_bytes()[..]);
        prop_assert!(registry.get_kbhit(index));
    }

    #[test]
    fn closed_updates_are_ignored(
        initial in any::<u16>(),
        data in any::<u16>(),
        op in mask_op(),
        locked in any::<bool>(),
    ) {
        let mut registry = TestRegistry::new(StaticFields::new(), NoStorage);
        let index = registry.add_slider("Level", u16::MAX).unwrap();
        registry.set_value(index, initial);
        registry.set_auth_level(if locked { AuthLevel::Locked } else { AuthLevel::ReadOnly });

        let [lo, hi] = data.to_le_bytes();
        send(&mut registry, REQ_UPDATE, &[index, op as u8, lo, hi]);

        prop_assert_eq!(registry.peek_value(index), initial);
        prop_assert!(!registry.get_kbhit(index));
    }

    #[test]
    fn locked_poll_reports_zero(values in prop::collection::vec(any::<u16>(), 1..6)) {
        let mut registry = TestRegistry::new(StaticFields::new(), NoStorage);
        for &value in &values {
            let index = registry.add_slider("v", u16::MAX).unwrap();
            registry.set_value(index, value);
        }
        registry.set_auth_level(AuthLevel::Locked);

        let count = values.len() as u8;
        let response = send(&mut registry, REQ_POLL, &[1, 0, count]);
        prop_assert_eq!(response.payload.len(), 4 + 2 * values.len());
        prop_assert!(response.payload[4..].iter().all(|&b| b == 0));
    }
}

#[test]
fn append_indices_follow_creation_order() {
    let mut registry = TestRegistry::new(StaticFields::new(), NoStorage);
    for n in 1..8u8 {
        assert_eq!(registry.add_spacer(n), Ok(n));
        assert_eq!(registry.field_count(), u16::from(n) + 1);
    }
}
