use super::types::{DeviceEvent, DeviceEventKind, Generation};
use crate::error::PlaybackErrorKind;

#[test]
fn generations_increase_monotonically() {
    let first = Generation::default();
    let second = first.next();
    let third = second.next();
    assert!(first < second);
    assert!(second < third);
    assert_ne!(first, third);
}

#[test]
fn events_compare_by_generation_and_kind() {
    let a = DeviceEvent {
        generation: Generation::default().next(),
        kind: DeviceEventKind::Ended,
    };
    let b = DeviceEvent {
        generation: Generation::default().next().next(),
        kind: DeviceEventKind::Ended,
    };
    assert_ne!(a, b);
    assert_ne!(
        a.kind,
        DeviceEventKind::Error(PlaybackErrorKind::MediaUnreadable)
    );
}
