#![cfg(feature = "metrics")]
//! Tests for `fragmux` metrics helpers.
//!
//! These tests verify that counters update as expected using
//! `metrics_util::debugging::DebuggingRecorder`.

use fragmux::{Communicator, FragmentingComm, Rank, Tag, metrics};
use fragmux_testing::{RecordingComm, fragment_config};
use metrics_util::debugging::{DebugValue, DebuggingRecorder, Snapshotter};
use rstest::rstest;

/// Creates a debugging recorder and snapshotter for metrics testing.
fn debugging_recorder_setup() -> (Snapshotter, DebuggingRecorder) {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    (snapshotter, recorder)
}

type Entry = (
    metrics_util::CompositeKey,
    Option<::metrics::Unit>,
    Option<::metrics::SharedString>,
    DebugValue,
);

/// Sum the counters named `name` carrying `label`, if given.
///
/// Snapshots only report counters changed since the previous snapshot, so
/// each test takes one snapshot and queries it repeatedly.
fn counter(entries: &[Entry], name: &str, label: Option<(&str, &str)>) -> u64 {
    entries
        .iter()
        .filter(|(key, _, _, _)| {
            key.key().name() == name
                && label.is_none_or(|(label_key, label_value)| {
                    key.key()
                        .labels()
                        .any(|l| l.key() == label_key && l.value() == label_value)
                })
        })
        .map(|(_, _, _, value)| match value {
            DebugValue::Counter(count) => *count,
            _ => 0,
        })
        .sum()
}

#[rstest]
#[case::outbound(metrics::Direction::Outbound, "outbound")]
#[case::inbound(metrics::Direction::Inbound, "inbound")]
fn fragment_metric_increments(#[case] direction: metrics::Direction, #[case] label: &str) {
    let (snapshotter, recorder) = debugging_recorder_setup();
    ::metrics::with_local_recorder(&recorder, || metrics::inc_fragments(direction));

    let entries = snapshotter.snapshot().into_vec();
    assert_eq!(
        counter(&entries, metrics::FRAGMENTS_ISSUED, Some(("direction", label))),
        1
    );
}

#[test]
fn fragmented_send_records_fragments_and_transfer() {
    let (snapshotter, recorder) = debugging_recorder_setup();
    let comm = FragmentingComm::new(RecordingComm::new(), fragment_config(4));

    ::metrics::with_local_recorder(&recorder, || {
        comm.send(&[0_u8; 10], Rank::new(1), Tag::new(0))
            .expect("send");
    });

    let entries = snapshotter.snapshot().into_vec();
    assert_eq!(
        counter(&entries, metrics::FRAGMENTS_ISSUED, Some(("direction", "outbound"))),
        2
    );
    assert_eq!(
        counter(&entries, metrics::TRANSFERS_TOTAL, Some(("kind", "send"))),
        1
    );
    assert_eq!(counter(&entries, metrics::TRANSFER_ERRORS, None), 0);
}

#[test]
fn failed_transfer_increments_error_metric() {
    let (snapshotter, recorder) = debugging_recorder_setup();
    let comm = FragmentingComm::new(RecordingComm::new().failing_join(), fragment_config(4));

    ::metrics::with_local_recorder(&recorder, || {
        let mut buf = [0_u32; 6];
        comm.recv(&mut buf, Rank::new(1), Tag::new(0))
            .expect_err("join fails");
    });

    let entries = snapshotter.snapshot().into_vec();
    assert_eq!(
        counter(&entries, metrics::TRANSFERS_TOTAL, Some(("kind", "recv"))),
        1
    );
    assert_eq!(counter(&entries, metrics::TRANSFER_ERRORS, None), 1);
}

#[test]
fn rejected_issuance_is_not_counted_as_issued() {
    let (snapshotter, recorder) = debugging_recorder_setup();
    let comm = FragmentingComm::new(RecordingComm::new().failing_issue_at(1), fragment_config(4));

    ::metrics::with_local_recorder(&recorder, || {
        comm.send(&[0_u8; 12], Rank::new(1), Tag::new(0))
            .expect_err("second issuance fails");
    });

    let entries = snapshotter.snapshot().into_vec();
    assert_eq!(comm.inner().issued().len(), 1);
    assert_eq!(
        counter(&entries, metrics::FRAGMENTS_ISSUED, Some(("direction", "outbound"))),
        1
    );
    assert_eq!(counter(&entries, metrics::TRANSFER_ERRORS, None), 1);
}

#[test]
fn combined_transfer_counts_both_directions() {
    let (snapshotter, recorder) = debugging_recorder_setup();
    let comm = FragmentingComm::new(RecordingComm::new(), fragment_config(4));

    ::metrics::with_local_recorder(&recorder, || {
        let mut inbound = [0_u16; 4];
        comm.sendrecv(
            &[0_u16; 8],
            Rank::new(1),
            Tag::new(0),
            &mut inbound,
            Rank::new(1),
            Tag::new(0),
        )
        .expect("sendrecv");
    });

    let entries = snapshotter.snapshot().into_vec();
    assert_eq!(
        counter(&entries, metrics::FRAGMENTS_ISSUED, Some(("direction", "outbound"))),
        2
    );
    assert_eq!(
        counter(&entries, metrics::FRAGMENTS_ISSUED, Some(("direction", "inbound"))),
        1
    );
    assert_eq!(
        counter(&entries, metrics::TRANSFERS_TOTAL, Some(("kind", "sendrecv"))),
        1
    );
}
