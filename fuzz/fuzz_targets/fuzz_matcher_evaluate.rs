#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use pulselock::{FailReason, Matcher};

#[derive(Arbitrary, Debug)]
struct FuzzInput {
    target: Vec<f32>,
    captured: Vec<f32>,
    strict_count_match: bool,
    penalize_off_by_one: bool,
    require_class_match: bool,
    length_normalize: bool,
    hold_mode: bool,
}

fuzz_target!(|input: FuzzInput| {
    // Keep the sequences small and finite; evaluation must never panic
    // on any numeric garbage within that shape.
    let clean = |v: &[f32]| -> Vec<f32> {
        v.iter()
            .take(64)
            .map(|&x| if x.is_finite() { x } else { 0.0 })
            .collect::<Vec<f32>>()
    };
    let target = clean(&input.target);
    let captured = clean(&input.captured);

    let matcher = Matcher {
        strict_count_match: input.strict_count_match,
        penalize_off_by_one: input.penalize_off_by_one,
        require_class_match: input.require_class_match,
        length_normalize: input.length_normalize,
        hold_mode: input.hold_mode,
        ..Matcher::default()
    };

    let verdict = matcher.evaluate(&target, &captured);

    // A verdict always explains itself one way or the other.
    assert_ne!(verdict.pass, verdict.reason.is_some());
    if captured.is_empty() {
        assert_eq!(verdict.reason, Some(FailReason::EmptyCapture));
    }
    if verdict.pass {
        assert!(verdict.mae.is_some());
    }

    // Determinism over the same inputs.
    assert_eq!(verdict, matcher.evaluate(&target, &captured));

    // Exact reproduction of a non-empty target always scores.
    if !target.is_empty() && matcher.hold_mode {
        let echoed = matcher.evaluate(&target, &target);
        assert_ne!(echoed.reason, Some(FailReason::CountMismatch));
        assert_ne!(echoed.reason, Some(FailReason::ClassMismatch));
    }
});
