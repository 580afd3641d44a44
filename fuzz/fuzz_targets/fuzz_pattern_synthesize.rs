#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use pulselock::Synthesizer;

#[derive(Arbitrary, Debug)]
struct FuzzInput {
    seed: u32,
    attempt: u32,
    segment: u32,
    beat_count: u8,
    segments: u8,
}

fuzz_target!(|input: FuzzInput| {
    let synth = Synthesizer {
        beat_count: (input.beat_count % 16) as usize,
        ..Synthesizer::default()
    };

    let pattern = synth.synthesize(input.seed, input.attempt, input.segment);
    assert_eq!(pattern.len(), synth.beat_count);
    for &beat in &pattern.beats {
        assert!(beat.is_finite());
        assert!(beat >= synth.floor);
    }

    // Determinism: same triple, same pattern.
    assert_eq!(
        pattern,
        synth.synthesize(input.seed, input.attempt, input.segment)
    );

    let segments = (input.segments % 8) as usize;
    let all = synth.build_all(input.seed, input.attempt, segments);
    assert_eq!(all.len(), segments);
    for (i, p) in all.iter().enumerate() {
        assert_eq!(*p, synth.synthesize(input.seed, input.attempt, i as u32));
    }
});
