//! Basic authentication flow, simulated end to end.
//!
//! Run with: `cargo run --example basic_auth`

use pulselock::{Authenticator, CodeGenerator, HapticSink, RhythmConfig, Secret};

/// Prints pulses instead of driving an actuator.
struct ConsoleSink;

impl HapticSink for ConsoleSink {
    fn pulse(&mut self, duration: f32, amplitude: f32) {
        if amplitude > 0.0 {
            println!("  bzzt {:.2}s @ {:.0}%", duration, amplitude * 100.0);
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let secret = Secret::derive("alice");
    let seed = CodeGenerator::default().seed_now(&secret);

    let mut auth = Authenticator::new(RhythmConfig::default())?;
    let mut sink = ConsoleSink;
    let mut now = 0.0f32;

    println!("Starting attempt with window seed {seed:#010x}");
    auth.start_attempt(seed, now);

    // Drive four segments: let each pattern play out, then reproduce
    // the target exactly. A real host would feed button timings here.
    for segment in 0..auth.config().total_segments {
        while !auth.is_capturing() {
            now += 0.005;
            auth.tick(now, &mut sink);
        }
        let target = auth
            .current_target()
            .expect("capture is open, a segment is active")
            .beats
            .clone();
        println!("Segment {segment}: reproducing {target:?}");
        for hold in target {
            now += 0.1;
            auth.press(now, &mut sink);
            now += hold;
            auth.release(now, &mut sink);
        }
    }

    for event in auth.drain_events() {
        println!("event: {event:?}");
    }
    println!("Authenticated: {}", auth.is_authenticated());
    println!("\nSegment report:\n{}", auth.export_report_json()?);
    Ok(())
}
