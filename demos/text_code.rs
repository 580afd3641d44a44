//! Windowed text codes as a pure-text OTP fallback.
//!
//! Run with: `cargo run --example text_code`

use pulselock::{CodeGenerator, CodeValidator, Secret};

fn main() {
    let secret = Secret::derive("alice");
    let generator = CodeGenerator::default();

    let code = generator.code_now(&secret);
    println!("Current code for alice: {code}");
    println!("(rotates every {} seconds)", generator.window_seconds);

    let validator = CodeValidator::default();
    println!(
        "Validates now: {}",
        validator.is_valid_now(&secret, &code)
    );
    println!(
        "Wrong user:    {}",
        validator.is_valid_now(&Secret::derive("bob"), &code)
    );

    // The validator tolerates clock skew by checking a small range of
    // adjacent windows.
    let skewed = generator.code_for(
        &secret,
        pulselock::code::now_ticks() - generator.window_ticks(),
    );
    println!(
        "Previous window's code still accepted: {}",
        validator.is_valid_now(&secret, &skewed)
    );
}
