//! Time-based one-time code generation.

use anyhow::{Result, anyhow};
use totp_rs::{Algorithm, Secret, TOTP};

const DIGITS: usize = 6;
const STEP_SECS: u64 = 30;

fn build(seed: &str) -> Result<TOTP> {
    let normalized = seed.trim().replace(' ', "").to_uppercase();
    let secret = Secret::Encoded(normalized)
        .to_bytes()
        .map_err(|e| anyhow!("Invalid one-time-code seed: {:?}", e))?;
    // new_unchecked: provider seeds are frequently shorter than the RFC's
    // recommended minimum secret length.
    Ok(TOTP::new_unchecked(
        Algorithm::SHA1,
        DIGITS,
        1,
        STEP_SECS,
        secret,
    ))
}

/// The code valid right now for a base32 seed.
pub fn current_code(seed: &str) -> Result<String> {
    let totp = build(seed)?;
    totp.generate_current()
        .map_err(|e| anyhow!("System clock error: {}", e))
}

/// The code valid at a specific unix timestamp. Used for deterministic tests.
pub fn code_at(seed: &str, unix_secs: u64) -> Result<String> {
    Ok(build(seed)?.generate(unix_secs))
}
