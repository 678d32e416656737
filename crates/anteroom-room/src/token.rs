//! Secret ready-token generation.

use rand::Rng;

/// Generates a random hex token carrying `bytes` bytes of entropy.
///
/// Uses the thread-local CSPRNG seeded from the operating system. If the OS
/// entropy source is unavailable `rand` panics; issuing guessable tokens
/// instead is never acceptable.
pub(crate) fn generate_token(bytes: usize) -> String {
    let mut buf = vec![0u8; bytes];
    rand::rng().fill(buf.as_mut_slice());
    buf.iter().map(|b| format!("{b:02x}")).collect()
}
