//! Share codes for published forms

use rand::distributions::Alphanumeric;
use rand::Rng;

/// Default share code length.
pub const DEFAULT_LENGTH: usize = 8;

/// Random code over `[A-Za-z0-9]`.
pub fn generate(length: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_length_and_alphabet() {
        let code = generate(DEFAULT_LENGTH);
        assert_eq!(code.len(), DEFAULT_LENGTH);
        assert!(code.chars().all(|c| c.is_ascii_alphanumeric()));
    }
}
