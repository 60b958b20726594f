//! Human-readable board join codes.
//!
//! A join code alternates uppercase letters and digits (`A1B2C3`) so it can
//! be read aloud and typed without ambiguity. Uniqueness is the caller's
//! job: the server regenerates until [`generate_join_code`] returns an
//! unused code.

use rand::Rng;

/// Number of letter/digit pairs in a join code.
const PAIRS: usize = 3;

/// Generate a fresh join code using the supplied RNG.
pub fn generate_join_code<R: Rng + ?Sized>(rng: &mut R) -> String {
    let mut code = String::with_capacity(PAIRS * 2);
    for _ in 0..PAIRS {
        code.push(char::from(b'A' + rng.random_range(0..26u8)));
        code.push(char::from(b'0' + rng.random_range(0..10u8)));
    }
    code
}

/// Whether `code` has the shape produced by [`generate_join_code`].
pub fn is_valid_join_code(code: &str) -> bool {
    code.len() == PAIRS * 2
        && code.chars().enumerate().all(|(i, c)| {
            if i % 2 == 0 {
                c.is_ascii_uppercase()
            } else {
                c.is_ascii_digit()
            }
        })
}
