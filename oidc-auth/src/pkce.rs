//! State and PKCE (Proof Key for Code Exchange) generation for OAuth 2.0.
//!
//! Implements RFC 7636 for securing authorization code flows. Two interchangeable
//! generators exist, `plain` and `S256`, selected by method identifier.

use std::sync::Arc;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::Rng;
use sha2::{Digest, Sha256};

use crate::error::{pkce_error, Error, PkceErrorKind};

/// Method identifier for the plain transformation.
pub const METHOD_PLAIN: &str = "plain";
/// Method identifier for the SHA-256 transformation.
pub const METHOD_S256: &str = "S256";

/// Shortest accepted state or verifier length.
pub const MIN_LENGTH: usize = 32;
/// Longest accepted state or verifier length.
pub const MAX_LENGTH: usize = 96;

// https://tools.ietf.org/html/rfc7636#section-4.1
const CHARSET: &[u8; 62] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
const CHARSET_LEN: u8 = CHARSET.len() as u8;
// Largest multiple of 62 that fits in a byte; bytes at or above it are rejected.
const REJECTION_BOUND: u8 = CHARSET_LEN * 4;

/// PKCE challenge material produced for a single authorization request.
#[derive(Debug, Clone)]
pub struct CodeChallenge {
    /// Value sent to the authorization endpoint as `code_challenge`.
    pub challenge: String,
    /// Value sent as `code_challenge_method`.
    pub method: &'static str,
    /// Value kept back and sent to the token endpoint as `code_verifier`.
    pub verifier: String,
}

/// Supported code challenge transformations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PkceMethod {
    Plain,
    S256,
}

impl PkceMethod {
    /// Resolve a method identifier. Anything other than `plain` selects `S256`.
    pub fn from_identifier(identifier: &str) -> Self {
        match identifier {
            METHOD_PLAIN => PkceMethod::Plain,
            _ => PkceMethod::S256,
        }
    }

    /// Get the method identifier string.
    pub fn as_str(&self) -> &'static str {
        match self {
            PkceMethod::Plain => METHOD_PLAIN,
            PkceMethod::S256 => METHOD_S256,
        }
    }
}

/// Generator of state values and PKCE challenge/verifier pairs.
pub trait Generator: Send + Sync {
    /// Produce a fresh random state value.
    fn state(&self) -> String;

    /// Produce a fresh challenge, method and verifier triple.
    fn code_challenge_verifier(&self) -> CodeChallenge;

    /// The method this generator implements.
    fn method(&self) -> PkceMethod;
}

/// Lengths shared by both generator flavours, validated on construction.
#[derive(Debug, Clone, Copy)]
struct Lengths {
    state: usize,
    challenge: usize,
}

impl Lengths {
    fn validate(state: usize, challenge: usize) -> Result<Self, Error> {
        if !(MIN_LENGTH..=MAX_LENGTH).contains(&state) {
            return Err(pkce_error(
                PkceErrorKind::InvalidStateLength,
                &format!("invalid state length: {}", state),
            ));
        }
        if !(MIN_LENGTH..=MAX_LENGTH).contains(&challenge) {
            return Err(pkce_error(
                PkceErrorKind::InvalidChallengeLength,
                &format!("invalid challenge length: {}", challenge),
            ));
        }
        Ok(Self { state, challenge })
    }
}

/// Generator whose challenge equals its verifier.
#[derive(Debug, Clone)]
pub struct PlainGenerator {
    lengths: Lengths,
}

impl PlainGenerator {
    /// Create a plain generator. Fails if either length is outside `[32, 96]`.
    pub fn new(state_length: usize, challenge_length: usize) -> Result<Self, Error> {
        Ok(Self {
            lengths: Lengths::validate(state_length, challenge_length)?,
        })
    }
}

impl Generator for PlainGenerator {
    fn state(&self) -> String {
        generate_random(self.lengths.state)
    }

    fn code_challenge_verifier(&self) -> CodeChallenge {
        let verifier = generate_random(self.lengths.challenge);
        CodeChallenge {
            challenge: verifier.clone(),
            method: METHOD_PLAIN,
            verifier,
        }
    }

    fn method(&self) -> PkceMethod {
        PkceMethod::Plain
    }
}

/// Generator whose challenge is the SHA-256 hash of its verifier.
#[derive(Debug, Clone)]
pub struct S256Generator {
    lengths: Lengths,
}

impl S256Generator {
    /// Create an S256 generator. Fails if either length is outside `[32, 96]`.
    pub fn new(state_length: usize, challenge_length: usize) -> Result<Self, Error> {
        Ok(Self {
            lengths: Lengths::validate(state_length, challenge_length)?,
        })
    }
}

impl Generator for S256Generator {
    fn state(&self) -> String {
        generate_random(self.lengths.state)
    }

    fn code_challenge_verifier(&self) -> CodeChallenge {
        let verifier = generate_random(self.lengths.challenge);
        CodeChallenge {
            challenge: s256_challenge(&verifier),
            method: METHOD_S256,
            verifier,
        }
    }

    fn method(&self) -> PkceMethod {
        PkceMethod::S256
    }
}

/// Build a generator for the given method identifier.
///
/// Unrecognized identifiers fall back to `S256`; callers needing strict
/// validation must check the identifier themselves.
pub fn new_generator(
    method: &str,
    state_length: usize,
    challenge_length: usize,
) -> Result<Arc<dyn Generator>, Error> {
    match PkceMethod::from_identifier(method) {
        PkceMethod::Plain => Ok(Arc::new(PlainGenerator::new(state_length, challenge_length)?)),
        PkceMethod::S256 => Ok(Arc::new(S256Generator::new(state_length, challenge_length)?)),
    }
}

/// Compute the S256 code challenge from a code verifier.
///
/// `challenge = BASE64URL-NOPAD(SHA256(verifier))`
pub fn s256_challenge(verifier: &str) -> String {
    let hash = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hash)
}

/// Generate a random string of exactly `length` alphanumeric characters.
///
/// Bytes are drawn from a cryptographically secure generator; any byte at or
/// above `4 * 62` is rejected so that the reduction modulo 62 stays unbiased.
pub fn generate_random(length: usize) -> String {
    let mut rng = rand::thread_rng();
    let mut output = String::with_capacity(length);
    let mut buf = vec![0u8; length];

    while output.len() < length {
        rng.fill(&mut buf[..]);
        for byte in buf.iter().copied().filter(|b| *b < REJECTION_BOUND) {
            output.push(CHARSET[(byte % CHARSET_LEN) as usize] as char);
            if output.len() == length {
                break;
            }
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_alphanumeric(value: &str) -> bool {
        value.bytes().all(|b| CHARSET.contains(&b))
    }

    #[test]
    fn test_generate_random_length_for_all_valid_lengths() {
        for length in MIN_LENGTH..=MAX_LENGTH {
            let value = generate_random(length);
            assert_eq!(value.len(), length);
            assert!(is_alphanumeric(&value), "unexpected character in {}", value);
        }
    }

    #[test]
    fn test_generate_random_uniqueness() {
        assert_ne!(generate_random(32), generate_random(32));
    }

    #[test]
    fn test_lengths_out_of_range_fail_construction() {
        for (state, challenge) in [(31, 32), (97, 32), (32, 31), (32, 97), (0, 0)] {
            assert!(PlainGenerator::new(state, challenge).is_err());
            assert!(S256Generator::new(state, challenge).is_err());
            assert!(new_generator(METHOD_S256, state, challenge).is_err());
        }
    }

    #[test]
    fn test_invalid_state_length_kind() {
        let err = S256Generator::new(16, 32).unwrap_err();
        assert_eq!(
            err.error_kind,
            crate::error::ErrorKind::Pkce(PkceErrorKind::InvalidStateLength)
        );

        let err = S256Generator::new(32, 128).unwrap_err();
        assert_eq!(
            err.error_kind,
            crate::error::ErrorKind::Pkce(PkceErrorKind::InvalidChallengeLength)
        );
    }

    #[test]
    fn test_plain_challenge_equals_verifier() {
        let generator = PlainGenerator::new(32, 64).unwrap();
        let pair = generator.code_challenge_verifier();
        assert_eq!(pair.challenge, pair.verifier);
        assert_eq!(pair.method, "plain");
        assert_eq!(pair.verifier.len(), 64);
        assert_eq!(generator.state().len(), 32);
    }

    #[test]
    fn test_s256_challenge_matches_verifier_hash() {
        let generator = S256Generator::new(40, 48).unwrap();
        let pair = generator.code_challenge_verifier();
        assert_eq!(pair.method, "S256");
        assert_eq!(pair.verifier.len(), 48);
        assert_eq!(pair.challenge, s256_challenge(&pair.verifier));
        assert_eq!(generator.state().len(), 40);
    }

    #[test]
    fn test_s256_challenge_deterministic_and_url_safe() {
        let verifier = "dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk";
        let c1 = s256_challenge(verifier);
        let c2 = s256_challenge(verifier);
        assert_eq!(c1, c2);
        // RFC 7636 appendix B
        assert_eq!(c1, "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM");

        for _ in 0..64 {
            let challenge = s256_challenge(&generate_random(64));
            assert!(!challenge.contains('+'));
            assert!(!challenge.contains('/'));
            assert!(!challenge.contains('='));
        }
    }

    #[test]
    fn test_unknown_method_falls_back_to_s256() {
        let generator = new_generator("S512", 32, 32).unwrap();
        assert_eq!(generator.method(), PkceMethod::S256);

        let generator = new_generator("", 32, 32).unwrap();
        assert_eq!(generator.method(), PkceMethod::S256);

        let generator = new_generator("plain", 32, 32).unwrap();
        assert_eq!(generator.method(), PkceMethod::Plain);
    }
}
