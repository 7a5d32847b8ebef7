//! Passphrase policy.
//!
//! Minimum-length checks run here, in front of the cipher, and a coarse
//! strength rating is offered as feedback while choosing a password.

use crate::error::CipherError;

/// Minimum password length in characters
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Symbols that count toward the strength score
const STRENGTH_SYMBOLS: &[char] = &['$', '@', '#', '&', '!'];

/// Coarse strength rating for feedback while typing a password
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Strength {
    Empty,
    Weak,
    Medium,
    Strong,
}

impl Strength {
    /// Rate a password
    pub fn of(password: &str) -> Self {
        if password.is_empty() {
            return Strength::Empty;
        }
        Self::from_score(strength_score(password))
    }

    /// Map a 0..=6 score onto a rating
    pub fn from_score(score: u8) -> Self {
        match score {
            0..=2 => Strength::Weak,
            3..=4 => Strength::Medium,
            _ => Strength::Strong,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Strength::Empty => "Enter encryption key",
            Strength::Weak => "Weak encryption key",
            Strength::Medium => "Medium strength encryption key",
            Strength::Strong => "Strong encryption key",
        }
    }
}

impl std::fmt::Display for Strength {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Score a password from 0 to 6.
///
/// One point each for: at least 8 characters, at least 12 characters, a
/// lowercase letter, an uppercase letter, a digit, one of `$@#&!`.
pub fn strength_score(password: &str) -> u8 {
    let len = password.chars().count();
    let checks = [
        len >= 8,
        len >= 12,
        password.chars().any(|c| c.is_ascii_lowercase()),
        password.chars().any(|c| c.is_ascii_uppercase()),
        password.chars().any(|c| c.is_ascii_digit()),
        password.chars().any(|c| STRENGTH_SYMBOLS.contains(&c)),
    ];

    checks.iter().filter(|&&passed| passed).count() as u8
}

/// Validate that a password may be handed to the cipher.
///
/// Leading and trailing whitespace does not count toward the length.
pub fn validate_password(password: &str, min_len: usize) -> Result<(), CipherError> {
    let trimmed = password.trim();

    if trimmed.is_empty() {
        return Err(CipherError::PreconditionViolation(
            "Please enter an encryption key".to_string(),
        ));
    }

    if trimmed.chars().count() < min_len {
        return Err(CipherError::PreconditionViolation(format!(
            "Key must be at least {} characters long",
            min_len
        )));
    }

    Ok(())
}
