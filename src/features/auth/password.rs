//! Password policy checks and strength scoring.
//!
//! Registration runs [`assess`] before anything is sent; the server applies
//! its own validators again. Length is counted in characters, not bytes.

use std::fmt;

pub const MIN_LENGTH: usize = 8;
pub const SPECIAL_CHARACTERS: &str = "!@#$%^&*(),.?\":{}|<>";

/// Known-weak substrings, matched case-insensitively.
pub const COMMON_SEQUENCES: [&str; 15] = [
    "qwertyuiop",
    "asdfghjkl",
    "zxcvbnm",
    "1234567890",
    "password",
    "admin",
    "12345678",
    "qwerty123",
    "1q2w3e4r",
    "qazwsxedc",
    "iloveyou",
    "abcdefgh",
    "987654321",
    "11111111",
    "00000000",
];

const LONG_BONUS_LENGTH: usize = 12;
const EXTRA_LONG_BONUS_LENGTH: usize = 16;
const MAX_SCORE: f64 = 6.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PasswordRule {
    Length,
    Uppercase,
    Lowercase,
    Numbers,
    SpecialChars,
    NoCommonSequences,
}

impl PasswordRule {
    /// Rules in evaluation order; errors are reported in this order.
    pub const ALL: [Self; 6] = [
        Self::Length,
        Self::Uppercase,
        Self::Lowercase,
        Self::Numbers,
        Self::SpecialChars,
        Self::NoCommonSequences,
    ];

    /// Stable key used in JSON output.
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Self::Length => "length",
            Self::Uppercase => "uppercase",
            Self::Lowercase => "lowercase",
            Self::Numbers => "numbers",
            Self::SpecialChars => "specialChars",
            Self::NoCommonSequences => "noCommonSequences",
        }
    }

    /// Message reported when the rule fails.
    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            Self::Length => "Password must be at least 8 characters long",
            Self::Uppercase => "Password must contain at least one uppercase letter",
            Self::Lowercase => "Password must contain at least one lowercase letter",
            Self::Numbers => "Password must contain at least one digit",
            Self::SpecialChars => {
                "Password must contain at least one special character (!@#$%^&* etc.)"
            }
            Self::NoCommonSequences => "Password contains a common character sequence",
        }
    }

    /// Short checklist label.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Length => "At least 8 characters",
            Self::Uppercase => "Uppercase letter",
            Self::Lowercase => "Lowercase letter",
            Self::Numbers => "Digit",
            Self::SpecialChars => "Special character",
            Self::NoCommonSequences => "No common sequences",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PasswordChecks {
    pub length: bool,
    pub uppercase: bool,
    pub lowercase: bool,
    pub numbers: bool,
    pub special_chars: bool,
    pub no_common_sequences: bool,
}

impl PasswordChecks {
    #[must_use]
    pub fn passed(&self, rule: PasswordRule) -> bool {
        match rule {
            PasswordRule::Length => self.length,
            PasswordRule::Uppercase => self.uppercase,
            PasswordRule::Lowercase => self.lowercase,
            PasswordRule::Numbers => self.numbers,
            PasswordRule::SpecialChars => self.special_chars,
            PasswordRule::NoCommonSequences => self.no_common_sequences,
        }
    }

    #[must_use]
    pub fn passed_count(&self) -> usize {
        PasswordRule::ALL
            .iter()
            .filter(|rule| self.passed(**rule))
            .count()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Strength {
    VeryWeak,
    Weak,
    Medium,
    Strong,
    VeryStrong,
}

impl Strength {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::VeryWeak => "very-weak",
            Self::Weak => "weak",
            Self::Medium => "medium",
            Self::Strong => "strong",
            Self::VeryStrong => "very-strong",
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::VeryWeak => "Very weak",
            Self::Weak => "Weak",
            Self::Medium => "Medium",
            Self::Strong => "Strong",
            Self::VeryStrong => "Very strong",
        }
    }
}

impl fmt::Display for Strength {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PasswordAssessment {
    pub checks: PasswordChecks,
    pub is_valid: bool,
    pub strength: Strength,
    pub errors: Vec<&'static str>,
}

/// Evaluates a password against every rule.
#[must_use]
pub fn assess(password: &str) -> PasswordAssessment {
    // Counted in UTF-16 units, so characters outside the BMP count twice.
    let length = password.encode_utf16().count();
    let lowered = password.to_lowercase();

    let checks = PasswordChecks {
        length: length >= MIN_LENGTH,
        uppercase: password.chars().any(is_upper_letter),
        lowercase: password.chars().any(is_lower_letter),
        numbers: password.chars().any(|c| c.is_ascii_digit()),
        special_chars: password.chars().any(|c| SPECIAL_CHARACTERS.contains(c)),
        no_common_sequences: !COMMON_SEQUENCES
            .iter()
            .any(|sequence| lowered.contains(sequence)),
    };

    let errors = PasswordRule::ALL
        .iter()
        .filter(|rule| !checks.passed(**rule))
        .map(|rule| rule.message())
        .collect::<Vec<_>>();

    PasswordAssessment {
        checks,
        is_valid: errors.is_empty(),
        strength: calculate_strength(&checks, length),
        errors,
    }
}

/// Scores passed rules plus length bonuses against a fixed base of six, clamped to 1.
#[must_use]
pub fn calculate_strength(checks: &PasswordChecks, length: usize) -> Strength {
    let mut score = checks.passed_count();
    if length >= LONG_BONUS_LENGTH {
        score += 1;
    }
    if length >= EXTRA_LONG_BONUS_LENGTH {
        score += 1;
    }

    #[allow(clippy::cast_precision_loss)]
    let ratio = (score as f64 / MAX_SCORE).min(1.0);

    if ratio < 0.3 {
        Strength::VeryWeak
    } else if ratio < 0.5 {
        Strength::Weak
    } else if ratio < 0.7 {
        Strength::Medium
    } else if ratio < 0.9 {
        Strength::Strong
    } else {
        Strength::VeryStrong
    }
}

/// Help text listing the password requirements.
#[must_use]
pub fn requirements_text() -> String {
    format!(
        "Password must contain:\n\
         - at least {MIN_LENGTH} characters\n\
         - uppercase and lowercase letters\n\
         - digits\n\
         - special characters (!@#$%^&* etc.)\n\
         - no common sequences (qwerty, 123456 and similar)"
    )
}

// Ё/ё sit outside the contiguous А-я block and are not counted.
fn is_upper_letter(c: char) -> bool {
    c.is_ascii_uppercase() || ('А'..='Я').contains(&c)
}

fn is_lower_letter(c: char) -> bool {
    c.is_ascii_lowercase() || ('а'..='я').contains(&c)
}
