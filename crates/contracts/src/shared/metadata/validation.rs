//! Validation rules for form fields

use std::fmt;

use once_cell::sync::{Lazy, OnceCell};
use regex::Regex;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?)+$")
        .expect("email pattern is valid")
});

pub const REQUIRED_MESSAGE: &str = "This field is required.";
pub const INVALID_CHOICE_MESSAGE: &str =
    "Select a valid choice. That choice is not one of the available choices.";

/// Regex rule with its error message, compiled on first use.
///
/// Declare as a `static` so every validation shares one compiled regex.
pub struct Pattern {
    source: &'static str,
    error: &'static str,
    compiled: OnceCell<Result<Regex, regex::Error>>,
}

impl Pattern {
    pub const fn new(source: &'static str, error: &'static str) -> Self {
        Self {
            source,
            error,
            compiled: OnceCell::new(),
        }
    }

    pub fn source(&self) -> &'static str {
        self.source
    }

    pub fn error(&self) -> &'static str {
        self.error
    }

    pub fn regex(&self) -> Result<&Regex, &regex::Error> {
        self.compiled.get_or_init(|| Regex::new(self.source)).as_ref()
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Pattern").field(&self.source).finish()
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source && self.error == other.error
    }
}

/// Validation rules for a field
/// Copy trait for efficient passing
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ValidationRules {
    pub required: bool,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub pattern: Option<&'static Pattern>,
}

impl ValidationRules {
    /// No constraints, field optional
    pub const fn none() -> Self {
        Self {
            required: false,
            min: None,
            max: None,
            min_length: None,
            max_length: None,
            pattern: None,
        }
    }

    pub const fn required() -> Self {
        Self {
            required: true,
            ..Self::none()
        }
    }

    pub const fn with_max_length(mut self, max: usize) -> Self {
        self.max_length = Some(max);
        self
    }

    pub const fn with_min_length(mut self, min: usize) -> Self {
        self.min_length = Some(min);
        self
    }

    pub const fn with_range(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    pub const fn with_pattern(mut self, pattern: &'static Pattern) -> Self {
        self.pattern = Some(pattern);
        self
    }

    /// Validate an already-trimmed string value. Empty optional values pass.
    pub fn validate_string(&self, value: &str) -> Result<(), String> {
        if value.is_empty() {
            return if self.required {
                Err(REQUIRED_MESSAGE.to_string())
            } else {
                Ok(())
            };
        }

        let len = value.chars().count();
        if let Some(max) = self.max_length {
            if len > max {
                return Err(format!(
                    "Ensure this value has at most {} characters (it has {}).",
                    max, len
                ));
            }
        }
        if let Some(min) = self.min_length {
            if len < min {
                return Err(format!(
                    "Ensure this value has at least {} characters (it has {}).",
                    min, len
                ));
            }
        }

        if let Some(pattern) = self.pattern {
            // Invalid patterns are rejected at startup
            let matches = pattern.regex().map(|re| re.is_match(value)).unwrap_or(false);
            if !matches {
                return Err(pattern.error().to_string());
            }
        }

        Ok(())
    }

    /// Validate a numeric value against min/max rules
    pub fn validate_number(&self, value: f64) -> Result<(), String> {
        if let Some(min) = self.min {
            if value < min {
                return Err(format!(
                    "Ensure this value is greater than or equal to {}.",
                    min
                ));
            }
        }
        if let Some(max) = self.max {
            if value > max {
                return Err(format!("Ensure this value is less than or equal to {}.", max));
            }
        }
        Ok(())
    }
}

pub fn is_valid_email(value: &str) -> bool {
    EMAIL_RE.is_match(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_empty_string() {
        let rules = ValidationRules::required();
        assert_eq!(rules.validate_string(""), Err(REQUIRED_MESSAGE.to_string()));
        assert!(ValidationRules::none().validate_string("").is_ok());
    }

    #[test]
    fn test_max_length_counts_characters() {
        let rules = ValidationRules::none().with_max_length(3);
        assert!(rules.validate_string("абв").is_ok());
        assert_eq!(
            rules.validate_string("abcd"),
            Err("Ensure this value has at most 3 characters (it has 4).".to_string())
        );
    }

    static LOWERCASE: Pattern = Pattern::new(r"^[a-z_]+$", "Use lowercase letters.");
    static BROKEN: Pattern = Pattern::new(r"^[a-z", "Never shown.");

    #[test]
    fn test_pattern_uses_custom_error() {
        let rules = ValidationRules::none().with_pattern(&LOWERCASE);
        assert!(rules.validate_string("gpt_model").is_ok());
        assert_eq!(
            rules.validate_string("GPT-4"),
            Err("Use lowercase letters.".to_string())
        );
    }

    #[test]
    fn test_pattern_is_compiled_once() {
        let first = LOWERCASE.regex().unwrap() as *const Regex;
        let second = LOWERCASE.regex().unwrap() as *const Regex;
        assert_eq!(first, second);
        assert!(BROKEN.regex().is_err());
    }

    #[test]
    fn test_number_range() {
        let rules = ValidationRules::none().with_range(Some(0.0), Some(10.0));
        assert!(rules.validate_number(5.0).is_ok());
        assert!(rules.validate_number(11.0).is_err());
    }

    #[test]
    fn test_email() {
        assert!(is_valid_email("ops@example.com"));
        assert!(!is_valid_email("not-an-email"));
    }
}
