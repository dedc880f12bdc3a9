//! Input validation for values that cross the process boundary.
//!
//! Every validator owns exactly one parameter kind. Validators trim their
//! input and return the normalized value; nothing is partially accepted.

use std::error::Error;
use std::fmt;

use serde_json::Number;

pub const MAX_IDENTIFIER_LEN: usize = 100;
pub const MAX_QUERY_LEN: usize = 2000;
pub const MAX_GLOB_LEN: usize = 200;
pub const MAX_DESTDIR_LEN: usize = 500;
pub const MAX_FORMAT_LEN: usize = 100;
pub const MAX_ROWS: u64 = 10_000;

const GLOB_PUNCTUATION: &[char] = &['.', '*', '?', '[', ']', '_', '-', '/', '{', '}', '|'];

/// A parameter failed a syntactic rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub value: String,
    pub rule: String,
}

impl ValidationError {
    fn new(field: &'static str, value: impl Into<String>, rule: impl Into<String>) -> Self {
        Self {
            field,
            value: value.into(),
            rule: rule.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {} {:?}: {}", self.field, self.value, self.rule)
    }
}

impl Error for ValidationError {}

pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validates an archive item identifier.
///
/// # Errors
/// Returns `ValidationError` when the identifier is empty, longer than
/// [`MAX_IDENTIFIER_LEN`], or contains characters outside `[A-Za-z0-9._-]`.
pub fn identifier(raw: &str) -> ValidationResult<String> {
    let value = bounded("identifier", raw, MAX_IDENTIFIER_LEN)?;
    if !value
        .chars()
        .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '.' | '_' | '-'))
    {
        return Err(ValidationError::new(
            "identifier",
            value,
            "may only contain ASCII letters, digits, '.', '_' and '-'",
        ));
    }
    Ok(value.to_string())
}

/// Validates a free-text search query.
///
/// # Errors
/// Returns `ValidationError` when the query is empty or longer than [`MAX_QUERY_LEN`].
pub fn query(raw: &str) -> ValidationResult<String> {
    bounded("query", raw, MAX_QUERY_LEN).map(str::to_string)
}

/// Validates a file glob pattern.
///
/// # Errors
/// Returns `ValidationError` when the pattern is empty, longer than
/// [`MAX_GLOB_LEN`], or contains characters outside the glob alphabet.
pub fn glob(raw: &str) -> ValidationResult<String> {
    let value = bounded("glob", raw, MAX_GLOB_LEN)?;
    if let Some(bad) = value
        .chars()
        .find(|ch| !ch.is_ascii_alphanumeric() && !GLOB_PUNCTUATION.contains(ch))
    {
        return Err(ValidationError::new(
            "glob",
            value,
            format!("character {bad:?} is not allowed in glob patterns"),
        ));
    }
    Ok(value.to_string())
}

/// Validates a download destination directory.
///
/// # Errors
/// Returns `ValidationError` when the path is empty or longer than [`MAX_DESTDIR_LEN`].
pub fn destdir(raw: &str) -> ValidationResult<String> {
    bounded("destdir", raw, MAX_DESTDIR_LEN).map(str::to_string)
}

/// Validates a file format name.
///
/// # Errors
/// Returns `ValidationError` when the format is empty or longer than [`MAX_FORMAT_LEN`].
pub fn format(raw: &str) -> ValidationResult<String> {
    bounded("format", raw, MAX_FORMAT_LEN).map(str::to_string)
}

/// Validates a result row count in `1..=MAX_ROWS`.
///
/// # Errors
/// Returns `ValidationError` for non-integers and out-of-range values.
pub fn rows(raw: &Number) -> ValidationResult<u32> {
    match whole_number(raw) {
        Some(value @ 1..=MAX_ROWS) => u32::try_from(value)
            .map_err(|_| ValidationError::new("rows", raw.to_string(), "out of range")),
        Some(_) => Err(ValidationError::new(
            "rows",
            raw.to_string(),
            format!("must be between 1 and {MAX_ROWS}"),
        )),
        None => Err(ValidationError::new(
            "rows",
            raw.to_string(),
            format!("must be an integer between 1 and {MAX_ROWS}"),
        )),
    }
}

/// Validates a 1-based page number.
///
/// # Errors
/// Returns `ValidationError` for non-integers, values below 1, and values
/// that do not fit in a `u32`.
pub fn page(raw: &Number) -> ValidationResult<u32> {
    match whole_number(raw) {
        Some(value) if value >= 1 => u32::try_from(value).map_err(|_| {
            ValidationError::new("page", raw.to_string(), format!("must be at most {}", u32::MAX))
        }),
        _ => Err(ValidationError::new(
            "page",
            raw.to_string(),
            "must be a positive integer",
        )),
    }
}

/// Validates a metadata field name (`[A-Za-z_][A-Za-z0-9_]*`).
///
/// # Errors
/// Returns `ValidationError` when the name is empty or not identifier-shaped.
pub fn field_name(raw: &str) -> ValidationResult<String> {
    let value = raw.trim();
    let mut chars = value.chars();
    let valid = chars
        .next()
        .is_some_and(|first| first.is_ascii_alphabetic() || first == '_')
        && chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_');
    if !valid {
        return Err(ValidationError::new(
            "field",
            value,
            "must start with a letter or '_' followed by letters, digits or '_'",
        ));
    }
    Ok(value.to_string())
}

/// Accepts integral floats such as `2.0`, which some clients send for integers.
///
/// An integral `f64` displays without a fractional part, so parsing its
/// display form is an exact conversion that rejects negatives and overflow.
fn whole_number(raw: &Number) -> Option<u64> {
    raw.as_u64().or_else(|| {
        raw.as_f64()
            .filter(|value| value.is_finite() && value.fract() == 0.0)
            .and_then(|value| value.to_string().parse().ok())
    })
}

fn bounded<'a>(field: &'static str, raw: &'a str, max_len: usize) -> ValidationResult<&'a str> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(ValidationError::new(field, value, "must not be empty"));
    }
    if value.chars().count() > max_len {
        return Err(ValidationError::new(
            field,
            value,
            format!("must be at most {max_len} characters"),
        ));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn number(json: &str) -> Number {
        serde_json::from_str(json).expect("valid JSON number")
    }

    #[test]
    fn identifier_accepts_class_and_trims() {
        assert_eq!(identifier("  apollo_11.mission-A  ").unwrap(), "apollo_11.mission-A");
        assert!(identifier(&"a".repeat(MAX_IDENTIFIER_LEN)).is_ok());
    }

    #[test]
    fn identifier_rejects_outside_class() {
        for bad in ["", "   ", "a b", "item;rm", "item&x", "a/b", "ïtem", "$(id)"] {
            assert!(identifier(bad).is_err(), "{bad:?} should be rejected");
        }
        assert!(identifier(&"a".repeat(MAX_IDENTIFIER_LEN + 1)).is_err());
    }

    #[test]
    fn query_has_no_character_class() {
        assert_eq!(query(" title:\"Apollo 11\" & more ").unwrap(), "title:\"Apollo 11\" & more");
        assert!(query("").is_err());
        assert!(query(&"q".repeat(MAX_QUERY_LEN + 1)).is_err());
    }

    #[test]
    fn glob_alphabet() {
        assert_eq!(glob("*.{mp3,ogg}").unwrap_err().field, "glob");
        assert!(glob("*.mp3|*.ogg").is_ok());
        assert!(glob("data/[a-z]?_*.{txt}").is_ok());
        assert!(glob("*.mp3; rm -rf /").is_err());
        assert!(glob("$HOME").is_err());
    }

    #[test]
    fn destdir_and_format_are_length_bounded() {
        assert_eq!(destdir(" /tmp/my downloads ").unwrap(), "/tmp/my downloads");
        assert!(destdir(&"d".repeat(MAX_DESTDIR_LEN + 1)).is_err());
        assert_eq!(format(" VBR MP3 ").unwrap(), "VBR MP3");
        assert!(format(" ").is_err());
        assert!(format(&"f".repeat(MAX_FORMAT_LEN + 1)).is_err());
    }

    #[test]
    fn rows_bounds() {
        assert_eq!(rows(&number("1")).unwrap(), 1);
        assert_eq!(rows(&number("10000")).unwrap(), 10_000);
        assert_eq!(rows(&number("2.0")).unwrap(), 2);
        for bad in ["0", "10001", "3.5", "-1", "-2.0"] {
            assert!(rows(&number(bad)).is_err(), "rows={bad} should fail");
        }
    }

    #[test]
    fn page_must_be_positive_integer() {
        assert_eq!(page(&number("1")).unwrap(), 1);
        assert_eq!(page(&number("42")).unwrap(), 42);
        assert_eq!(page(&number("7.0")).unwrap(), 7);
        for bad in ["0", "-3", "1.5", "-0.0"] {
            let err = page(&number(bad)).unwrap_err();
            assert_eq!(err.rule, "must be a positive integer", "page={bad}");
        }
    }

    #[test]
    fn page_beyond_u32_is_too_large() {
        for big in ["4294967296", "4294967296.0"] {
            let err = page(&number(big)).unwrap_err();
            assert_eq!(err.rule, format!("must be at most {}", u32::MAX), "page={big}");
        }
    }

    #[test]
    fn field_names() {
        assert_eq!(field_name("valid_field1").unwrap(), "valid_field1");
        assert!(field_name("_private").is_ok());
        assert!(field_name("1invalid").is_err());
        assert!(field_name("invalid-field").is_err());
        assert!(field_name("").is_err());
    }

    #[test]
    fn error_names_value_and_rule() {
        let err = identifier("bad item").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("identifier"));
        assert!(message.contains("bad item"));
        assert!(message.contains("letters"));
    }
}
