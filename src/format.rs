use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref DIGITS_REGEX: Regex = Regex::new(r"^[0-9]+$").unwrap();
    static ref INTEGER_REGEX: Regex = Regex::new(r"^-?[0-9]+$").unwrap();
}

/// Grouping separator used for thousands ("1.000.000").
pub const GROUP_SEPARATOR: char = '.';

/// A value accepted by [`format_number`]
///
/// Numeric cells travel through the application either as plain integers
/// (aggregates, persisted values) or as the digit strings held while editing.
/// Both share one formatting path; `Unset` covers every flavour of "nothing
/// entered".
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NumberInput<'a> {
    Int(i64),
    Text(&'a str),
    Unset,
}

impl From<i64> for NumberInput<'_> {
    fn from(value: i64) -> Self {
        NumberInput::Int(value)
    }
}

impl From<i32> for NumberInput<'_> {
    fn from(value: i32) -> Self {
        NumberInput::Int(value.into())
    }
}

impl From<usize> for NumberInput<'_> {
    fn from(value: usize) -> Self {
        NumberInput::Int(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

impl<'a> From<&'a str> for NumberInput<'a> {
    fn from(value: &'a str) -> Self {
        NumberInput::Text(value)
    }
}

impl<'a> From<&'a String> for NumberInput<'a> {
    fn from(value: &'a String) -> Self {
        NumberInput::Text(value.as_str())
    }
}

impl<'a, T: Into<NumberInput<'a>>> From<Option<T>> for NumberInput<'a> {
    fn from(value: Option<T>) -> Self {
        value.map_or(NumberInput::Unset, Into::into)
    }
}

/// Format a number with thousands grouping
///
/// Returns the empty string for unset or blank input. Text input has any
/// existing grouping separators stripped before it is parsed, so the function
/// is idempotent on its own output. Text that is not an integer after
/// stripping also yields the empty string.
///
/// # Arguments
/// * `value` - An integer, a numeric string, or `None`
///
/// # Returns
/// * `String` - The grouped representation, or `""`
///
/// # Examples
/// ```
/// use achot::format::format_number;
///
/// assert_eq!(format_number(1000000), "1.000.000");
/// assert_eq!(format_number("5000"), "5.000");
/// assert_eq!(format_number("1.250"), "1.250");
/// assert_eq!(format_number(None::<i64>), "");
/// assert_eq!(format_number("abc"), "");
/// ```
pub fn format_number<'a>(value: impl Into<NumberInput<'a>>) -> String {
    match value.into() {
        NumberInput::Int(n) => group_digits(n),
        NumberInput::Text(text) => match to_integer(text) {
            Some(n) => group_digits(n),
            None => String::new(),
        },
        NumberInput::Unset => String::new(),
    }
}

/// Like [`format_number`] but renders zero as the empty string.
///
/// Grid cells and per-column footer sums use this so an untouched column
/// reads blank instead of "0".
pub fn format_nonzero<'a>(value: impl Into<NumberInput<'a>>) -> String {
    let formatted = format_number(value);
    if formatted == "0" { String::new() } else { formatted }
}

/// Remove grouping separators from a displayed number
///
/// Leaves a plain digit string (or an empty one). No validation happens here;
/// use [`is_digit_string`] or [`to_integer`] on the result.
///
/// # Examples
/// ```
/// use achot::format::parse_number;
///
/// assert_eq!(parse_number("1.000.000"), "1000000");
/// assert_eq!(parse_number(""), "");
/// ```
pub fn parse_number(display: &str) -> String {
    display.replace(GROUP_SEPARATOR, "")
}

/// True when `s` is a non-empty run of ASCII digits.
pub fn is_digit_string(s: &str) -> bool {
    DIGITS_REGEX.is_match(s)
}

/// Strip separators and surrounding whitespace, then parse as `i64`.
///
/// `None` for blank, non-numeric or out-of-range text.
pub fn to_integer(text: &str) -> Option<i64> {
    let stripped = parse_number(text);
    let stripped = stripped.trim();
    if !INTEGER_REGEX.is_match(stripped) {
        return None;
    }
    stripped.parse::<i64>().ok()
}

fn group_digits(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);

    if n < 0 {
        out.push('-');
    }
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(GROUP_SEPARATOR);
        }
        out.push(c);
    }
    out
}
