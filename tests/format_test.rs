use achot::format::{format_nonzero, format_number, is_digit_string, parse_number, to_integer};

#[test]
fn groups_thousands_with_dots() {
    assert_eq!(format_number(0), "0");
    assert_eq!(format_number(999), "999");
    assert_eq!(format_number(1000), "1.000");
    assert_eq!(format_number(1000000), "1.000.000");
    assert_eq!(format_number(1234567890i64), "1.234.567.890");
}

#[test]
fn negative_numbers_keep_their_sign() {
    assert_eq!(format_number(-1234), "-1.234");
    assert_eq!(format_number(-12), "-12");
    assert_eq!(format_number("-1.234"), "-1.234");
}

#[test]
fn unset_and_blank_render_empty() {
    assert_eq!(format_number(None::<i64>), "");
    assert_eq!(format_number(""), "");
    assert_eq!(format_number("   "), "");
    assert_eq!(format_number(Some("")), "");
}

#[test]
fn non_numeric_text_renders_empty() {
    assert_eq!(format_number("abc"), "");
    assert_eq!(format_number("12a"), "");
    assert_eq!(format_number("1,5"), "");
}

#[test]
fn numeric_strings_are_regrouped() {
    assert_eq!(format_number("5000"), "5.000");
    assert_eq!(format_number("5.000"), "5.000");
    assert_eq!(format_number("1.0.0.0"), "1.000");
    let owned = String::from("250000");
    assert_eq!(format_number(&owned), "250.000");
}

#[test]
fn formatting_is_idempotent() {
    for n in [0i64, 7, 1000, 65536, 1_000_000, 9_876_543_210] {
        let once = format_number(n);
        assert_eq!(format_number(once.as_str()), once);
    }
}

#[test]
fn parse_inverts_format() {
    for n in [0i64, 42, 1000, 123_456, 1_000_000, i64::MAX] {
        assert_eq!(parse_number(&format_number(n)), n.to_string());
    }
    assert_eq!(parse_number(""), "");
}

#[test]
fn nonzero_variant_hides_zero() {
    assert_eq!(format_nonzero(0), "");
    assert_eq!(format_nonzero("0"), "");
    assert_eq!(format_nonzero(1500), "1.500");
}

#[test]
fn digit_checks() {
    assert!(is_digit_string("0123"));
    assert!(!is_digit_string(""));
    assert!(!is_digit_string("-1"));
    assert!(!is_digit_string("1.000"));
    assert_eq!(to_integer("1.000"), Some(1000));
    assert_eq!(to_integer(" 12 "), Some(12));
    assert_eq!(to_integer("99999999999999999999"), None);
}
