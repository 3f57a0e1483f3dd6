//! Parsing of numeric form inputs.
//!
//! Form inputs are strings. A blank or unparsable input becomes `None`, which serialises
//! as JSON `null`; it is never forwarded as an empty string or `NaN`.

pub fn parse_optional_int(input: Option<&str>) -> Option<i64> {
    input.and_then(|s| s.trim().parse::<i64>().ok())
}

pub fn parse_optional_decimal(input: Option<&str>) -> Option<f64> {
    input
        .and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|n| n.is_finite())
}
