// Target Classification
//
// Decides which identifying field a free-form `full_scan` target is sent as.
// Rules are ordered and the first match wins:
//
//   contains '@'                      -> email
//   four dot-separated digit groups   -> ip      (no octet range check)
//   starts with http:// or https://   -> url
//   anything else                     -> domain
//
// The IPv4 rule is deliberately loose: "999.999.999.999" is an ip. Range
// validation is left to the Shield API.

use lazy_static::lazy_static;
use regex::Regex;

use crate::models::{TargetKind, TargetParameters};

lazy_static! {
    static ref IPV4_SHAPE: Regex = Regex::new(r"^\d+\.\d+\.\d+\.\d+$").unwrap();
}

/// Classify a target string. Total over all inputs.
pub fn classify(target: &str) -> TargetParameters {
    TargetParameters::new(classify_kind(target), target)
}

/// The kind a target would be classified as, without copying it
pub fn classify_kind(target: &str) -> TargetKind {
    if target.contains('@') {
        TargetKind::Email
    } else if is_ipv4_shaped(target) {
        TargetKind::Ip
    } else if target.starts_with("http://") || target.starts_with("https://") {
        TargetKind::Url
    } else {
        TargetKind::Domain
    }
}

// `\d` in the regex crate is Unicode-aware; the digit groups must be ASCII.
fn is_ipv4_shaped(target: &str) -> bool {
    target.is_ascii() && IPV4_SHAPE.is_match(target)
}
