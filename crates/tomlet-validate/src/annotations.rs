// Tomlet - TOML toolchain with config schema validation
//
// Copyright (c) 2025 Tomlet contributors.
//
// SPDX-License-Identifier: Apache-2.0
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE file at the
// root of this repository or at: http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The built-in annotation set.
//!
//! String checks (`@regex`, `@start_with`, `@end_with`, `@contain`,
//! `@min_length`, `@max_length`, `@format`), numeric bounds (`@min`,
//! `@max`, `@range`, `@int`, `@float`), and the advisory `@deprecated`,
//! which warns but never fails.

use crate::value::EvalValue;
use regex::Regex;
use std::sync::OnceLock;

/// Result of applying one annotation to one value.
#[derive(Debug, Clone, PartialEq)]
pub enum AnnotationOutcome {
    Pass,
    Fail,
    /// `@deprecated`: carry the message as a warning; never fails.
    Deprecated(String),
    /// The annotation name is not recognized.
    UnknownAnnotation,
    /// `@format` with an unrecognized format id.
    UnknownFormat(String),
}

fn email_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^[a-z0-9!#$%&'*+/=?^_`{|}~-]+(\.[a-z0-9!#$%&'*+/=?^_`{|}~-]+)*@([a-z0-9]([a-z0-9-]*[a-z0-9])?\.)+[a-z0-9]([a-z0-9-]*[a-z0-9])?$",
        )
        .expect("email pattern")
    })
}

fn uuid_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$")
            .expect("uuid pattern")
    })
}

fn ipv4_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^(25[0-5]|2[0-4][0-9]|1[0-9][0-9]|[1-9]?[0-9])\.(25[0-5]|2[0-4][0-9]|1[0-9][0-9]|[1-9]?[0-9])\.(25[0-5]|2[0-4][0-9]|1[0-9][0-9]|[1-9]?[0-9])\.(25[0-5]|2[0-4][0-9]|1[0-9][0-9]|[1-9]?[0-9])$",
        )
        .expect("ipv4 pattern")
    })
}

fn ipv6_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^((?:[0-9a-fA-F]{1,4}:){7}[0-9a-fA-F]{1,4}|(?:[0-9a-fA-F]{1,4}:){1,7}:|(?:[0-9a-fA-F]{1,4}:){1,6}:[0-9a-fA-F]{1,4}|(?:[0-9a-fA-F]{1,4}:){1,5}(?::[0-9a-fA-F]{1,4}){1,2}|(?:[0-9a-fA-F]{1,4}:){1,4}(?::[0-9a-fA-F]{1,4}){1,3}|(?:[0-9a-fA-F]{1,4}:){1,3}(?::[0-9a-fA-F]{1,4}){1,4}|(?:[0-9a-fA-F]{1,4}:){1,2}(?::[0-9a-fA-F]{1,4}){1,5}|[0-9a-fA-F]{1,4}:(?::[0-9a-fA-F]{1,4}){1,6}|:(?:(?::[0-9a-fA-F]{1,4}){1,7}|:))$",
        )
        .expect("ipv6 pattern")
    })
}

fn url_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^(?:(?:https?|ftp)://)?(?:\S+(?::\S*)?@)?((?:[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?\.)+[A-Za-z]{2,6}|(?:\d{1,3}\.){3}\d{1,3})(?::\d{2,5})?(?:/[^\s?#]*)?(?:\?[^\s#]*)?(?:#\S*)?$",
        )
        .expect("url pattern")
    })
}

fn phone_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\+?[0-9]{1,4}?[-. ]?\(?[0-9]{1,4}?\)?[-. ]?[0-9]{1,4}[-. ]?[0-9]{1,9}$")
            .expect("phone pattern")
    })
}

/// Applies the annotation `name` with evaluated `args` to `target`.
///
/// `format_id` carries the bare identifier passed to `@format`, which is
/// not a value expression.
pub fn check_annotation(
    name: &str,
    args: &[EvalValue],
    format_id: Option<&str>,
    target: &EvalValue,
) -> AnnotationOutcome {
    let pass = |ok: bool| {
        if ok {
            AnnotationOutcome::Pass
        } else {
            AnnotationOutcome::Fail
        }
    };
    let arg_number = |index: usize| args.get(index).and_then(EvalValue::as_number);
    let arg_str = |index: usize| args.get(index).and_then(EvalValue::as_str);

    match name {
        "regex" => match (arg_str(0), target.as_str()) {
            (Some(pattern), Some(value)) => match Regex::new(pattern) {
                Ok(re) => pass(re.is_match(value)),
                Err(_) => AnnotationOutcome::Fail,
            },
            _ => AnnotationOutcome::Fail,
        },
        "start_with" => match (arg_str(0), target.as_str()) {
            (Some(prefix), Some(value)) => pass(value.starts_with(prefix)),
            _ => AnnotationOutcome::Fail,
        },
        "end_with" => match (arg_str(0), target.as_str()) {
            (Some(suffix), Some(value)) => pass(value.ends_with(suffix)),
            _ => AnnotationOutcome::Fail,
        },
        "contain" => match (arg_str(0), target.as_str()) {
            (Some(needle), Some(value)) => pass(value.contains(needle)),
            _ => AnnotationOutcome::Fail,
        },
        "min_length" => match (arg_number(0), target.as_str()) {
            (Some(min), Some(value)) => pass(value.chars().count() as f64 >= min),
            _ => AnnotationOutcome::Fail,
        },
        "max_length" => match (arg_number(0), target.as_str()) {
            (Some(max), Some(value)) => pass(value.chars().count() as f64 <= max),
            _ => AnnotationOutcome::Fail,
        },
        "min" => match (arg_number(0), target.as_number()) {
            (Some(min), Some(value)) => pass(value >= min),
            _ => AnnotationOutcome::Fail,
        },
        "max" => match (arg_number(0), target.as_number()) {
            (Some(max), Some(value)) => pass(value <= max),
            _ => AnnotationOutcome::Fail,
        },
        "range" => match (arg_number(0), arg_number(1), target.as_number()) {
            (Some(lo), Some(hi), Some(value)) => pass(value >= lo && value <= hi),
            _ => AnnotationOutcome::Fail,
        },
        "int" => match target.as_number() {
            Some(value) => pass(value.floor() == value),
            None => AnnotationOutcome::Fail,
        },
        "float" => match target.as_number() {
            Some(value) => pass(value.floor() != value),
            None => AnnotationOutcome::Fail,
        },
        "format" => {
            let Some(format) = format_id else {
                return AnnotationOutcome::Fail;
            };
            let Some(value) = target.as_str() else {
                return AnnotationOutcome::Fail;
            };
            let re = match format {
                "email" => email_re(),
                "uuid" => uuid_re(),
                "ipv4" => ipv4_re(),
                "ipv6" => ipv6_re(),
                "url" => url_re(),
                "phone" => phone_re(),
                other => return AnnotationOutcome::UnknownFormat(other.to_string()),
            };
            pass(re.is_match(value))
        }
        "deprecated" => {
            let message = arg_str(0).unwrap_or("deprecated").to_string();
            AnnotationOutcome::Deprecated(message)
        }
        _ => AnnotationOutcome::UnknownAnnotation,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(v: &str) -> EvalValue {
        EvalValue::Str(v.to_string())
    }

    fn n(v: f64) -> EvalValue {
        EvalValue::Number(v)
    }

    #[test]
    fn test_string_checks() {
        assert_eq!(
            check_annotation("start_with", &[s("ab")], None, &s("abc")),
            AnnotationOutcome::Pass
        );
        assert_eq!(
            check_annotation("end_with", &[s("bc")], None, &s("abc")),
            AnnotationOutcome::Pass
        );
        assert_eq!(
            check_annotation("contain", &[s("zz")], None, &s("abc")),
            AnnotationOutcome::Fail
        );
    }

    #[test]
    fn test_length_bounds() {
        assert_eq!(
            check_annotation("min_length", &[n(2.0)], None, &s("abc")),
            AnnotationOutcome::Pass
        );
        assert_eq!(
            check_annotation("min_length", &[n(5.0)], None, &s("abc")),
            AnnotationOutcome::Fail
        );
        assert_eq!(
            check_annotation("max_length", &[n(3.0)], None, &s("abc")),
            AnnotationOutcome::Pass
        );
    }

    #[test]
    fn test_numeric_bounds() {
        assert_eq!(
            check_annotation("min", &[n(1.0)], None, &n(5.0)),
            AnnotationOutcome::Pass
        );
        assert_eq!(
            check_annotation("max", &[n(65535.0)], None, &n(70000.0)),
            AnnotationOutcome::Fail
        );
        assert_eq!(
            check_annotation("range", &[n(1.0), n(10.0)], None, &n(7.0)),
            AnnotationOutcome::Pass
        );
    }

    #[test]
    fn test_integerness() {
        assert_eq!(
            check_annotation("int", &[], None, &n(4.0)),
            AnnotationOutcome::Pass
        );
        assert_eq!(
            check_annotation("int", &[], None, &n(4.5)),
            AnnotationOutcome::Fail
        );
        assert_eq!(
            check_annotation("float", &[], None, &n(4.5)),
            AnnotationOutcome::Pass
        );
    }

    #[test]
    fn test_regex() {
        assert_eq!(
            check_annotation("regex", &[s("^a+$")], None, &s("aaa")),
            AnnotationOutcome::Pass
        );
        assert_eq!(
            check_annotation("regex", &[s("^a+$")], None, &s("bbb")),
            AnnotationOutcome::Fail
        );
    }

    #[test]
    fn test_formats() {
        let cases = [
            ("email", "user@example.com", true),
            ("email", "not an email", false),
            ("uuid", "123e4567-e89b-12d3-a456-426614174000", true),
            ("uuid", "123", false),
            ("ipv4", "192.168.1.1", true),
            ("ipv4", "999.1.1.1", false),
            ("ipv6", "2001:db8:85a3:0:0:8a2e:370:7334", true),
            ("url", "https://example.com/path?q=1", true),
            ("phone", "+1-555-867-5309", true),
        ];
        for (format, value, expect) in cases {
            let outcome = check_annotation("format", &[], Some(format), &s(value));
            assert_eq!(
                outcome == AnnotationOutcome::Pass,
                expect,
                "format {format} value {value}"
            );
        }
    }

    #[test]
    fn test_unknown_format() {
        assert_eq!(
            check_annotation("format", &[], Some("zipcode"), &s("x")),
            AnnotationOutcome::UnknownFormat("zipcode".to_string())
        );
    }

    #[test]
    fn test_deprecated_never_fails() {
        assert_eq!(
            check_annotation("deprecated", &[s("use other")], None, &n(1.0)),
            AnnotationOutcome::Deprecated("use other".to_string())
        );
    }

    #[test]
    fn test_unknown_annotation() {
        assert_eq!(
            check_annotation("sparkles", &[], None, &n(1.0)),
            AnnotationOutcome::UnknownAnnotation
        );
    }
}
