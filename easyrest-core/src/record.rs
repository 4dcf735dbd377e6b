//! Record types and lenient form-field coercion.
//!
//! A record is a struct that handlers accept or return as a whole. Besides
//! its serde implementations, a record knows how to assign a raw form value
//! to one of its public fields by name; `#[derive(Record)]` generates that.
//!
//! Coercion is best effort: a value that does not parse as the field's type
//! is dropped and the field keeps its current value.

use crate::Values;

/// A struct that can be bound from a request or serialized into a response.
pub trait Record: Send + 'static {
    /// Assign `raw` to the writable field named `field`.
    ///
    /// Returns `false` when the record has no such field. A field that exists
    /// but rejects the value still returns `true`.
    fn assign_field(&mut self, field: &str, raw: &str) -> bool;

    /// Assign every form key that names a field, using its first value.
    fn assign_form(&mut self, form: &Values) {
        for (key, values) in form.iter() {
            if let Some(first) = values.first() {
                self.assign_field(key, first);
            }
        }
    }
}

/// A field type that can be overwritten from a single form value.
pub trait FormValue {
    /// Parse `raw` into `self`. Returns `false`, leaving `self` untouched,
    /// when `raw` does not parse.
    fn assign_form_value(&mut self, raw: &str) -> bool;
}

impl FormValue for String {
    fn assign_form_value(&mut self, raw: &str) -> bool {
        raw.clone_into(self);
        true
    }
}

impl FormValue for bool {
    fn assign_form_value(&mut self, raw: &str) -> bool {
        match parse_bool(raw) {
            Some(value) => {
                *self = value;
                true
            }
            None => false,
        }
    }
}

impl FormValue for f64 {
    fn assign_form_value(&mut self, raw: &str) -> bool {
        match raw.parse::<f64>() {
            Ok(value) => {
                *self = value;
                true
            }
            Err(_) => false,
        }
    }
}

impl FormValue for f32 {
    fn assign_form_value(&mut self, raw: &str) -> bool {
        // Parsed at 64-bit precision, then narrowed.
        match raw.parse::<f64>() {
            Ok(value) => {
                *self = value as f32;
                true
            }
            Err(_) => false,
        }
    }
}

macro_rules! signed_form_value {
    ($($ty:ty),*) => {$(
        impl FormValue for $ty {
            fn assign_form_value(&mut self, raw: &str) -> bool {
                match parse_int(raw).and_then(|value| <$ty>::try_from(value).ok()) {
                    Some(value) => {
                        *self = value;
                        true
                    }
                    None => false,
                }
            }
        }
    )*};
}

macro_rules! unsigned_form_value {
    ($($ty:ty),*) => {$(
        impl FormValue for $ty {
            fn assign_form_value(&mut self, raw: &str) -> bool {
                match parse_uint(raw).and_then(|value| <$ty>::try_from(value).ok()) {
                    Some(value) => {
                        *self = value;
                        true
                    }
                    None => false,
                }
            }
        }
    )*};
}

signed_form_value!(i8, i16, i32, i64, isize);
unsigned_form_value!(u8, u16, u32, u64, usize);

impl<T: FormValue + Default> FormValue for Option<T> {
    fn assign_form_value(&mut self, raw: &str) -> bool {
        let mut value = T::default();
        if value.assign_form_value(raw) {
            *self = Some(value);
            true
        } else {
            false
        }
    }
}

/// Strict boolean parse: `1 t T TRUE true True` and `0 f F FALSE false False`.
pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

/// Parse a signed integer, inferring the base from its prefix.
///
/// Accepts an optional sign, then `0x`/`0X` (hex), `0o`/`0O` or a bare
/// leading `0` (octal), `0b`/`0B` (binary), otherwise decimal. Single `_`
/// separators are allowed between digits.
pub fn parse_int(raw: &str) -> Option<i64> {
    let (negative, unsigned) = match raw.as_bytes().first()? {
        b'-' => (true, &raw[1..]),
        b'+' => (false, &raw[1..]),
        _ => (false, raw),
    };

    let magnitude = parse_uint(unsigned)?;
    if negative {
        if magnitude == i64::MIN.unsigned_abs() {
            Some(i64::MIN)
        } else {
            i64::try_from(magnitude).ok().map(|value| -value)
        }
    } else {
        i64::try_from(magnitude).ok()
    }
}

/// Parse an unsigned integer, inferring the base from its prefix.
///
/// Same prefixes as [`parse_int`]; no sign is accepted.
pub fn parse_uint(raw: &str) -> Option<u64> {
    if raw.starts_with('+') {
        return None;
    }
    let (radix, digits, prefixed) = split_radix(raw);
    if digits.is_empty() && !(radix == 8 && !prefixed) {
        return None;
    }
    if digits.starts_with('+') || digits.starts_with('-') {
        return None;
    }

    let cleaned = strip_separators(digits, prefixed)?;
    if cleaned.is_empty() {
        // A lone "0" lands here after its octal prefix was split off.
        return Some(0);
    }
    u64::from_str_radix(&cleaned, radix).ok()
}

fn split_radix(raw: &str) -> (u32, &str, bool) {
    let bytes = raw.as_bytes();
    if bytes.len() >= 2 && bytes[0] == b'0' {
        match bytes[1] {
            b'x' | b'X' => return (16, &raw[2..], true),
            b'o' | b'O' => return (8, &raw[2..], true),
            b'b' | b'B' => return (2, &raw[2..], true),
            // A bare leading zero is an octal prefix too.
            _ => return (8, &raw[1..], true),
        }
    }
    if raw == "0" {
        return (8, "", false);
    }
    (10, raw, false)
}

/// Remove `_` separators, rejecting leading, trailing or doubled ones.
/// After a base prefix, including a bare leading `0`, a leading separator
/// is allowed.
fn strip_separators(digits: &str, prefixed: bool) -> Option<String> {
    if !digits.contains('_') {
        return Some(digits.to_string());
    }
    if digits.ends_with('_') || digits.contains("__") || (digits.starts_with('_') && !prefixed) {
        return None;
    }
    Some(digits.replace('_', ""))
}
