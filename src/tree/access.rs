//! Typed conversion of attribute values and element text.

use crate::error::ValueError;

/// Conversion from a stored string value into a typed value.
///
/// Implemented for the integer widths, `f32`, `f64`, and `bool`.
///
/// Integer targets accept integral literals and decimal literals, which are
/// truncated toward zero (`"3.9"` reads as `3`). Surrounding whitespace is
/// ignored. `bool` is `true` only for `"true"` in any case and never fails.
pub trait FromValue: Sized {
    /// Converts `value`, where `None` means no value is stored.
    ///
    /// # Errors
    ///
    /// Returns [`ValueError`] if the value is missing or cannot be converted.
    fn from_value(value: Option<&str>) -> Result<Self, ValueError>;
}

fn malformed(value: &str, target: &'static str) -> ValueError {
    ValueError::Malformed {
        value: value.to_string(),
        target,
    }
}

macro_rules! impl_from_value_int {
    ($($ty:ty),*) => {$(
        impl FromValue for $ty {
            #[allow(clippy::cast_possible_truncation)]
            fn from_value(value: Option<&str>) -> Result<Self, ValueError> {
                let raw = value.ok_or(ValueError::Missing)?;
                let trimmed = raw.trim();
                if let Ok(parsed) = trimmed.parse::<$ty>() {
                    return Ok(parsed);
                }
                let float: f64 = trimmed
                    .parse()
                    .map_err(|_| malformed(raw, stringify!($ty)))?;
                if !float.is_finite() {
                    return Err(malformed(raw, stringify!($ty)));
                }
                // Saturates outside the i128 range, which no target fits.
                let truncated = float.trunc() as i128;
                <$ty>::try_from(truncated).map_err(|_| ValueError::OutOfRange {
                    value: raw.to_string(),
                    target: stringify!($ty),
                })
            }
        }
    )*};
}

impl_from_value_int!(i8, i16, i32, i64, u8, u16, u32, u64);

macro_rules! impl_from_value_float {
    ($($ty:ty),*) => {$(
        impl FromValue for $ty {
            fn from_value(value: Option<&str>) -> Result<Self, ValueError> {
                let raw = value.ok_or(ValueError::Missing)?;
                raw.trim()
                    .parse::<$ty>()
                    .map_err(|_| malformed(raw, stringify!($ty)))
            }
        }
    )*};
}

impl_from_value_float!(f32, f64);

impl FromValue for bool {
    fn from_value(value: Option<&str>) -> Result<Self, ValueError> {
        Ok(value.is_some_and(|v| v.trim().eq_ignore_ascii_case("true")))
    }
}
