use crate::CfError;

/// Floating point type used throughout system
pub type Real = f64;

/// Upper bound of every percentage-valued quantity (edge weights, efficiencies).
pub const PERCENT_MAX: Real = 100.0;

pub fn ensure_finite(v: Real, what: &'static str) -> Result<Real, CfError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(CfError::NonFinite { what, value: v })
    }
}

/// Clamp into [0, 100]. Non-finite input collapses to 0.
pub fn clamp_percent(v: Real) -> Real {
    if v.is_finite() {
        v.clamp(0.0, PERCENT_MAX)
    } else {
        0.0
    }
}

/// Clamp into [0, 1]. Non-finite input collapses to 0.
pub fn clamp_fraction(v: Real) -> Real {
    if v.is_finite() { v.clamp(0.0, 1.0) } else { 0.0 }
}

/// Clamp to >= 0. Non-finite input collapses to 0.
pub fn clamp_non_negative(v: Real) -> Real {
    if v.is_finite() { v.max(0.0) } else { 0.0 }
}

/// Coerce operator text into a number.
///
/// Blank input reads as 0, matching a cleared numeric field.
pub fn coerce_number(raw: &str, what: &'static str) -> Result<Real, CfError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(0.0);
    }
    let value: Real = trimmed.parse().map_err(|_| CfError::NotANumber {
        what,
        raw: raw.to_string(),
    })?;
    ensure_finite(value, what)
}
