//! Custom GraphQL scalars

use async_graphql::{InputValueResult, Number, Scalar, ScalarType, Value};
use chrono::{DateTime, Utc};

/// A point in time, exchanged on the wire as integer epoch milliseconds.
///
/// Input is lenient: anything other than an integral number (a string, a
/// fractional float, a boolean, an out-of-range integer) parses to an
/// *invalid* date instead of failing the request. Invalid dates behave as
/// null. Integral floats such as `1.0` are accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Date(Option<DateTime<Utc>>);

impl Date {
    /// Date from epoch milliseconds; invalid when out of range
    pub fn from_millis(millis: i64) -> Self {
        Self(DateTime::from_timestamp_millis(millis))
    }

    /// A date that carries no instant
    pub fn invalid() -> Self {
        Self(None)
    }

    pub fn is_valid(&self) -> bool {
        self.0.is_some()
    }

    pub fn instant(&self) -> Option<DateTime<Utc>> {
        self.0
    }

    pub fn timestamp_millis(&self) -> Option<i64> {
        self.0.map(|dt| dt.timestamp_millis())
    }

    /// Decode a wire value. Only integral numbers yield a valid date.
    pub fn from_wire(value: &Value) -> Self {
        match value {
            Value::Number(n) => integral_millis(n)
                .map(Self::from_millis)
                .unwrap_or_else(Self::invalid),
            _ => Self::invalid(),
        }
    }

    /// Encode for the wire; invalid dates encode as null
    pub fn to_wire(&self) -> Value {
        match self.timestamp_millis() {
            Some(ms) => Value::Number(Number::from(ms)),
            None => Value::Null,
        }
    }
}

/// `1600000000000` and `1600000000000.0` both count; `1.5` does not
fn integral_millis(n: &Number) -> Option<i64> {
    if let Some(ms) = n.as_i64() {
        return Some(ms);
    }
    let f = n.as_f64()?;
    // i64::MAX as f64 rounds up to 2^63, so the upper bound is exclusive
    if f.is_finite() && f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

impl From<DateTime<Utc>> for Date {
    fn from(dt: DateTime<Utc>) -> Self {
        Self(Some(dt))
    }
}

/// A normal date
#[Scalar(name = "Date")]
impl ScalarType for Date {
    fn parse(value: Value) -> InputValueResult<Self> {
        let date = Date::from_wire(&value);
        if !date.is_valid() {
            tracing::debug!(value = %value, "Coercing malformed Date input to null");
        }
        Ok(date)
    }

    fn to_value(&self) -> Value {
        self.to_wire()
    }
}
