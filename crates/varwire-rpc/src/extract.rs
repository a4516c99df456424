//! Typed extraction from wire values.
//!
//! Servants and typed proxies use [`FromValue`] to turn a decoded
//! [`Value`] into a concrete Rust type. A shape mismatch is a
//! `TypeError` in the remote taxonomy, so it reports back to the caller
//! like any other remote failure.

use varwire_codec::Value;

use crate::exceptions::RemoteError;

pub trait FromValue: Sized {
    fn from_value(value: Value) -> Result<Self, RemoteError>;
}

fn mismatch(expected: &str, found: &Value) -> RemoteError {
    RemoteError::TypeError {
        message: format!("expected {}, got {}", expected, found.variant_name()),
    }
}

impl FromValue for Value {
    fn from_value(value: Value) -> Result<Self, RemoteError> {
        Ok(value)
    }
}

impl FromValue for () {
    fn from_value(value: Value) -> Result<Self, RemoteError> {
        match value {
            Value::Null => Ok(()),
            other => Err(mismatch("null", &other)),
        }
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> Result<Self, RemoteError> {
        match value {
            Value::Bool(v) => Ok(v),
            other => Err(mismatch("bool", &other)),
        }
    }
}

impl FromValue for i32 {
    fn from_value(value: Value) -> Result<Self, RemoteError> {
        match value {
            Value::Byte(v) => Ok(v as i32),
            Value::Int32(v) => Ok(v),
            Value::Int64(v) => i32::try_from(v).map_err(|_| RemoteError::TypeError {
                message: format!("integer {} does not fit in 32 bits", v),
            }),
            other => Err(mismatch("integer", &other)),
        }
    }
}

impl FromValue for i64 {
    fn from_value(value: Value) -> Result<Self, RemoteError> {
        match value {
            Value::Byte(v) => Ok(v as i64),
            Value::Int32(v) => Ok(v as i64),
            Value::Int64(v) => Ok(v),
            Value::Time(v) => Ok(v),
            other => Err(mismatch("integer", &other)),
        }
    }
}

impl FromValue for f64 {
    fn from_value(value: Value) -> Result<Self, RemoteError> {
        match value {
            Value::Double(v) => Ok(v),
            Value::Byte(v) => Ok(v as f64),
            Value::Int32(v) => Ok(v as f64),
            Value::Int64(v) => Ok(v as f64),
            other => Err(mismatch("double", &other)),
        }
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> Result<Self, RemoteError> {
        match value {
            Value::String(bytes) => String::from_utf8(bytes).map_err(|e| RemoteError::TypeError {
                message: format!("string is not valid utf-8: {}", e),
            }),
            other => Err(mismatch("string", &other)),
        }
    }
}

impl FromValue for Vec<u8> {
    fn from_value(value: Value) -> Result<Self, RemoteError> {
        match value {
            Value::String(bytes) => Ok(bytes),
            other => Err(mismatch("string", &other)),
        }
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(value: Value) -> Result<Self, RemoteError> {
        match value {
            Value::Sequence(items) => items.into_iter().map(T::from_value).collect(),
            other => Err(mismatch("sequence", &other)),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> Result<Self, RemoteError> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_widening_and_narrowing() {
        assert_eq!(i32::from_value(Value::Byte(7)), Ok(7));
        assert_eq!(i64::from_value(Value::Int32(-3)), Ok(-3));
        assert_eq!(i32::from_value(Value::Int64(1_000)), Ok(1_000));
        assert!(matches!(
            i32::from_value(Value::Int64(1 << 40)),
            Err(RemoteError::TypeError { .. })
        ));
    }

    #[test]
    fn test_sequence_extraction() {
        let v = Value::Sequence(vec![Value::Int32(1), Value::Int32(2)]);
        assert_eq!(Vec::<i32>::from_value(v), Ok(vec![1, 2]));
        let mixed = Value::Sequence(vec![Value::Int32(1), Value::from("x")]);
        assert!(Vec::<i32>::from_value(mixed).is_err());
    }

    #[test]
    fn test_option_treats_null_as_none() {
        assert_eq!(Option::<i32>::from_value(Value::Null), Ok(None));
        assert_eq!(Option::<i32>::from_value(Value::Int32(4)), Ok(Some(4)));
    }

    #[test]
    fn test_string_requires_utf8() {
        assert_eq!(
            String::from_value(Value::from("héllo")),
            Ok("héllo".to_string())
        );
        assert!(String::from_value(Value::String(vec![0xff, 0xfe])).is_err());
        assert_eq!(
            Vec::<u8>::from_value(Value::String(vec![0xff, 0xfe])),
            Ok(vec![0xff, 0xfe])
        );
    }

    #[test]
    fn test_mismatch_is_a_type_error() {
        let err = bool::from_value(Value::Int32(1)).unwrap_err();
        assert_eq!(
            err,
            RemoteError::TypeError {
                message: "expected bool, got int32".to_string()
            }
        );
    }
}
