//! Conversions between decoded values and application property types.
//!
//! Mapping layers use these when hydrating entities from a [`Record`] and
//! when extracting command parameters back out of them.
//!
//! [`Record`]: super::Record

use bigdecimal::{BigDecimal, Zero};
use chrono::DateTime;
use chrono_tz::Tz;

use super::command::ParameterValue;
use super::ports::MappingError;
use super::value::Value;

/// Two-way conversion for one property type.
pub trait FieldType {
    /// Application-side type.
    type Output;

    /// Convert a decoded value.
    ///
    /// # Errors
    ///
    /// Returns [`MappingError::Conversion`] when the value has the wrong kind.
    fn from_filemaker_value(&self, value: &Value) -> Result<Self::Output, MappingError>;

    /// Convert back into a command parameter.
    fn to_filemaker_value(&self, value: &Self::Output) -> ParameterValue;
}

fn mismatch(expected: &str, value: &Value) -> MappingError {
    MappingError::conversion(expected, value.kind_name())
}

/// `bool` stored as a number or text flag.
///
/// Null reads as `false`, numbers read as `true` unless zero, and text reads
/// as `true` unless empty or `"0"`. Writes decimal `1` / `0`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BooleanType;

impl FieldType for BooleanType {
    type Output = bool;

    fn from_filemaker_value(&self, value: &Value) -> Result<bool, MappingError> {
        Ok(match value {
            Value::Null => false,
            Value::Number(number) => !number.is_zero(),
            Value::Text(text) => !(text.is_empty() || text == "0"),
            _ => true,
        })
    }

    fn to_filemaker_value(&self, value: &bool) -> ParameterValue {
        ParameterValue::Decimal(BigDecimal::from(u8::from(*value)))
    }
}

/// Optional exact decimal.
#[derive(Debug, Clone, Copy, Default)]
pub struct DecimalType;

impl FieldType for DecimalType {
    type Output = Option<BigDecimal>;

    fn from_filemaker_value(&self, value: &Value) -> Result<Self::Output, MappingError> {
        match value {
            Value::Null => Ok(None),
            Value::Number(number) => Ok(Some(number.clone())),
            other => Err(mismatch("number", other)),
        }
    }

    fn to_filemaker_value(&self, value: &Self::Output) -> ParameterValue {
        value.clone().into()
    }
}

/// Optional timestamp in the server's time zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct DateTimeType;

impl FieldType for DateTimeType {
    type Output = Option<DateTime<Tz>>;

    fn from_filemaker_value(&self, value: &Value) -> Result<Self::Output, MappingError> {
        match value {
            Value::Null => Ok(None),
            Value::Timestamp(timestamp) => Ok(Some(*timestamp)),
            other => Err(mismatch("timestamp", other)),
        }
    }

    fn to_filemaker_value(&self, value: &Self::Output) -> ParameterValue {
        (*value).into()
    }
}

/// Text where null reads as the empty string.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringType;

impl FieldType for StringType {
    type Output = String;

    fn from_filemaker_value(&self, value: &Value) -> Result<String, MappingError> {
        match value {
            Value::Null => Ok(String::new()),
            Value::Text(text) => Ok(text.clone()),
            other => Err(mismatch("text", other)),
        }
    }

    fn to_filemaker_value(&self, value: &String) -> ParameterValue {
        ParameterValue::Text(value.clone())
    }
}

/// Text where null stays absent.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullableStringType;

impl FieldType for NullableStringType {
    type Output = Option<String>;

    fn from_filemaker_value(&self, value: &Value) -> Result<Self::Output, MappingError> {
        match value {
            Value::Null => Ok(None),
            Value::Text(text) => Ok(Some(text.clone())),
            other => Err(mismatch("text", other)),
        }
    }

    fn to_filemaker_value(&self, value: &Self::Output) -> ParameterValue {
        value.clone().into()
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use chrono::NaiveDate;
    use rstest::rstest;
    use std::str::FromStr;

    fn decimal(text: &str) -> BigDecimal {
        BigDecimal::from_str(text).expect("valid decimal literal")
    }

    #[rstest]
    #[case(Value::Null, false)]
    #[case(Value::Number(decimal("0")), false)]
    #[case(Value::Number(decimal("0.00")), false)]
    #[case(Value::Number(decimal("-2")), true)]
    #[case(Value::from(""), false)]
    #[case(Value::from("0"), false)]
    #[case(Value::from("no"), true)]
    #[case(Value::Date(NaiveDate::MIN), true)]
    fn boolean_reads_flags(#[case] value: Value, #[case] expected: bool) {
        assert_eq!(BooleanType.from_filemaker_value(&value), Ok(expected));
    }

    #[rstest]
    fn boolean_writes_decimal_flags() {
        assert_eq!(
            BooleanType.to_filemaker_value(&true),
            ParameterValue::Decimal(BigDecimal::from(1_u8))
        );
        assert_eq!(
            BooleanType.to_filemaker_value(&false),
            ParameterValue::Decimal(BigDecimal::from(0_u8))
        );
    }

    #[rstest]
    fn decimal_rejects_text() {
        let error = DecimalType
            .from_filemaker_value(&Value::from("12"))
            .expect_err("text is not a number");
        assert_eq!(error, MappingError::conversion("number", "text"));
    }

    #[rstest]
    fn strings_differ_on_null() {
        assert_eq!(StringType.from_filemaker_value(&Value::Null), Ok(String::new()));
        assert_eq!(NullableStringType.from_filemaker_value(&Value::Null), Ok(None));
        assert_eq!(
            NullableStringType.to_filemaker_value(&None),
            ParameterValue::Null
        );
    }

    #[rstest]
    fn date_time_passes_timestamps_through() {
        let timestamp = NaiveDate::from_ymd_opt(2016, 1, 1)
            .and_then(|date| date.and_hms_opt(12, 0, 0))
            .map(|naive| naive.and_utc().with_timezone(&Tz::Europe__Berlin))
            .expect("valid timestamp");

        assert_eq!(
            DateTimeType.from_filemaker_value(&Value::Timestamp(timestamp)),
            Ok(Some(timestamp))
        );
        assert!(DateTimeType.from_filemaker_value(&Value::from("x")).is_err());
    }
}
