//! Value transformers keyed by the server's declared field result type.

use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use chrono_tz::Tz;
use thiserror::Error;

use crate::domain::{AssetReference, Value};

const DATE_LAYOUT: &str = "%m/%d/%Y";
const TIME_LAYOUT: &str = "%H:%M:%S";
const TIMESTAMP_LAYOUT: &str = "%m/%d/%Y %H:%M:%S";

/// Errors raised while transforming one raw value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransformError {
    /// The text is not a decimal number.
    #[error("\"{value}\" is not a valid decimal")]
    Decimal {
        /// Offending text.
        value: String,
    },
    /// The text is not a date, time, or timestamp in the expected layout.
    #[error("\"{value}\" is not a valid date/time: {message}")]
    DateTime {
        /// Offending text.
        value: String,
        /// Parser diagnostics.
        message: String,
    },
}

/// Decoder for one field result type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transformer {
    /// `text`: the raw string.
    Text,
    /// `number`: exact decimal.
    Number,
    /// `date`: `MM/DD/YYYY`.
    Date,
    /// `time`: `HH:MM:SS`.
    Time,
    /// `timestamp`: `MM/DD/YYYY HH:MM:SS` in the server's zone.
    Timestamp(Tz),
    /// `container`: asset reference.
    Container,
}

impl Transformer {
    /// Look up the transformer for a declared result type.
    ///
    /// Returns `None` for types outside the registry, including `unknown`.
    #[must_use]
    pub fn for_result_type(result: &str, server_time_zone: Tz) -> Option<Self> {
        match result {
            "text" => Some(Self::Text),
            "number" => Some(Self::Number),
            "date" => Some(Self::Date),
            "time" => Some(Self::Time),
            "timestamp" => Some(Self::Timestamp(server_time_zone)),
            "container" => Some(Self::Container),
            _ => None,
        }
    }

    /// Decode raw text. Empty text is [`Value::Null`] except for text fields.
    ///
    /// # Errors
    ///
    /// Returns [`TransformError`] for malformed numbers and dates.
    ///
    /// # Examples
    /// ```
    /// use fmclient::domain::Value;
    /// use fmclient::outbound::result_set::Transformer;
    ///
    /// assert_eq!(Transformer::Text.transform("")?, Value::from(""));
    /// assert_eq!(Transformer::Number.transform("")?, Value::Null);
    /// let number = Transformer::Number.transform(".5")?;
    /// assert_eq!(number.as_number().map(ToString::to_string).as_deref(), Some("0.5"));
    /// # Ok::<(), fmclient::outbound::result_set::TransformError>(())
    /// ```
    pub fn transform(self, raw: &str) -> Result<Value, TransformError> {
        if raw.is_empty() {
            return Ok(match self {
                Self::Text => Value::Text(String::new()),
                _ => Value::Null,
            });
        }

        match self {
            Self::Text => Ok(Value::Text(raw.to_owned())),
            Self::Number => parse_number(raw).map(Value::Number),
            Self::Date => NaiveDate::parse_from_str(raw, DATE_LAYOUT)
                .map(Value::Date)
                .map_err(|error| date_time_error(raw, &error)),
            Self::Time => NaiveTime::parse_from_str(raw, TIME_LAYOUT)
                .map(Value::Time)
                .map_err(|error| date_time_error(raw, &error)),
            Self::Timestamp(zone) => parse_timestamp(raw, zone).map(Value::Timestamp),
            Self::Container => Ok(Value::Container(AssetReference::new(raw))),
        }
    }
}

fn parse_number(raw: &str) -> Result<BigDecimal, TransformError> {
    let normalised = if raw.starts_with('.') {
        format!("0{raw}")
    } else {
        raw.to_owned()
    };
    BigDecimal::from_str(&normalised).map_err(|_| TransformError::Decimal {
        value: raw.to_owned(),
    })
}

fn parse_timestamp(raw: &str, zone: Tz) -> Result<chrono::DateTime<Tz>, TransformError> {
    let naive = NaiveDateTime::parse_from_str(raw, TIMESTAMP_LAYOUT)
        .map_err(|error| date_time_error(raw, &error))?;
    zone.from_local_datetime(&naive)
        .earliest()
        .ok_or_else(|| TransformError::DateTime {
            value: raw.to_owned(),
            message: format!("local time does not exist in {zone}"),
        })
}

fn date_time_error(raw: &str, error: &chrono::ParseError) -> TransformError {
    TransformError::DateTime {
        value: raw.to_owned(),
        message: error.to_string(),
    }
}
