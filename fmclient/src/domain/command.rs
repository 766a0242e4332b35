//! Command encoding for the form-encoded request grammar.
//!
//! A [`Command`] targets one layout and carries an ordered parameter map plus
//! an optional trailing action flag. Rendering produces the request body
//! fragment that follows `-db=<database>&`:
//!
//! ```text
//! -lay=<layout>&<key>=<value>&<bare-key>&...&<action>
//! ```

use std::fmt;

use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use thiserror::Error;
use url::form_urlencoded::byte_serialize;

use super::error::ErrorKind;
use super::identity::Identity;
use super::value::Value;

const RESERVED_PARAMETERS: [&str; 2] = ["-db", "-lay"];
const DATE_LAYOUT: &str = "%m/%d/%Y";
const TIME_LAYOUT: &str = "%H:%M:%S";
const TIMESTAMP_LAYOUT: &str = "%m/%d/%Y %H:%M:%S";

/// Errors raised while building a command.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    /// The parameter name is injected by the encoder itself.
    #[error("parameter \"{name}\" is not allowed")]
    DisallowedParameter {
        /// Offending parameter name.
        name: String,
    },
    /// The value cannot be serialised.
    #[error("value of parameter \"{name}\" is invalid: {message}")]
    InvalidValue {
        /// Parameter name.
        name: String,
        /// Why the value was rejected.
        message: String,
    },
    /// The value kind cannot be sent to the server.
    #[error(
        "value of parameter \"{name}\" must either be scalar, null, decimal or date-time, \
         found {kind}"
    )]
    UnsupportedValue {
        /// Parameter name.
        name: String,
        /// Kind of the rejected value.
        kind: String,
    },
}

impl CommandError {
    /// Command errors are always caller programming errors.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        ErrorKind::Validation
    }
}

/// A value accepted as a command parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterValue {
    /// Serialised as a bare key.
    Null,
    /// Serialised as `1` or `0`.
    Bool(bool),
    /// Integer.
    Integer(i64),
    /// Finite floating-point number.
    Float(f64),
    /// Text; the empty string is serialised as a bare key.
    Text(String),
    /// Exact decimal, serialised without rounding.
    Decimal(BigDecimal),
    /// Calendar date as `MM/DD/YYYY`.
    Date(NaiveDate),
    /// Time of day as `HH:MM:SS`.
    Time(NaiveTime),
    /// Point in time as `MM/DD/YYYY HH:MM:SS`, normalised to UTC.
    Timestamp(DateTime<Utc>),
}

impl ParameterValue {
    /// Convert a decoded record value into a parameter.
    ///
    /// # Errors
    ///
    /// Container references cannot be written back and fail with
    /// [`CommandError::UnsupportedValue`].
    pub fn try_from_value(name: &str, value: Value) -> Result<Self, CommandError> {
        match value {
            Value::Null => Ok(Self::Null),
            Value::Text(text) => Ok(Self::Text(text)),
            Value::Number(number) => Ok(Self::Decimal(number)),
            Value::Date(date) => Ok(Self::Date(date)),
            Value::Time(time) => Ok(Self::Time(time)),
            Value::Timestamp(timestamp) => Ok(Self::from(timestamp)),
            Value::Container(_) => Err(CommandError::UnsupportedValue {
                name: name.to_owned(),
                kind: "container".to_owned(),
            }),
        }
    }

    fn validate(&self, name: &str) -> Result<(), CommandError> {
        match self {
            Self::Float(value) if !value.is_finite() => Err(CommandError::InvalidValue {
                name: name.to_owned(),
                message: format!("{value} is not a finite number"),
            }),
            _ => Ok(()),
        }
    }

    /// Textual form before URL encoding; `None` means "bare key".
    fn to_wire(&self) -> Option<String> {
        match self {
            Self::Null => None,
            Self::Text(text) if text.is_empty() => None,
            Self::Text(text) => Some(text.clone()),
            Self::Bool(value) => Some(if *value { "1" } else { "0" }.to_owned()),
            Self::Integer(value) => Some(value.to_string()),
            Self::Float(value) => Some(value.to_string()),
            Self::Decimal(value) => Some(value.to_string()),
            Self::Date(value) => Some(value.format(DATE_LAYOUT).to_string()),
            Self::Time(value) => Some(value.format(TIME_LAYOUT).to_string()),
            Self::Timestamp(value) => Some(value.format(TIMESTAMP_LAYOUT).to_string()),
        }
    }
}

impl From<bool> for ParameterValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for ParameterValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<u64> for ParameterValue {
    fn from(value: u64) -> Self {
        i64::try_from(value).map_or_else(|_| Self::Decimal(BigDecimal::from(value)), Self::Integer)
    }
}

impl From<f64> for ParameterValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for ParameterValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for ParameterValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<BigDecimal> for ParameterValue {
    fn from(value: BigDecimal) -> Self {
        Self::Decimal(value)
    }
}

impl From<NaiveDate> for ParameterValue {
    fn from(value: NaiveDate) -> Self {
        Self::Date(value)
    }
}

impl From<NaiveTime> for ParameterValue {
    fn from(value: NaiveTime) -> Self {
        Self::Time(value)
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for ParameterValue {
    fn from(value: DateTime<Tz>) -> Self {
        Self::Timestamp(value.with_timezone(&Utc))
    }
}

impl<T: Into<Self>> From<Option<T>> for ParameterValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// Ordered parameter map.
///
/// Inserting an existing key replaces its value without moving it.
///
/// # Examples
/// ```
/// use fmclient::domain::{ParameterValue, Parameters};
///
/// let mut parameters = Parameters::new();
/// parameters.insert("b", 1_i64);
/// parameters.insert("a", "x");
/// parameters.insert("b", 2_i64);
/// let keys: Vec<_> = parameters.iter().map(|(key, _)| key).collect();
/// assert_eq!(keys, ["b", "a"]);
/// assert_eq!(parameters.get("b"), Some(&ParameterValue::Integer(2)));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Parameters {
    entries: Vec<(String, ParameterValue)>,
}

impl Parameters {
    /// Empty parameter map.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Insert or replace a parameter.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<ParameterValue>) {
        let key = name.into();
        let parameter = value.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == key) {
            Some(entry) => entry.1 = parameter,
            None => self.entries.push((key, parameter)),
        }
    }

    /// Insert a bare key.
    pub fn insert_flag(&mut self, name: impl Into<String>) {
        self.insert(name, ParameterValue::Null);
    }

    /// Append every entry of `other`, replacing values of shared keys.
    pub fn extend(&mut self, other: Self) {
        for (name, value) in other.entries {
            self.insert(name, value);
        }
    }

    /// Value of a parameter.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ParameterValue> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    /// Whether a parameter is present.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Iterate in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParameterValue)> {
        self.entries
            .iter()
            .map(|(key, value)| (key.as_str(), value))
    }

    /// Number of parameters.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map is empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for Parameters
where
    K: Into<String>,
    V: Into<ParameterValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut parameters = Self::new();
        for (name, value) in iter {
            parameters.insert(name, value);
        }
        parameters
    }
}

/// Action flag appended as the trailing bare key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// `-find`: search by field criteria.
    Find,
    /// `-findall`: every record of the layout.
    FindAll,
    /// `-findany`: one random record.
    FindAny,
    /// `-findquery`: compound query.
    FindQuery,
    /// `-new`: create a record.
    New,
    /// `-edit`: modify a record.
    Edit,
    /// `-delete`: remove a record.
    Delete,
}

impl Action {
    /// Wire name of the flag.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Find => "-find",
            Self::FindAll => "-findall",
            Self::FindAny => "-findany",
            Self::FindQuery => "-findquery",
            Self::New => "-new",
            Self::Edit => "-edit",
            Self::Delete => "-delete",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validated request against one layout.
///
/// Commands are immutable; [`Command::with_identity`] and
/// [`Command::with_action`] return new values.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    layout: String,
    parameters: Parameters,
    action: Option<Action>,
    identity: Option<Identity>,
}

impl Command {
    /// Build a command, validating every parameter.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::DisallowedParameter`] for `-db` or `-lay`, and
    /// [`CommandError::InvalidValue`] for values that cannot be serialised.
    ///
    /// # Examples
    /// ```
    /// use fmclient::domain::{Command, Parameters};
    ///
    /// let parameters: Parameters = [("foo", true)].into_iter().collect();
    /// let command = Command::new("foo", parameters)?;
    /// assert_eq!(command.to_string(), "-lay=foo&foo=1");
    /// # Ok::<(), fmclient::domain::CommandError>(())
    /// ```
    pub fn new(layout: impl Into<String>, parameters: Parameters) -> Result<Self, CommandError> {
        for (name, value) in parameters.iter() {
            if RESERVED_PARAMETERS.contains(&name) {
                return Err(CommandError::DisallowedParameter {
                    name: name.to_owned(),
                });
            }
            value.validate(name)?;
        }

        Ok(Self {
            layout: layout.into(),
            parameters,
            action: None,
            identity: None,
        })
    }

    /// Copy of this command with a trailing action flag.
    #[must_use]
    pub fn with_action(&self, action: Action) -> Self {
        let mut command = self.clone();
        command.action = Some(action);
        command
    }

    /// Copy of this command executed as `identity`.
    #[must_use]
    pub fn with_identity(&self, identity: Identity) -> Self {
        let mut command = self.clone();
        command.identity = Some(identity);
        command
    }

    /// Target layout.
    #[must_use]
    pub const fn layout(&self) -> &str {
        self.layout.as_str()
    }

    /// Parameters in insertion order.
    #[must_use]
    pub const fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    /// Trailing action flag, if any.
    #[must_use]
    pub const fn action(&self) -> Option<Action> {
        self.action
    }

    /// Identity the command is executed as, if any.
    #[must_use]
    pub const fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    /// Render the request body fragment.
    #[must_use]
    pub fn encode(&self) -> String {
        let mut pairs = Vec::with_capacity(self.parameters.len() + 2);
        pairs.push(format!("-lay={}", form_encode(&self.layout)));

        for (name, value) in self.parameters.iter() {
            pairs.push(match value.to_wire() {
                Some(text) => format!("{}={}", form_encode(name), form_encode(&text)),
                None => form_encode(name),
            });
        }

        if let Some(action) = self.action {
            pairs.push(action.as_str().to_owned());
        }

        pairs.join("&")
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

/// Validate and render a request body fragment in one step.
///
/// # Errors
///
/// Propagates the validation errors of [`Command::new`].
pub fn encode(
    layout: &str,
    parameters: Parameters,
    action: Option<Action>,
) -> Result<String, CommandError> {
    let command = Command::new(layout, parameters)?;
    Ok(match action {
        Some(verb) => command.with_action(verb).encode(),
        None => command.encode(),
    })
}

/// Escape search-pattern operators so `value` matches literally.
///
/// Every occurrence of `\ = ! < ≤ > ≥ … ? @ # * " ~` and of a double slash
/// `//` gains one leading backslash.
///
/// # Examples
/// ```
/// use fmclient::domain::quote_string;
///
/// assert_eq!(quote_string("a*b"), "a\\*b");
/// assert_eq!(quote_string("1//2"), "1\\//2");
/// assert_eq!(quote_string("plain"), "plain");
/// ```
#[must_use]
pub fn quote_string(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len());
    let mut chars = value.chars().peekable();

    while let Some(current) = chars.next() {
        match current {
            '/' if chars.peek() == Some(&'/') => {
                chars.next();
                quoted.push_str("\\//");
            }
            '\\' | '=' | '!' | '<' | '≤' | '>' | '≥' | '…' | '?' | '@' | '#' | '*' | '"'
            | '~' => {
                quoted.push('\\');
                quoted.push(current);
            }
            _ => quoted.push(current),
        }
    }

    quoted
}

fn form_encode(value: &str) -> String {
    byte_serialize(value.as_bytes()).collect()
}
