//! Driven port that executes a command and decodes its result set.

use async_trait::async_trait;
use item_collection::ItemCollection;

use crate::domain::{Command, ErrorKind, Record};

use super::{ConnectionError, define_port_error};

define_port_error! {
    /// Errors raised while executing a command or decoding its response.
    pub enum ResultSetError {
        /// The exchange with the server failed.
        Connection {
            /// Underlying connection failure.
            source: ConnectionError,
        } => "{source}",
        /// The response body is not well-formed result-set XML.
        MalformedXml {
            /// Reader diagnostics.
            message: String,
        } =>
            "malformed result-set XML: {message}",
        /// The server reported an error code.
        FileMaker {
            /// Error code from the `<error>` element.
            code: u32,
        } =>
            "server returned error code {code}",
        /// A field definition declares the `unknown` result type.
        UnknownField {
            /// Database named by the data source.
            database: String,
            /// Table named by the data source.
            table: String,
            /// Layout named by the data source.
            layout: String,
            /// Fully-qualified field name.
            field: String,
        } =>
            "field \"{field}\" has an unknown type (database \"{database}\", table \"{table}\", layout \"{layout}\")",
        /// A value or record could not be decoded.
        Parse {
            /// Database named by the data source.
            database: String,
            /// Table named by the data source.
            table: String,
            /// Layout named by the data source.
            layout: String,
            /// What could not be decoded.
            message: String,
        } =>
            "could not decode result set (database \"{database}\", table \"{table}\", layout \"{layout}\"): {message}",
    }
}

impl ResultSetError {
    /// Classification of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Connection { source } => source.kind(),
            Self::MalformedXml { .. } | Self::FileMaker { .. } => ErrorKind::Protocol,
            Self::UnknownField { .. } => ErrorKind::UnknownField,
            Self::Parse { .. } => ErrorKind::Parse,
        }
    }

    /// Error code reported by the server, if this is a server-side error.
    #[must_use]
    pub const fn error_code(&self) -> Option<u32> {
        match self {
            Self::FileMaker { code } => Some(*code),
            _ => None,
        }
    }
}

impl From<ConnectionError> for ResultSetError {
    fn from(source: ConnectionError) -> Self {
        Self::Connection { source }
    }
}

/// Port for executing commands against the result-set grammar.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ResultSetClient: Send + Sync {
    /// Execute `command` and decode the returned records.
    ///
    /// "No records match" responses yield an empty collection, not an error.
    async fn execute(&self, command: &Command) -> Result<ItemCollection<Record>, ResultSetError>;
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(ResultSetError::file_maker(102_u32), ErrorKind::Protocol)]
    #[case(ResultSetError::malformed_xml("eof"), ErrorKind::Protocol)]
    #[case(ResultSetError::unknown_field("db", "t", "l", "f"), ErrorKind::UnknownField)]
    #[case(ResultSetError::parse("db", "t", "l", "bad"), ErrorKind::Parse)]
    #[case(
        ResultSetError::from(ConnectionError::unsuccessful_response(401_u16)),
        ErrorKind::Protocol
    )]
    fn kinds_follow_variants(#[case] error: ResultSetError, #[case] expected: ErrorKind) {
        assert_eq!(error.kind(), expected);
    }

    #[rstest]
    fn parse_errors_carry_data_source_context() {
        let message = ResultSetError::parse("Sales", "Orders", "Order Detail", "bad date")
            .to_string();
        assert!(message.contains("\"Sales\""));
        assert!(message.contains("\"Orders\""));
        assert!(message.contains("\"Order Detail\""));
        assert!(message.ends_with("bad date"));
    }
}
