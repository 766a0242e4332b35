//! Shared helpers for fmclient integration tests.
//!
//! The scripted connection stands in for the HTTP adapter so the real
//! decoder, client, and repository run end to end without a server.

use std::collections::VecDeque;
use std::fmt::Write as _;
use std::sync::Mutex;

use async_trait::async_trait;
use fmclient::domain::ports::{AssetStream, Connection, ConnectionError};
use fmclient::domain::{AssetReference, Command};
use fmclient::outbound::result_set::GRAMMAR_PATH;

/// Connection that answers from a queue and records every command it sees.
pub struct ScriptedConnection {
    responses: Mutex<VecDeque<Result<String, ConnectionError>>>,
    sent: Mutex<Vec<String>>,
}

impl ScriptedConnection {
    pub fn new(responses: impl IntoIterator<Item = Result<String, ConnectionError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().collect()),
            sent: Mutex::new(Vec::new()),
        }
    }

    /// Encoded commands in the order they were sent.
    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().expect("sent lock").clone()
    }
}

#[async_trait]
impl Connection for ScriptedConnection {
    async fn execute(
        &self,
        command: &Command,
        grammar_path: &str,
    ) -> Result<String, ConnectionError> {
        assert_eq!(grammar_path, GRAMMAR_PATH);
        self.sent.lock().expect("sent lock").push(command.encode());
        self.responses
            .lock()
            .expect("responses lock")
            .pop_front()
            .unwrap_or_else(|| Err(ConnectionError::transport("script exhausted")))
    }

    async fn get_asset(&self, _asset: &AssetReference) -> Result<AssetStream, ConnectionError> {
        Err(ConnectionError::unsuccessful_response(404_u16))
    }
}

/// Successful document listing `(record-id, mod-id, name)` rows of `people`.
pub fn people_document(rows: &[(u64, u64, &str)]) -> String {
    let mut records = String::new();
    for (record_id, mod_id, name) in rows {
        write!(
            records,
            r#"<record record-id="{record_id}" mod-id="{mod_id}"><field name="name"><data>{name}</data></field></record>"#
        )
        .expect("write to string");
    }
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<fmresultset xmlns="http://www.filemaker.com/xml/fmresultset" version="1.0">
  <error code="0"/>
  <datasource database="Contacts" layout="people" table="People"/>
  <metadata>
    <field-definition max-repeat="1" name="name" result="text" type="normal"/>
  </metadata>
  <resultset count="{count}" fetch-size="{count}">{records}</resultset>
</fmresultset>"#,
        count = rows.len()
    )
}

/// Document carrying only an error code.
pub fn error_document(code: u32) -> String {
    format!(
        r#"<fmresultset xmlns="http://www.filemaker.com/xml/fmresultset" version="1.0"><error code="{code}"/></fmresultset>"#
    )
}
