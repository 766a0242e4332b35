//! [`ResultSetClient`] adapter speaking the `fmresultset.xml` grammar.

use std::sync::Arc;

use async_trait::async_trait;
use chrono_tz::Tz;
use item_collection::ItemCollection;

use super::decoder::ResultSetDecoder;
use crate::domain::Command;
use crate::domain::Record;
use crate::domain::ports::{Connection, ResultSetClient, ResultSetError};

/// Path of the result-set grammar endpoint.
pub const GRAMMAR_PATH: &str = "/fmi/xml/fmresultset.xml";

/// Sends commands over a [`Connection`] and decodes the XML response.
pub struct XmlResultSetClient<C: ?Sized> {
    connection: Arc<C>,
    decoder: ResultSetDecoder,
}

impl<C: ?Sized> XmlResultSetClient<C> {
    /// Client interpreting timestamps in `server_time_zone`.
    #[must_use]
    pub const fn new(connection: Arc<C>, server_time_zone: Tz) -> Self {
        Self {
            connection,
            decoder: ResultSetDecoder::new(server_time_zone),
        }
    }

    /// Underlying connection, e.g. for fetching container assets.
    #[must_use]
    pub const fn connection(&self) -> &Arc<C> {
        &self.connection
    }
}

#[async_trait]
impl<C> ResultSetClient for XmlResultSetClient<C>
where
    C: Connection + ?Sized,
{
    async fn execute(&self, command: &Command) -> Result<ItemCollection<Record>, ResultSetError> {
        let body = self.connection.execute(command, GRAMMAR_PATH).await?;
        self.decoder.decode(&body)
    }
}
