//! End-to-end authentication through the result-set client.

mod support;

use std::sync::Arc;

use chrono_tz::Tz;
use fmclient::domain::ports::{ConnectionError, FixtureIdentityHandler, IdentityHandler};
use fmclient::domain::{AuthenticationError, AuthenticationResult, Authenticator, ErrorKind};
use fmclient::outbound::result_set::XmlResultSetClient;
use support::{ScriptedConnection, error_document, people_document};

fn authenticator(
    response: Result<String, ConnectionError>,
) -> (
    Authenticator<XmlResultSetClient<ScriptedConnection>>,
    Arc<ScriptedConnection>,
) {
    let connection = Arc::new(ScriptedConnection::new([response]));
    let client = Arc::new(XmlResultSetClient::new(Arc::clone(&connection), Tz::UTC));
    let handler: Arc<dyn IdentityHandler> = Arc::new(FixtureIdentityHandler);
    (
        Authenticator::new(client, handler, "Web Users", "username"),
        connection,
    )
}

#[tokio::test]
async fn matching_user_record_authenticates() {
    let (auth, connection) = authenticator(Ok(people_document(&[(3, 1, "ada")])));

    let result = auth.authenticate("ada", "secret").await.expect("request succeeds");

    assert!(result.is_authenticated());
    assert_eq!(result.identity().map(|identity| identity.username()), Some("ada"));
    assert_eq!(
        connection.sent(),
        vec!["-lay=Web+Users&username=%3D%3Dada&-find"]
    );
}

#[tokio::test]
async fn http_401_means_invalid_credentials() {
    let (auth, _) = authenticator(Err(ConnectionError::unsuccessful_response(401_u16)));

    let result = auth.authenticate("ada", "wrong").await.expect("not an error");

    assert_eq!(result, AuthenticationResult::InvalidCredentials);
}

#[tokio::test]
async fn accepted_credentials_without_user_record_are_invalid_results() {
    let (auth, _) = authenticator(Ok(error_document(401)));

    let error = auth
        .authenticate("ada", "secret")
        .await
        .expect_err("no user record");

    assert!(matches!(error, AuthenticationError::EmptyResultSet));
    assert_eq!(error.kind(), ErrorKind::InvalidResult);
}

#[tokio::test]
async fn server_errors_propagate() {
    let (auth, _) = authenticator(Err(ConnectionError::unsuccessful_response(503_u16)));

    let error = auth
        .authenticate("ada", "secret")
        .await
        .expect_err("server unavailable");

    assert_eq!(error.kind(), ErrorKind::Protocol);
}
