//! End-to-end repository behaviour over the result-set client.
//!
//! Commands flow through the real decoder and client into a scripted
//! connection, so these tests pin both the wire encoding and the identity-map
//! bookkeeping.

mod support;

use std::sync::Arc;

use chrono_tz::Tz;
use fmclient::domain::ports::{ConnectionError, Extraction, Hydration, MappingError};
use fmclient::domain::{
    ErrorKind, FieldType, ModId, Parameters, Range, Record, RecordId, Repository,
    RepositoryError, Search, Sort, SortOrder, StringType, Value,
};
use fmclient::outbound::result_set::XmlResultSetClient;
use rstest::rstest;
use support::{ScriptedConnection, error_document, people_document};

#[derive(Debug, Clone, PartialEq, Eq)]
struct Person {
    name: String,
}

struct PersonMapping;

impl Hydration<Person> for PersonMapping {
    fn hydrate_new_entity(&self, record: &Record) -> Result<Person, MappingError> {
        Ok(Person {
            name: StringType.from_filemaker_value(record.value("name").unwrap_or(&Value::Null))?,
        })
    }

    fn hydrate_existing_entity(
        &self,
        record: &Record,
        entity: &mut Person,
    ) -> Result<(), MappingError> {
        entity.name = StringType.from_filemaker_value(record.value("name").unwrap_or(&Value::Null))?;
        Ok(())
    }
}

impl Extraction<Person> for PersonMapping {
    fn extract(&self, entity: &Person) -> Result<Parameters, MappingError> {
        let mut parameters = Parameters::new();
        parameters.insert("name", StringType.to_filemaker_value(&entity.name));
        Ok(parameters)
    }
}

type PeopleRepository = Repository<Person, XmlResultSetClient<ScriptedConnection>>;

fn repository(
    responses: impl IntoIterator<Item = Result<String, ConnectionError>>,
) -> (PeopleRepository, Arc<ScriptedConnection>) {
    let connection = Arc::new(ScriptedConnection::new(responses));
    let client = Arc::new(XmlResultSetClient::new(Arc::clone(&connection), Tz::UTC));
    let mapping = Arc::new(PersonMapping);
    let hydration: Arc<dyn Hydration<Person>> = mapping.clone();
    let extraction: Arc<dyn Extraction<Person>> = mapping;
    (Repository::new(client, hydration, extraction, "people"), connection)
}

#[tokio::test]
async fn repeated_finds_share_one_entity() {
    let (mut people, connection) = repository([
        Ok(people_document(&[(7, 1, "Ada")])),
        Ok(people_document(&[(7, 4, "Ada Lovelace")])),
    ]);

    let first = people
        .find(RecordId::new(7))
        .await
        .expect("find succeeds")
        .expect("record exists");
    let second = people
        .find(RecordId::new(7))
        .await
        .expect("find succeeds")
        .expect("record exists");

    assert_eq!(first, second);
    assert_eq!(
        people.get(first).map(|person| person.name.as_str()),
        Some("Ada")
    );
    assert_eq!(
        people.managed_entry(first).map(|entry| entry.mod_id),
        Some(ModId::new(4))
    );
    assert_eq!(
        connection.sent(),
        vec!["-lay=people&-recid=7&-max=1&-find"; 2]
    );
}

#[tokio::test]
async fn stale_update_is_rejected_and_forced_update_wins() {
    let (mut people, connection) = repository([
        Ok(people_document(&[(7, 2, "Ada")])),
        Ok(error_document(306)),
        Ok(people_document(&[(7, 5, "Grace")])),
    ]);
    let handle = people
        .find(RecordId::new(7))
        .await
        .expect("find succeeds")
        .expect("record exists");
    if let Some(person) = people.get_mut(handle) {
        person.name = "Grace".to_owned();
    }

    let stale = people.update(handle, false).await.expect_err("record changed");
    assert_eq!(stale.kind(), ErrorKind::Protocol);
    assert_eq!(
        people.managed_entry(handle).map(|entry| entry.mod_id),
        Some(ModId::new(2))
    );

    people.update(handle, true).await.expect("forced update succeeds");
    assert_eq!(
        people.managed_entry(handle).map(|entry| entry.mod_id),
        Some(ModId::new(5))
    );

    let sent = connection.sent();
    assert_eq!(
        sent.get(1).map(String::as_str),
        Some("-lay=people&name=Grace&-recid=7&-modid=2&-edit")
    );
    assert_eq!(
        sent.get(2).map(String::as_str),
        Some("-lay=people&name=Grace&-recid=7&-edit")
    );
}

#[tokio::test]
async fn oversized_sort_fails_before_any_request() {
    let (mut people, connection) = repository([]);
    let sort = (1..=10).fold(Sort::new(), |partial, index| {
        partial.by(format!("field{index}"), SortOrder::Ascend)
    });

    let error = people
        .find_all(&sort, Range::all())
        .await
        .expect_err("ten sort fields");

    assert!(matches!(error, RepositoryError::TooManySortParameters { limit: 9, .. }));
    assert_eq!(error.kind(), ErrorKind::Domain);
    assert!(connection.sent().is_empty());
}

#[rstest]
#[case(8)]
#[case(401)]
#[tokio::test]
async fn no_record_codes_yield_empty_results(#[case] code: u32) {
    let (mut people, _) = repository([Ok(error_document(code))]);
    let search = Search::new().field("name", "Nobody");

    let handles = people
        .find_by(&search, &Sort::new(), Range::all())
        .await
        .expect("empty result is not an error");

    assert!(handles.is_empty());
    assert_eq!(handles.total_count(), 0);
}

#[tokio::test]
async fn find_by_pages_and_keeps_total_count() {
    let (mut people, connection) = repository([Ok(people_document(&[
        (1, 1, "Ada"),
        (2, 1, "Grace"),
    ]))]);
    let search = Search::new().field("name", "A*");
    let sort = Sort::new().by("name", SortOrder::Descend);

    let handles = people
        .find_by(&search, &sort, Range::new(Some(2), Some(4)))
        .await
        .expect("find succeeds");

    let names: Vec<&str> = handles
        .iter()
        .filter_map(|handle| people.get(*handle))
        .map(|person| person.name.as_str())
        .collect();
    assert_eq!(names, ["Ada", "Grace"]);
    assert_eq!(handles.total_count(), 2);
    assert_eq!(
        connection.sent(),
        vec![
            "-lay=people&name=A%5C*&-sortfield.1=name&-sortorder.1=descend&-max=2&-skip=4&-find"
        ]
    );
}

#[tokio::test]
async fn insert_then_delete_round_trips() {
    let (mut people, connection) = repository([
        Ok(people_document(&[(12, 0, "Ada")])),
        Ok(people_document(&[])),
    ]);

    let handle = people
        .insert(Person {
            name: "Ada".to_owned(),
        })
        .await
        .expect("insert succeeds");
    assert_eq!(
        people.managed_entry(handle).map(|entry| entry.record_id),
        Some(RecordId::new(12))
    );

    let removed = people.delete(handle, false).await.expect("delete succeeds");
    assert_eq!(removed.name, "Ada");
    assert!(people.get(handle).is_none());
    assert_eq!(
        connection.sent(),
        vec![
            "-lay=people&name=Ada&-new",
            "-lay=people&-recid=12&-modid=0&-delete",
        ]
    );
}

#[tokio::test]
async fn transport_failures_surface_as_protocol_errors() {
    let (mut people, _) = repository([Err(ConnectionError::unsuccessful_response(500_u16))]);

    let error = people
        .find(RecordId::new(1))
        .await
        .expect_err("server error");

    assert_eq!(error.kind(), ErrorKind::Protocol);
}
