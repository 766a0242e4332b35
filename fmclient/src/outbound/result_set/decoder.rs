//! Result-set decoding driven by per-response field metadata.
//!
//! Decoding runs in three steps: the document is deserialised into raw DTOs,
//! the error code is checked, then records are walked using descriptors
//! parsed from the response's own metadata block. Descriptors are never
//! cached across responses.

use chrono_tz::Tz;
use item_collection::ItemCollection;
use tracing::{debug, warn};

use super::dto::{DataSourceDto, FieldDto, MetadataDto, RecordDto, ResultSetDto};
use super::metadata::{FieldDescriptors, MetadataError, parse_metadata};
use super::reader::read_document;
use crate::domain::ports::ResultSetError;
use crate::domain::{FieldValue, ModId, Record, RecordId, Value};

/// Error codes meaning "no records", answered with an empty collection.
const EMPTY_RESULT_CODES: [u32; 2] = [8, 401];

/// Decoder for `fmresultset.xml` documents.
///
/// # Examples
/// ```
/// use chrono_tz::Tz;
/// use fmclient::outbound::result_set::ResultSetDecoder;
///
/// let xml = r#"<fmresultset><error code="401"/></fmresultset>"#;
/// let records = ResultSetDecoder::new(Tz::UTC).decode(xml)?;
/// assert!(records.is_empty());
/// assert_eq!(records.total_count(), 0);
/// # Ok::<(), fmclient::domain::ports::ResultSetError>(())
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ResultSetDecoder {
    server_time_zone: Tz,
}

impl ResultSetDecoder {
    /// Decoder applying `server_time_zone` to timestamps.
    pub const fn new(server_time_zone: Tz) -> Self {
        Self { server_time_zone }
    }

    /// Decode a response body.
    ///
    /// # Errors
    ///
    /// - [`ResultSetError::MalformedXml`] when the body is not a result set.
    /// - [`ResultSetError::FileMaker`] for error codes other than 0, 8 and 401.
    /// - [`ResultSetError::UnknownField`] when metadata declares an `unknown`
    ///   result type.
    /// - [`ResultSetError::Parse`] for any other decoding failure.
    pub fn decode(&self, xml: &str) -> Result<ItemCollection<Record>, ResultSetError> {
        let document =
            read_document(xml).map_err(|error| ResultSetError::malformed_xml(error.to_string()))?;

        let code = document.error.code.trim().parse::<u32>().map_err(|_| {
            ResultSetError::malformed_xml(format!(
                "invalid error code \"{}\"",
                document.error.code
            ))
        })?;
        if EMPTY_RESULT_CODES.contains(&code) {
            debug!(code, "server reported no matching records");
            return Ok(ItemCollection::empty());
        }
        if code != 0 {
            debug!(code, "server reported an error");
            return Err(ResultSetError::file_maker(code));
        }

        let source = document.datasource.unwrap_or_default();
        self.decode_success(document.metadata, document.resultset)
            .map_err(|failure| failure.with_context(&source))
    }

    fn decode_success(
        &self,
        metadata: Option<MetadataDto>,
        resultset: Option<ResultSetDto>,
    ) -> Result<ItemCollection<Record>, DecodeFailure> {
        let definitions = metadata.unwrap_or_default();
        let descriptors = parse_metadata(definitions.as_block(), self.server_time_zone)?;
        let found =
            resultset.ok_or_else(|| DecodeFailure::Parse("missing resultset element".to_owned()))?;

        let records = found
            .records
            .iter()
            .map(|record| decode_record(record, &descriptors, 0))
            .collect::<Result<Vec<_>, _>>()?;

        let total_count = match found.count.as_deref().map(str::trim) {
            None | Some("") => records.len(),
            Some(raw) => raw
                .parse::<usize>()
                .map_err(|_| DecodeFailure::Parse(format!("invalid resultset count \"{raw}\"")))?,
        };

        Ok(ItemCollection::new(records, total_count))
    }
}

/// Failure before data-source context is attached.
#[derive(Debug)]
enum DecodeFailure {
    UnknownField(String),
    Parse(String),
}

impl From<MetadataError> for DecodeFailure {
    fn from(error: MetadataError) -> Self {
        match error {
            MetadataError::UnknownField { field } => Self::UnknownField(field),
            MetadataError::InvalidDefinition(message) => Self::Parse(message),
        }
    }
}

impl DecodeFailure {
    fn with_context(self, source: &DataSourceDto) -> ResultSetError {
        let error = match self {
            Self::UnknownField(field) => ResultSetError::unknown_field(
                source.database.as_str(),
                source.table.as_str(),
                source.layout.as_str(),
                field,
            ),
            Self::Parse(message) => ResultSetError::parse(
                source.database.as_str(),
                source.table.as_str(),
                source.layout.as_str(),
                message,
            ),
        };
        warn!(
            database = %source.database,
            table = %source.table,
            layout = %source.layout,
            %error,
            "failed to decode result set"
        );
        error
    }
}

/// Decode one record; `prefix_len` bytes are cut from each field name.
fn decode_record(
    dto: &RecordDto,
    descriptors: &FieldDescriptors,
    prefix_len: usize,
) -> Result<Record, DecodeFailure> {
    let record_id = parse_id(&dto.record_id, "record-id")?;
    let mod_id = parse_id(&dto.mod_id, "mod-id")?;
    let mut builder = Record::builder(RecordId::new(record_id), ModId::new(mod_id));

    for field in &dto.fields {
        let local_name = field.name.get(prefix_len..).unwrap_or(field.name.as_str());
        builder = builder.field(local_name, decode_field(field, descriptors)?);
    }

    for related in &dto.related_sets {
        let child_prefix_len = related.table.len() + 2;
        let children = related
            .records
            .iter()
            .map(|child| decode_record(child, descriptors, child_prefix_len))
            .collect::<Result<Vec<_>, _>>()?;
        builder = builder.related_set(related.table.as_str(), children);
    }

    Ok(builder.build())
}

fn decode_field(field: &FieldDto, descriptors: &FieldDescriptors) -> Result<FieldValue, DecodeFailure> {
    let descriptor = descriptors.get(&field.name).ok_or_else(|| {
        DecodeFailure::Parse(format!("field \"{}\" has no definition", field.name))
    })?;

    let transform = |raw: &str| {
        descriptor
            .transformer
            .transform(raw)
            .map_err(|error| DecodeFailure::Parse(format!("field \"{}\": {error}", field.name)))
    };

    if descriptor.repeatable {
        let values = field
            .data
            .iter()
            .map(|data| transform(data.as_str()))
            .collect::<Result<Vec<Value>, _>>()?;
        return Ok(FieldValue::Repeated(values));
    }

    let raw = field.data.first().map_or("", String::as_str);
    Ok(FieldValue::Single(transform(raw)?))
}

fn parse_id(raw: &str, attribute: &str) -> Result<u64, DecodeFailure> {
    raw.trim()
        .parse::<u64>()
        .map_err(|_| DecodeFailure::Parse(format!("invalid {attribute} \"{raw}\"")))
}

#[cfg(test)]
#[path = "decoder_tests.rs"]
mod tests;
