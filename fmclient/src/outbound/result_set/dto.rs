//! Raw shapes read from `fmresultset.xml` responses.
//!
//! Attributes stay raw strings so the decoder can report bad numbers with
//! data-source context instead of a generic XML error. Filled in by the
//! `reader` module.

#[derive(Debug)]
pub(super) struct ResultSetDocumentDto {
    pub(super) error: ErrorDto,
    pub(super) datasource: Option<DataSourceDto>,
    pub(super) metadata: Option<MetadataDto>,
    pub(super) resultset: Option<ResultSetDto>,
}

#[derive(Debug)]
pub(super) struct ErrorDto {
    pub(super) code: String,
}

#[derive(Debug, Default)]
pub(super) struct DataSourceDto {
    pub(super) database: String,
    pub(super) table: String,
    pub(super) layout: String,
}

#[derive(Debug, Default)]
pub(super) struct MetadataDto {
    pub(super) field_definitions: Vec<FieldDefinitionDto>,
    pub(super) related_set_definitions: Vec<RelatedSetDefinitionDto>,
}

#[derive(Debug)]
pub(super) struct FieldDefinitionDto {
    pub(super) name: String,
    pub(super) max_repeat: Option<String>,
    pub(super) result: String,
}

#[derive(Debug)]
pub(super) struct RelatedSetDefinitionDto {
    pub(super) field_definitions: Vec<FieldDefinitionDto>,
    pub(super) related_set_definitions: Vec<RelatedSetDefinitionDto>,
}

#[derive(Debug)]
pub(super) struct ResultSetDto {
    pub(super) count: Option<String>,
    pub(super) records: Vec<RecordDto>,
}

#[derive(Debug)]
pub(super) struct RecordDto {
    pub(super) record_id: String,
    pub(super) mod_id: String,
    pub(super) fields: Vec<FieldDto>,
    pub(super) related_sets: Vec<RelatedSetDto>,
}

#[derive(Debug)]
pub(super) struct FieldDto {
    pub(super) name: String,
    /// Text of each `<data>` element, untrimmed.
    pub(super) data: Vec<String>,
}

#[derive(Debug)]
pub(super) struct RelatedSetDto {
    pub(super) table: String,
    pub(super) records: Vec<RecordDto>,
}

impl MetadataDto {
    pub(super) fn as_block(&self) -> MetadataBlock<'_> {
        MetadataBlock {
            field_definitions: &self.field_definitions,
            related_set_definitions: &self.related_set_definitions,
        }
    }
}

impl RelatedSetDefinitionDto {
    pub(super) fn as_block(&self) -> MetadataBlock<'_> {
        MetadataBlock {
            field_definitions: &self.field_definitions,
            related_set_definitions: &self.related_set_definitions,
        }
    }
}

/// Borrowed view shared by the top-level and nested metadata blocks.
#[derive(Debug, Clone, Copy)]
pub(super) struct MetadataBlock<'a> {
    pub(super) field_definitions: &'a [FieldDefinitionDto],
    pub(super) related_set_definitions: &'a [RelatedSetDefinitionDto],
}
