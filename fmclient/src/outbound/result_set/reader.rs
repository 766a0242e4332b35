//! Streaming walk over `fmresultset.xml` into the raw DTO shapes.
//!
//! Child elements are accepted in any order and `<data>` text is kept
//! exactly as sent, surrounding whitespace included. Elements the grammar
//! does not use are skipped.

use std::fmt;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use thiserror::Error;

use super::dto::{
    DataSourceDto, ErrorDto, FieldDefinitionDto, FieldDto, MetadataDto, RecordDto,
    RelatedSetDefinitionDto, RelatedSetDto, ResultSetDocumentDto, ResultSetDto,
};

/// The body is not a readable result-set document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub(super) struct MalformedDocument(String);

impl MalformedDocument {
    fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

fn malformed(error: impl fmt::Display) -> MalformedDocument {
    MalformedDocument(error.to_string())
}

/// Read a whole response body.
pub(super) fn read_document(xml: &str) -> Result<ResultSetDocumentDto, MalformedDocument> {
    let mut reader = DocumentReader::new(xml);
    let (root, open) = reader
        .first_element()?
        .ok_or_else(|| MalformedDocument::new("missing fmresultset element"))?;
    if local_name(&root) != "fmresultset" {
        return Err(MalformedDocument::new(format!(
            "unexpected root element <{}>",
            local_name(&root)
        )));
    }
    if !open {
        return Err(MalformedDocument::new("missing error element"));
    }
    reader.document_body()
}

/// Next child element of the element being read, and whether it has content.
type Child<'a> = Option<(BytesStart<'a>, bool)>;

struct DocumentReader<'a> {
    reader: Reader<&'a [u8]>,
}

impl<'a> DocumentReader<'a> {
    fn new(xml: &'a str) -> Self {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(false);
        Self { reader }
    }

    fn first_element(&mut self) -> Result<Child<'a>, MalformedDocument> {
        loop {
            match self.reader.read_event().map_err(malformed)? {
                Event::Start(start) => return Ok(Some((start, true))),
                Event::Empty(start) => return Ok(Some((start, false))),
                Event::Eof => return Ok(None),
                _ => {}
            }
        }
    }

    /// Advance to the next child element; `None` once the parent closes.
    fn next_child(&mut self) -> Result<Child<'a>, MalformedDocument> {
        loop {
            match self.reader.read_event().map_err(malformed)? {
                Event::Start(start) => return Ok(Some((start, true))),
                Event::Empty(start) => return Ok(Some((start, false))),
                Event::End(_) => return Ok(None),
                Event::Eof => return Err(MalformedDocument::new("unexpected end of document")),
                _ => {}
            }
        }
    }

    fn skip(&mut self, start: &BytesStart<'_>, open: bool) -> Result<(), MalformedDocument> {
        if open {
            self.reader.read_to_end(start.name()).map_err(malformed)?;
        }
        Ok(())
    }

    fn document_body(&mut self) -> Result<ResultSetDocumentDto, MalformedDocument> {
        let mut error_code = None;
        let mut datasource = None;
        let mut metadata = None;
        let mut resultset = None;

        while let Some((child, open)) = self.next_child()? {
            match local_name(&child).as_str() {
                "error" => {
                    error_code = Some(ErrorDto {
                        code: attribute(&child, "code")?.unwrap_or_default(),
                    });
                    self.skip(&child, open)?;
                }
                "datasource" => {
                    datasource = Some(DataSourceDto {
                        database: attribute(&child, "database")?.unwrap_or_default(),
                        table: attribute(&child, "table")?.unwrap_or_default(),
                        layout: attribute(&child, "layout")?.unwrap_or_default(),
                    });
                    self.skip(&child, open)?;
                }
                "metadata" => {
                    let mut block = MetadataDto::default();
                    if open {
                        self.definitions(
                            &mut block.field_definitions,
                            &mut block.related_set_definitions,
                        )?;
                    }
                    metadata = Some(block);
                }
                "resultset" => {
                    let count = attribute(&child, "count")?;
                    let records = if open { self.records()? } else { Vec::new() };
                    resultset = Some(ResultSetDto { count, records });
                }
                _ => self.skip(&child, open)?,
            }
        }

        let error = error_code.ok_or_else(|| MalformedDocument::new("missing error element"))?;
        Ok(ResultSetDocumentDto {
            error,
            datasource,
            metadata,
            resultset,
        })
    }

    fn definitions(
        &mut self,
        fields: &mut Vec<FieldDefinitionDto>,
        related: &mut Vec<RelatedSetDefinitionDto>,
    ) -> Result<(), MalformedDocument> {
        while let Some((child, open)) = self.next_child()? {
            match local_name(&child).as_str() {
                "field-definition" => {
                    fields.push(FieldDefinitionDto {
                        name: attribute(&child, "name")?.unwrap_or_default(),
                        max_repeat: attribute(&child, "max-repeat")?,
                        result: attribute(&child, "result")?.unwrap_or_default(),
                    });
                    self.skip(&child, open)?;
                }
                "relatedset-definition" => {
                    let mut nested = RelatedSetDefinitionDto {
                        field_definitions: Vec::new(),
                        related_set_definitions: Vec::new(),
                    };
                    if open {
                        self.definitions(
                            &mut nested.field_definitions,
                            &mut nested.related_set_definitions,
                        )?;
                    }
                    related.push(nested);
                }
                _ => self.skip(&child, open)?,
            }
        }
        Ok(())
    }

    fn records(&mut self) -> Result<Vec<RecordDto>, MalformedDocument> {
        let mut records = Vec::new();
        while let Some((child, open)) = self.next_child()? {
            if local_name(&child) == "record" {
                records.push(self.record(&child, open)?);
            } else {
                self.skip(&child, open)?;
            }
        }
        Ok(records)
    }

    fn record(&mut self, start: &BytesStart<'_>, open: bool) -> Result<RecordDto, MalformedDocument> {
        let mut record = RecordDto {
            record_id: attribute(start, "record-id")?.unwrap_or_default(),
            mod_id: attribute(start, "mod-id")?.unwrap_or_default(),
            fields: Vec::new(),
            related_sets: Vec::new(),
        };
        if !open {
            return Ok(record);
        }

        while let Some((child, child_open)) = self.next_child()? {
            match local_name(&child).as_str() {
                "field" => {
                    let name = attribute(&child, "name")?.unwrap_or_default();
                    let data = if child_open { self.data()? } else { Vec::new() };
                    record.fields.push(FieldDto { name, data });
                }
                "relatedset" => {
                    let table = attribute(&child, "table")?.unwrap_or_default();
                    let records = if child_open { self.records()? } else { Vec::new() };
                    record.related_sets.push(RelatedSetDto { table, records });
                }
                _ => self.skip(&child, child_open)?,
            }
        }
        Ok(record)
    }

    fn data(&mut self) -> Result<Vec<String>, MalformedDocument> {
        let mut values = Vec::new();
        while let Some((child, open)) = self.next_child()? {
            if local_name(&child) == "data" {
                values.push(if open { self.text()? } else { String::new() });
            } else {
                self.skip(&child, open)?;
            }
        }
        Ok(values)
    }

    /// Concatenated text and CDATA up to the closing tag, unmodified.
    fn text(&mut self) -> Result<String, MalformedDocument> {
        let mut text = String::new();
        loop {
            match self.reader.read_event().map_err(malformed)? {
                Event::Text(chunk) => text.push_str(&chunk.unescape().map_err(malformed)?),
                Event::CData(chunk) => {
                    let bytes = chunk.into_inner();
                    let decoded = std::str::from_utf8(&bytes).map_err(malformed)?;
                    text.push_str(decoded);
                }
                Event::Start(nested) => {
                    self.reader.read_to_end(nested.name()).map_err(malformed)?;
                }
                Event::End(_) => return Ok(text),
                Event::Eof => return Err(MalformedDocument::new("unexpected end of document")),
                _ => {}
            }
        }
    }
}

fn local_name(start: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(start.local_name().as_ref()).into_owned()
}

fn attribute(start: &BytesStart<'_>, name: &str) -> Result<Option<String>, MalformedDocument> {
    for entry in start.attributes() {
        let attr = entry.map_err(malformed)?;
        if attr.key.local_name().as_ref() == name.as_bytes() {
            return Ok(Some(attr.unescape_value().map_err(malformed)?.into_owned()));
        }
    }
    Ok(None)
}
