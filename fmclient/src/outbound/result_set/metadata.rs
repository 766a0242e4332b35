//! Field descriptors built from the response's metadata block.

use std::collections::HashMap;

use chrono_tz::Tz;

use super::dto::{FieldDefinitionDto, MetadataBlock};
use super::transformer::Transformer;

const UNKNOWN_RESULT_TYPE: &str = "unknown";

/// How to decode the values of one field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct FieldDescriptor {
    pub(super) repeatable: bool,
    pub(super) transformer: Transformer,
}

/// Descriptors keyed by the fully-qualified field name.
pub(super) type FieldDescriptors = HashMap<String, FieldDescriptor>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum MetadataError {
    UnknownField { field: String },
    InvalidDefinition(String),
}

/// Build descriptors for every field, including related-set fields.
///
/// A name defined twice keeps the descriptor parsed last.
pub(super) fn parse_metadata(
    block: MetadataBlock<'_>,
    server_time_zone: Tz,
) -> Result<FieldDescriptors, MetadataError> {
    let mut descriptors = FieldDescriptors::new();
    collect(block, server_time_zone, &mut descriptors)?;
    Ok(descriptors)
}

fn collect(
    block: MetadataBlock<'_>,
    server_time_zone: Tz,
    descriptors: &mut FieldDescriptors,
) -> Result<(), MetadataError> {
    for definition in block.field_definitions {
        let descriptor = describe(definition, server_time_zone)?;
        descriptors.insert(definition.name.clone(), descriptor);
    }
    for related in block.related_set_definitions {
        collect(related.as_block(), server_time_zone, descriptors)?;
    }
    Ok(())
}

fn describe(
    definition: &FieldDefinitionDto,
    server_time_zone: Tz,
) -> Result<FieldDescriptor, MetadataError> {
    if definition.result == UNKNOWN_RESULT_TYPE {
        return Err(MetadataError::UnknownField {
            field: definition.name.clone(),
        });
    }

    let transformer = Transformer::for_result_type(&definition.result, server_time_zone)
        .ok_or_else(|| {
            MetadataError::InvalidDefinition(format!(
                "field \"{}\" has invalid result type \"{}\"",
                definition.name, definition.result
            ))
        })?;

    let max_repeat = match definition.max_repeat.as_deref().map(str::trim) {
        None | Some("") => 1,
        Some(raw) => raw.parse::<u32>().map_err(|_| {
            MetadataError::InvalidDefinition(format!(
                "field \"{}\" has invalid max-repeat \"{raw}\"",
                definition.name
            ))
        })?,
    };

    Ok(FieldDescriptor {
        repeatable: max_repeat > 1,
        transformer,
    })
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::outbound::result_set::dto::RelatedSetDefinitionDto;
    use rstest::rstest;

    fn definition(name: &str, max_repeat: &str, result: &str) -> FieldDefinitionDto {
        FieldDefinitionDto {
            name: name.to_owned(),
            max_repeat: Some(max_repeat.to_owned()),
            result: result.to_owned(),
        }
    }

    fn parse(
        fields: &[FieldDefinitionDto],
        related: &[RelatedSetDefinitionDto],
    ) -> Result<FieldDescriptors, MetadataError> {
        parse_metadata(
            MetadataBlock {
                field_definitions: fields,
                related_set_definitions: related,
            },
            Tz::UTC,
        )
    }

    #[rstest]
    #[case("1", false)]
    #[case("3", true)]
    fn repeatable_follows_max_repeat(#[case] max_repeat: &str, #[case] expected: bool) {
        let descriptors =
            parse(&[definition("tags", max_repeat, "text")], &[]).expect("valid metadata");
        assert_eq!(
            descriptors.get("tags").map(|descriptor| descriptor.repeatable),
            Some(expected)
        );
    }

    #[rstest]
    fn related_set_fields_are_flattened() {
        let related = RelatedSetDefinitionDto {
            field_definitions: vec![definition("Orders::total", "1", "number")],
            related_set_definitions: Vec::new(),
        };
        let descriptors =
            parse(&[definition("name", "1", "text")], &[related]).expect("valid metadata");

        assert_eq!(descriptors.len(), 2);
        assert_eq!(
            descriptors.get("Orders::total").map(|d| d.transformer),
            Some(Transformer::Number)
        );
    }

    #[rstest]
    fn later_definitions_win() {
        let related = RelatedSetDefinitionDto {
            field_definitions: vec![definition("name", "1", "number")],
            related_set_definitions: Vec::new(),
        };
        let descriptors =
            parse(&[definition("name", "1", "text")], &[related]).expect("valid metadata");
        assert_eq!(
            descriptors.get("name").map(|d| d.transformer),
            Some(Transformer::Number)
        );
    }

    #[rstest]
    fn unknown_result_type_names_the_field() {
        assert_eq!(
            parse(&[definition("mystery", "1", "unknown")], &[]),
            Err(MetadataError::UnknownField {
                field: "mystery".to_owned()
            })
        );
    }

    #[rstest]
    fn unregistered_result_type_is_invalid() {
        let error = parse(&[definition("blob", "1", "binary")], &[]).expect_err("bad type");
        assert!(matches!(
            error,
            MetadataError::InvalidDefinition(message) if message.contains("\"binary\"")
        ));
    }
}
