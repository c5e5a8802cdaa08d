use serde_json::{Map, Value};
use thiserror::Error;

use crate::contract::{CustomResourceEvent, PropertyBag};
use crate::storage_keys::{destination_object_key, object_uri};
use crate::variables::{merge_variables, TemplateVariables};

pub const TEMPLATE_BUCKET: &str = "TemplateS3Bucket";
pub const TEMPLATE_KEY: &str = "TemplateS3Key";
pub const DESTINATION_BUCKET: &str = "S3Bucket";
pub const DESTINATION_KEY_PREFIX: &str = "S3KeyPrefix";
pub const DESTINATION_SUFFIX: &str = "S3Suffix";
pub const HARNESS_LITERALS: &str = "HarnessLiterals";
pub const COMMA_LISTS: &str = "CommaLists";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PropertyError {
    #[error("the property \"{field}\" must be provided")]
    Missing { field: &'static str },
    #[error("the property \"{field}\" must be a string")]
    NotAString { field: &'static str },
    #[error("the property \"{field}\" must not be empty")]
    Empty { field: &'static str },
    #[error("the property \"{field}\" must be a mapping")]
    NotAMapping { field: &'static str },
    #[error("the CommaLists entry \"{name}\" must be a comma-separated string")]
    CommaListNotString { name: String },
}

impl PropertyError {
    /// Name of the offending property, as it appears in the event.
    pub fn field(&self) -> &str {
        match self {
            Self::Missing { field }
            | Self::NotAString { field }
            | Self::Empty { field }
            | Self::NotAMapping { field } => field,
            Self::CommaListNotString { .. } => COMMA_LISTS,
        }
    }
}

/// Non-fatal findings raised while normalizing the property bag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyWarning {
    CommaListOverridesLiteral { name: String },
    SuffixIgnored { reason: &'static str },
    NoCommaLists,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationObject {
    pub bucket: String,
    pub key: String,
}

impl DestinationObject {
    pub fn uri(&self) -> String {
        object_uri(&self.bucket, &self.key)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateSource {
    pub bucket: String,
    pub key: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PublishPlan {
    Delete {
        destination: DestinationObject,
    },
    Render {
        destination: DestinationObject,
        source: TemplateSource,
        variables: TemplateVariables,
    },
}

impl PublishPlan {
    pub fn destination(&self) -> &DestinationObject {
        match self {
            Self::Delete { destination } | Self::Render { destination, .. } => destination,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedRequest {
    pub plan: PublishPlan,
    pub warnings: Vec<PropertyWarning>,
}

/// Validates the event's property bag and decides what the publisher must do.
///
/// Variable mappings are type-checked for every request type; the template
/// source is only required for Create and Update.
pub fn validate_event(event: &CustomResourceEvent) -> Result<ValidatedRequest, PropertyError> {
    let properties = &event.resource_properties;
    let mut warnings = Vec::new();

    let stack_id = non_empty(&event.stack_id, "StackId")?;
    let logical_resource_id = non_empty(&event.logical_resource_id, "LogicalResourceId")?;

    let bucket = required_string(properties, DESTINATION_BUCKET)?;
    let key_prefix = optional_string(properties, DESTINATION_KEY_PREFIX)?.unwrap_or_default();
    let suffix = normalize_suffix(properties.get(DESTINATION_SUFFIX), &mut warnings);

    let destination = DestinationObject {
        bucket: bucket.to_string(),
        key: destination_object_key(key_prefix, logical_resource_id, stack_id, &suffix),
    };

    let harness_literals = optional_mapping(properties, HARNESS_LITERALS)?;
    let comma_lists = optional_mapping(properties, COMMA_LISTS)?;

    if event.request_type.is_delete() {
        return Ok(ValidatedRequest {
            plan: PublishPlan::Delete { destination },
            warnings,
        });
    }

    let source = TemplateSource {
        bucket: required_string(properties, TEMPLATE_BUCKET)?.to_string(),
        key: required_string(properties, TEMPLATE_KEY)?.to_string(),
    };

    let harness_literals = harness_literals.cloned().unwrap_or_default();
    let comma_lists = match comma_lists {
        Some(value) => value.clone(),
        None => {
            warnings.push(PropertyWarning::NoCommaLists);
            Map::new()
        }
    };

    let (variables, overridden) = merge_variables(harness_literals, &comma_lists)?;
    warnings.extend(
        overridden
            .into_iter()
            .map(|name| PropertyWarning::CommaListOverridesLiteral { name }),
    );

    Ok(ValidatedRequest {
        plan: PublishPlan::Render {
            destination,
            source,
            variables,
        },
        warnings,
    })
}

/// Dot-prefixed extension, or empty when no usable suffix was supplied.
pub fn normalize_suffix(raw: Option<&Value>, warnings: &mut Vec<PropertyWarning>) -> String {
    let Some(raw) = raw else {
        return String::new();
    };
    let Some(text) = raw.as_str() else {
        warnings.push(PropertyWarning::SuffixIgnored {
            reason: "S3Suffix is not a string",
        });
        return String::new();
    };

    let extension = text.strip_prefix('.').unwrap_or(text);
    if extension.trim().is_empty() {
        warnings.push(PropertyWarning::SuffixIgnored {
            reason: "S3Suffix is empty",
        });
        return String::new();
    }
    format!(".{extension}")
}

fn non_empty<'a>(value: &'a str, field: &'static str) -> Result<&'a str, PropertyError> {
    if value.trim().is_empty() {
        return Err(PropertyError::Empty { field });
    }
    Ok(value)
}

fn required_string<'a>(
    properties: &'a PropertyBag,
    field: &'static str,
) -> Result<&'a str, PropertyError> {
    let value = optional_string(properties, field)?.ok_or(PropertyError::Missing { field })?;
    non_empty(value, field)
}

fn optional_string<'a>(
    properties: &'a PropertyBag,
    field: &'static str,
) -> Result<Option<&'a str>, PropertyError> {
    match properties.get(field) {
        None => Ok(None),
        Some(Value::String(text)) => Ok(Some(text.as_str())),
        Some(_) => Err(PropertyError::NotAString { field }),
    }
}

fn optional_mapping<'a>(
    properties: &'a PropertyBag,
    field: &'static str,
) -> Result<Option<&'a Map<String, Value>>, PropertyError> {
    match properties.get(field) {
        None => Ok(None),
        Some(Value::Object(map)) => Ok(Some(map)),
        Some(_) => Err(PropertyError::NotAMapping { field }),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn event(request_type: &str, properties: Value) -> CustomResourceEvent {
        serde_json::from_value(json!({
            "RequestType": request_type,
            "StackId": "arn:aws:cloudformation:us-west-2:EXAMPLE/stack-name/guid123",
            "LogicalResourceId": "MyTestResource",
            "RequestId": "request-1",
            "ResponseURL": "https://example.invalid/response",
            "ResourceType": "Custom::TemplatePublisher",
            "ResourceProperties": properties,
        }))
        .expect("fixture event should parse")
    }

    fn full_properties() -> Value {
        json!({
            "TemplateS3Bucket": "bucket",
            "TemplateS3Key": "templatepath/template.j2",
            "HarnessLiterals": {"ReplaceMe": "Test"},
            "CommaLists": {"ThisIsAList": "value1,value2,value3"},
            "S3Bucket": "bucket",
            "S3KeyPrefix": "templatepath/",
            "S3Suffix": "json"
        })
    }

    #[test]
    fn builds_render_plan_for_create() {
        let validated =
            validate_event(&event("Create", full_properties())).expect("event should validate");

        let PublishPlan::Render {
            destination,
            source,
            variables,
        } = validated.plan
        else {
            panic!("create should produce a render plan");
        };
        assert_eq!(destination.bucket, "bucket");
        assert_eq!(destination.key, "templatepath/MyTestResource-guid123.json");
        assert_eq!(source.key, "templatepath/template.j2");
        assert_eq!(variables.get("ReplaceMe"), Some(&json!("Test")));
        assert_eq!(
            variables.get("ThisIsAList"),
            Some(&json!(["value1", "value2", "value3"]))
        );
        assert!(validated.warnings.is_empty());
    }

    #[test]
    fn update_and_delete_share_the_create_destination() {
        let create = validate_event(&event("Create", full_properties())).expect("create");
        let update = validate_event(&event("Update", full_properties())).expect("update");
        let delete = validate_event(&event("Delete", full_properties())).expect("delete");

        assert_eq!(create.plan.destination(), update.plan.destination());
        assert_eq!(create.plan.destination(), delete.plan.destination());
        assert!(matches!(delete.plan, PublishPlan::Delete { .. }));
    }

    #[test]
    fn missing_destination_bucket_is_rejected() {
        let mut properties = full_properties();
        properties
            .as_object_mut()
            .expect("object")
            .remove("S3Bucket");

        let error = validate_event(&event("Create", properties)).expect_err("should fail");
        assert_eq!(
            error,
            PropertyError::Missing {
                field: DESTINATION_BUCKET
            }
        );
        assert_eq!(error.field(), "S3Bucket");
    }

    #[test]
    fn missing_template_source_is_rejected_for_create() {
        let error = validate_event(&event("Create", json!({"S3Bucket": "bucket"})))
            .expect_err("should fail");
        assert_eq!(
            error,
            PropertyError::Missing {
                field: TEMPLATE_BUCKET
            }
        );

        let error = validate_event(&event(
            "Update",
            json!({"S3Bucket": "bucket", "TemplateS3Bucket": "bucket"}),
        ))
        .expect_err("should fail");
        assert_eq!(error, PropertyError::Missing { field: TEMPLATE_KEY });
    }

    #[test]
    fn delete_does_not_require_template_source() {
        let validated = validate_event(&event(
            "Delete",
            json!({"S3Bucket": "bucket", "S3KeyPrefix": "templatepath/", "S3Suffix": "json"}),
        ))
        .expect("delete should validate");

        assert_eq!(
            validated.plan.destination().key,
            "templatepath/MyTestResource-guid123.json"
        );
    }

    #[test]
    fn delete_rejects_malformed_variable_mappings() {
        let error = validate_event(&event(
            "Delete",
            json!({"S3Bucket": "bucket", "HarnessLiterals": "nope"}),
        ))
        .expect_err("should fail");
        assert_eq!(
            error,
            PropertyError::NotAMapping {
                field: HARNESS_LITERALS
            }
        );

        let error = validate_event(&event(
            "Delete",
            json!({"S3Bucket": "bucket", "HarnessLiterals": {}, "CommaLists": 5}),
        ))
        .expect_err("should fail");
        assert_eq!(error, PropertyError::NotAMapping { field: COMMA_LISTS });
    }

    #[test]
    fn harness_literals_must_be_a_mapping() {
        let mut properties = full_properties();
        properties["HarnessLiterals"] = json!("ReplaceMe=Test");

        let error = validate_event(&event("Create", properties)).expect_err("should fail");
        assert_eq!(
            error,
            PropertyError::NotAMapping {
                field: HARNESS_LITERALS
            }
        );
    }

    #[test]
    fn comma_lists_must_be_a_mapping() {
        let mut properties = full_properties();
        properties["CommaLists"] = json!(["value1", "value2"]);

        let error = validate_event(&event("Create", properties)).expect_err("should fail");
        assert_eq!(error, PropertyError::NotAMapping { field: COMMA_LISTS });
        assert_eq!(
            error.to_string(),
            "the property \"CommaLists\" must be a mapping"
        );
    }

    #[test]
    fn collision_is_reported_as_warning() {
        let mut properties = full_properties();
        properties["HarnessLiterals"] = json!({"ThisIsAList": "literal"});

        let validated = validate_event(&event("Create", properties)).expect("should validate");
        assert_eq!(
            validated.warnings,
            vec![PropertyWarning::CommaListOverridesLiteral {
                name: "ThisIsAList".to_string()
            }]
        );
    }

    #[test]
    fn absent_comma_lists_is_noted() {
        let mut properties = full_properties();
        properties.as_object_mut().expect("object").remove("CommaLists");

        let validated = validate_event(&event("Create", properties)).expect("should validate");
        assert_eq!(validated.warnings, vec![PropertyWarning::NoCommaLists]);
    }

    #[test]
    fn optional_destination_fields_default_to_empty() {
        let validated = validate_event(&event(
            "Create",
            json!({
                "S3Bucket": "bucket",
                "TemplateS3Bucket": "bucket",
                "TemplateS3Key": "template.j2"
            }),
        ))
        .expect("should validate");

        assert_eq!(validated.plan.destination().key, "MyTestResource-guid123");
    }

    #[test]
    fn non_string_prefix_is_rejected() {
        let mut properties = full_properties();
        properties["S3KeyPrefix"] = json!(42);

        let error = validate_event(&event("Create", properties)).expect_err("should fail");
        assert_eq!(
            error,
            PropertyError::NotAString {
                field: DESTINATION_KEY_PREFIX
            }
        );
    }

    #[test]
    fn suffix_policy_adds_single_dot_and_ignores_blank_values() {
        let mut warnings = Vec::new();
        assert_eq!(normalize_suffix(Some(&json!("json")), &mut warnings), ".json");
        assert_eq!(normalize_suffix(Some(&json!(".json")), &mut warnings), ".json");
        assert_eq!(normalize_suffix(None, &mut warnings), "");
        assert!(warnings.is_empty());

        assert_eq!(normalize_suffix(Some(&json!("")), &mut warnings), "");
        assert_eq!(normalize_suffix(Some(&json!(3)), &mut warnings), "");
        assert_eq!(warnings.len(), 2);
    }

    #[test]
    fn suffix_strips_only_one_leading_dot_and_keeps_the_rest_verbatim() {
        let mut warnings = Vec::new();
        assert_eq!(normalize_suffix(Some(&json!("..json")), &mut warnings), "..json");
        assert_eq!(normalize_suffix(Some(&json!(" json ")), &mut warnings), ". json ");
        assert_eq!(normalize_suffix(Some(&json!("tar.gz")), &mut warnings), ".tar.gz");
        assert!(warnings.is_empty());

        assert_eq!(normalize_suffix(Some(&json!(".")), &mut warnings), "");
        assert_eq!(normalize_suffix(Some(&json!("  ")), &mut warnings), "");
        assert_eq!(warnings.len(), 2);
    }

    #[test]
    fn blank_logical_resource_id_is_rejected() {
        let mut fixture = event("Create", full_properties());
        fixture.logical_resource_id = " ".to_string();

        let error = validate_event(&fixture).expect_err("should fail");
        assert_eq!(
            error,
            PropertyError::Empty {
                field: "LogicalResourceId"
            }
        );
    }
}
