use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub type PropertyBag = Map<String, Value>;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum RequestType {
    Create,
    Update,
    Delete,
}

impl RequestType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "Create",
            Self::Update => "Update",
            Self::Delete => "Delete",
        }
    }

    pub fn is_delete(self) -> bool {
        matches!(self, Self::Delete)
    }
}

/// Lifecycle event delivered by CloudFormation to a custom resource provider.
///
/// Only the fields the publisher reads or echoes back are modelled. Unknown
/// envelope fields such as `ServiceToken` are ignored on deserialization.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct CustomResourceEvent {
    pub request_type: RequestType,
    pub stack_id: String,
    pub logical_resource_id: String,
    #[serde(default)]
    pub request_id: String,
    #[serde(rename = "ResponseURL", default)]
    pub response_url: String,
    #[serde(default)]
    pub resource_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub physical_resource_id: Option<String>,
    #[serde(default)]
    pub resource_properties: PropertyBag,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_resource_properties: Option<PropertyBag>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PublishOutput {
    #[serde(rename = "TemplateS3Url")]
    pub template_s3_url: String,
}

/// Acknowledgement returned by the object store for a delete request.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct DeleteAcknowledgement {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delete_marker: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PublishOutcome {
    Published {
        physical_resource_id: String,
        output: PublishOutput,
    },
    Deleted {
        physical_resource_id: String,
        acknowledgement: DeleteAcknowledgement,
    },
}

impl PublishOutcome {
    pub fn physical_resource_id(&self) -> &str {
        match self {
            Self::Published {
                physical_resource_id,
                ..
            }
            | Self::Deleted {
                physical_resource_id,
                ..
            } => physical_resource_id,
        }
    }

    /// Result value handed back to the caller: the output record for a
    /// publish, the raw store acknowledgement for a delete.
    pub fn to_value(&self) -> Value {
        match self {
            Self::Published { output, .. } => {
                serde_json::to_value(output).unwrap_or(Value::Null)
            }
            Self::Deleted {
                acknowledgement, ..
            } => serde_json::to_value(acknowledgement).unwrap_or(Value::Null),
        }
    }
}
