use serde::{Deserialize, Serialize};
use serde_json::Value;
use template_publisher_core::contract::{CustomResourceEvent, PublishOutcome};
use thiserror::Error;

use crate::adapters::response::ResponseSink;
use crate::handlers::publisher::{PublisherError, TemplatePublisher};

const MAX_REASON_CHARS: usize = 1024;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResponseStatus {
    Success,
    Failed,
}

/// Document CloudFormation expects at the event's pre-signed `ResponseURL`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct CustomResourceResponse {
    pub status: ResponseStatus,
    pub reason: String,
    pub physical_resource_id: String,
    pub stack_id: String,
    pub request_id: String,
    pub logical_resource_id: String,
    pub no_echo: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Invocation details used to point the orchestrator at our logs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CorrelationContext {
    pub log_stream_name: String,
    pub aws_request_id: String,
}

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("event has no ResponseURL to deliver to")]
    MissingResponseUrl,
    #[error("failed to serialize custom resource response: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("failed to deliver custom resource response: {0}")]
    Transport(String),
}

pub fn build_response(
    event: &CustomResourceEvent,
    result: &Result<PublishOutcome, PublisherError>,
    correlation: &CorrelationContext,
) -> CustomResourceResponse {
    let (status, reason, physical_resource_id, data) = match result {
        Ok(outcome) => (
            ResponseStatus::Success,
            format!(
                "See the details in CloudWatch Log Stream: {}",
                correlation.log_stream_name
            ),
            outcome.physical_resource_id().to_string(),
            non_empty_object(outcome.to_value()),
        ),
        Err(error) => (
            ResponseStatus::Failed,
            truncate_reason(format!(
                "{error} (CloudWatch Log Stream: {})",
                correlation.log_stream_name
            )),
            fallback_physical_resource_id(event),
            None,
        ),
    };

    CustomResourceResponse {
        status,
        reason,
        physical_resource_id,
        stack_id: event.stack_id.clone(),
        request_id: event.request_id.clone(),
        logical_resource_id: event.logical_resource_id.clone(),
        no_echo: false,
        data,
    }
}

/// Translates a publisher result into the orchestrator's acknowledgement and
/// sends it. Returns the document that was delivered.
pub fn deliver(
    sink: &dyn ResponseSink,
    event: &CustomResourceEvent,
    result: &Result<PublishOutcome, PublisherError>,
    correlation: &CorrelationContext,
) -> Result<CustomResourceResponse, DeliveryError> {
    if event.response_url.trim().is_empty() {
        return Err(DeliveryError::MissingResponseUrl);
    }

    let response = build_response(event, result, correlation);
    let body = serde_json::to_vec(&response)?;
    sink.send_response(&event.response_url, &body)
        .map_err(DeliveryError::Transport)?;

    tracing::info!(
        event = "response_delivered",
        status = ?response.status,
        physical_resource_id = %response.physical_resource_id,
        aws_request_id = %correlation.aws_request_id
    );
    Ok(response)
}

/// Runs the publisher for one lifecycle event and always answers the
/// orchestrator, whether the publish succeeded or not.
pub fn handle_and_deliver(
    publisher: &TemplatePublisher<'_>,
    sink: &dyn ResponseSink,
    event: &CustomResourceEvent,
    correlation: &CorrelationContext,
) -> Result<CustomResourceResponse, DeliveryError> {
    let result = publisher.handle(event);
    if let Err(error) = &result {
        // Validation failures are logged with their field by the publisher.
        if !error.is_validation() {
            tracing::error!(event = "publish_failed", error = %error);
        }
    }

    deliver(sink, event, &result, correlation).inspect_err(|error| {
        tracing::error!(event = "response_delivery_failed", error = %error);
    })
}

/// Best-effort FAILED acknowledgement for a payload that could not be parsed
/// as a lifecycle event. Correlation fields are read straight from the raw
/// JSON so the orchestrator is not left waiting for a timeout.
pub fn deliver_rejected_event(
    sink: &dyn ResponseSink,
    payload: &Value,
    reason: &str,
    correlation: &CorrelationContext,
) -> Result<CustomResourceResponse, DeliveryError> {
    let field = |name: &str| {
        payload
            .get(name)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };
    let response_url = field("ResponseURL");
    if response_url.trim().is_empty() {
        return Err(DeliveryError::MissingResponseUrl);
    }

    let logical_resource_id = field("LogicalResourceId");
    let physical_resource_id = Some(field("PhysicalResourceId"))
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| logical_resource_id.clone());
    let response = CustomResourceResponse {
        status: ResponseStatus::Failed,
        reason: truncate_reason(format!(
            "invalid custom resource event: {reason} (CloudWatch Log Stream: {})",
            correlation.log_stream_name
        )),
        physical_resource_id,
        stack_id: field("StackId"),
        request_id: field("RequestId"),
        logical_resource_id,
        no_echo: false,
        data: None,
    };

    let body = serde_json::to_vec(&response)?;
    sink.send_response(&response_url, &body)
        .map_err(DeliveryError::Transport)?;

    tracing::info!(
        event = "response_delivered",
        status = ?response.status,
        physical_resource_id = %response.physical_resource_id,
        aws_request_id = %correlation.aws_request_id
    );
    Ok(response)
}

fn fallback_physical_resource_id(event: &CustomResourceEvent) -> String {
    event
        .physical_resource_id
        .clone()
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| event.logical_resource_id.clone())
}

fn non_empty_object(value: Value) -> Option<Value> {
    match &value {
        Value::Object(map) if !map.is_empty() => Some(value),
        _ => None,
    }
}

fn truncate_reason(reason: String) -> String {
    if reason.chars().count() <= MAX_REASON_CHARS {
        return reason;
    }
    reason.chars().take(MAX_REASON_CHARS).collect()
}
