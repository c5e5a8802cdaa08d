#![allow(dead_code)]

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use serde_json::{json, Value};
use template_publisher_core::contract::{CustomResourceEvent, DeleteAcknowledgement};
use template_publisher_lambda::adapters::object_store::ObjectStore;
use template_publisher_lambda::adapters::response::ResponseSink;

pub const STACK_ID: &str = "arn:aws:cloudformation:us-west-2:EXAMPLE/stack-name/guid123";
pub const RESPONSE_URL: &str = "https://cloudformation-custom-resource-response.example/signed";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOp {
    Download { bucket: String, key: String },
    Write { bucket: String, key: String },
    Delete { bucket: String, key: String },
}

/// Object store kept in memory, recording every call in order.
#[derive(Default)]
pub struct InMemoryStore {
    objects: Mutex<HashMap<(String, String), Vec<u8>>>,
    ops: Mutex<Vec<StoreOp>>,
}

impl InMemoryStore {
    pub fn with_object(self, bucket: &str, key: &str, body: &str) -> Self {
        self.objects
            .lock()
            .expect("poisoned mutex")
            .insert((bucket.to_string(), key.to_string()), body.as_bytes().to_vec());
        self
    }

    pub fn text(&self, bucket: &str, key: &str) -> Option<String> {
        self.objects
            .lock()
            .expect("poisoned mutex")
            .get(&(bucket.to_string(), key.to_string()))
            .map(|body| String::from_utf8(body.clone()).expect("object should be utf-8"))
    }

    pub fn ops(&self) -> Vec<StoreOp> {
        self.ops.lock().expect("poisoned mutex").clone()
    }

    fn record(&self, op: StoreOp) {
        self.ops.lock().expect("poisoned mutex").push(op);
    }
}

impl ObjectStore for InMemoryStore {
    fn download_object(&self, bucket: &str, key: &str, destination: &Path) -> Result<(), String> {
        self.record(StoreOp::Download {
            bucket: bucket.to_string(),
            key: key.to_string(),
        });
        let body = self
            .objects
            .lock()
            .expect("poisoned mutex")
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
            .ok_or_else(|| format!("NoSuchKey: {key}"))?;
        std::fs::write(destination, body).map_err(|error| error.to_string())
    }

    fn write_object(&self, bucket: &str, key: &str, body: &[u8]) -> Result<(), String> {
        self.record(StoreOp::Write {
            bucket: bucket.to_string(),
            key: key.to_string(),
        });
        self.objects
            .lock()
            .expect("poisoned mutex")
            .insert((bucket.to_string(), key.to_string()), body.to_vec());
        Ok(())
    }

    fn delete_object(&self, bucket: &str, key: &str) -> Result<DeleteAcknowledgement, String> {
        self.record(StoreOp::Delete {
            bucket: bucket.to_string(),
            key: key.to_string(),
        });
        let existed = self
            .objects
            .lock()
            .expect("poisoned mutex")
            .remove(&(bucket.to_string(), key.to_string()))
            .is_some();
        Ok(DeleteAcknowledgement {
            delete_marker: existed.then_some(false),
            version_id: None,
        })
    }
}

#[derive(Default)]
pub struct RecordingSink {
    responses: Mutex<Vec<(String, Value)>>,
}

impl RecordingSink {
    pub fn responses(&self) -> Vec<(String, Value)> {
        self.responses.lock().expect("poisoned mutex").clone()
    }
}

impl ResponseSink for RecordingSink {
    fn send_response(&self, response_url: &str, body: &[u8]) -> Result<(), String> {
        let document = serde_json::from_slice(body).map_err(|error| error.to_string())?;
        self.responses
            .lock()
            .expect("poisoned mutex")
            .push((response_url.to_string(), document));
        Ok(())
    }
}

pub fn lifecycle_event(request_type: &str, properties: Value) -> CustomResourceEvent {
    serde_json::from_value(json!({
        "RequestType": request_type,
        "ServiceToken": "arn:aws:lambda:us-west-2:EXAMPLE:function:template-publisher",
        "ResponseURL": RESPONSE_URL,
        "StackId": STACK_ID,
        "RequestId": "unique id for this request",
        "ResourceType": "Custom::TestResource",
        "LogicalResourceId": "MyTestResource",
        "ResourceProperties": properties,
    }))
    .expect("fixture event should parse")
}

pub fn example_properties() -> Value {
    json!({
        "ServiceToken": "arn:aws:lambda:us-west-2:EXAMPLE:function:template-publisher",
        "TemplateS3Bucket": "bucket",
        "TemplateS3Key": "templatepath/template.j2",
        "HarnessLiterals": {"ReplaceMe": "Test"},
        "CommaLists": {"ThisIsAList": "value1,value2,value3"},
        "S3Bucket": "bucket",
        "S3KeyPrefix": "templatepath/",
        "S3Suffix": "json"
    })
}
