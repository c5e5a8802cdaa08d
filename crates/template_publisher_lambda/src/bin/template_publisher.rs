use std::path::Path;

use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;
use template_publisher_core::contract::{CustomResourceEvent, DeleteAcknowledgement};
use template_publisher_core::render::TeraRenderer;
use template_publisher_lambda::adapters::object_store::ObjectStore;
use template_publisher_lambda::adapters::response::ResponseSink;
use template_publisher_lambda::config::RuntimeConfig;
use template_publisher_lambda::handlers::envelope::{
    deliver_rejected_event, handle_and_deliver, CorrelationContext,
};
use template_publisher_lambda::handlers::publisher::TemplatePublisher;
use template_publisher_lambda::logging::build_dispatch;

struct S3ObjectStore {
    s3_client: aws_sdk_s3::Client,
}

impl ObjectStore for S3ObjectStore {
    fn download_object(&self, bucket: &str, key: &str, destination: &Path) -> Result<(), String> {
        let bucket = bucket.to_string();
        let object_key = key.to_string();
        let client = self.s3_client.clone();

        let body = tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                let output = client
                    .get_object()
                    .bucket(bucket)
                    .key(object_key)
                    .send()
                    .await
                    .map_err(|error| {
                        format!(
                            "failed to read object from s3: {}",
                            DisplayErrorContext(&error)
                        )
                    })?;
                output
                    .body
                    .collect()
                    .await
                    .map(|data| data.into_bytes())
                    .map_err(|error| format!("failed to read object body from s3: {error}"))
            })
        })?;

        std::fs::write(destination, &body).map_err(|error| {
            format!(
                "failed to stage object at {}: {error}",
                destination.display()
            )
        })
    }

    fn write_object(&self, bucket: &str, key: &str, body: &[u8]) -> Result<(), String> {
        let bucket = bucket.to_string();
        let object_key = key.to_string();
        let body_bytes = body.to_vec();
        let client = self.s3_client.clone();

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                client
                    .put_object()
                    .bucket(bucket)
                    .key(object_key)
                    .body(ByteStream::from(body_bytes))
                    .send()
                    .await
                    .map(|_| ())
                    .map_err(|error| {
                        format!(
                            "failed to write object to s3: {}",
                            DisplayErrorContext(&error)
                        )
                    })
            })
        })
    }

    fn delete_object(&self, bucket: &str, key: &str) -> Result<DeleteAcknowledgement, String> {
        let bucket = bucket.to_string();
        let object_key = key.to_string();
        let client = self.s3_client.clone();

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                client
                    .delete_object()
                    .bucket(bucket)
                    .key(object_key)
                    .send()
                    .await
                    .map(|output| DeleteAcknowledgement {
                        delete_marker: output.delete_marker(),
                        version_id: output.version_id().map(str::to_string),
                    })
                    .map_err(|error| {
                        format!(
                            "failed to delete object from s3: {}",
                            DisplayErrorContext(&error)
                        )
                    })
            })
        })
    }
}

struct HttpsResponseSink {
    http_client: reqwest::Client,
}

impl ResponseSink for HttpsResponseSink {
    fn send_response(&self, response_url: &str, body: &[u8]) -> Result<(), String> {
        let url = response_url.to_string();
        let body_bytes = body.to_vec();
        let client = self.http_client.clone();

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                // The pre-signed URL is signed without a content type.
                client
                    .put(url)
                    .header(reqwest::header::CONTENT_TYPE, "")
                    .body(body_bytes)
                    .send()
                    .await
                    .and_then(|response| response.error_for_status())
                    .map(|_| ())
                    .map_err(|error| format!("failed to put response document: {error}"))
            })
        })
    }
}

struct RuntimeDependencies {
    config: RuntimeConfig,
    log_dispatch: tracing::Dispatch,
    store: S3ObjectStore,
    response_sink: HttpsResponseSink,
}

async fn handle_request(
    event: LambdaEvent<Value>,
    deps: &RuntimeDependencies,
) -> Result<Value, Error> {
    let (payload, context) = event.into_parts();
    let correlation = CorrelationContext {
        log_stream_name: context.env_config.log_stream.clone(),
        aws_request_id: context.request_id.clone(),
    };

    tracing::dispatcher::with_default(&deps.log_dispatch, || {
        let lifecycle_event: CustomResourceEvent = match serde_json::from_value(payload.clone()) {
            Ok(value) => value,
            Err(error) => {
                tracing::error!(event = "invalid_event", error = %error);
                if let Err(delivery_error) = deliver_rejected_event(
                    &deps.response_sink,
                    &payload,
                    &error.to_string(),
                    &correlation,
                ) {
                    tracing::error!(event = "response_delivery_failed", error = %delivery_error);
                }
                return Err(Error::from(format!(
                    "invalid custom resource event: {error}"
                )));
            }
        };

        let publisher = TemplatePublisher::new(&deps.store, &TeraRenderer, &deps.config.publisher);
        let response = handle_and_deliver(
            &publisher,
            &deps.response_sink,
            &lifecycle_event,
            &correlation,
        )
        .map_err(|error| Error::from(error.to_string()))?;

        serde_json::to_value(response).map_err(Error::from)
    })
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    let config = RuntimeConfig::from_env();
    let log_dispatch = build_dispatch(&config.log_level).map_err(Error::from)?;

    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let deps = RuntimeDependencies {
        config,
        log_dispatch,
        store: S3ObjectStore {
            s3_client: aws_sdk_s3::Client::new(&aws_config),
        },
        response_sink: HttpsResponseSink {
            http_client: reqwest::Client::new(),
        },
    };

    let deps = &deps;
    lambda_runtime::run(service_fn(move |event| async move {
        handle_request(event, deps).await
    }))
    .await
}
