use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use template_publisher_core::contract::{CustomResourceEvent, PublishOutcome, PublishOutput};
use template_publisher_core::properties::{
    validate_event, DestinationObject, PropertyError, PropertyWarning, PublishPlan,
    TemplateSource,
};
use template_publisher_core::render::{decode_template, RenderError, TemplateRenderer};
use template_publisher_core::storage_keys::{object_uri, public_object_url};
use template_publisher_core::variables::TemplateVariables;
use thiserror::Error;

use crate::adapters::object_store::ObjectStore;
use crate::config::PublisherConfig;

const STAGED_TEMPLATE_NAME: &str = "template.j2";

#[derive(Debug, Error)]
pub enum PublisherError {
    #[error("invalid resource properties: {0}")]
    Validation(#[from] PropertyError),
    #[error("failed to {operation} s3://{bucket}/{key}: {message}")]
    Storage {
        operation: &'static str,
        bucket: String,
        key: String,
        message: String,
    },
    #[error("scratch storage error: {0}")]
    Scratch(#[from] std::io::Error),
    #[error(transparent)]
    Render(#[from] RenderError),
}

impl PublisherError {
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    fn storage(operation: &'static str, bucket: &str, key: &str, message: String) -> Self {
        Self::Storage {
            operation,
            bucket: bucket.to_string(),
            key: key.to_string(),
            message,
        }
    }
}

/// Renders a template from object storage and publishes the result, or
/// removes a previously published object on Delete.
pub struct TemplatePublisher<'a> {
    store: &'a dyn ObjectStore,
    renderer: &'a dyn TemplateRenderer,
    config: &'a PublisherConfig,
}

impl<'a> TemplatePublisher<'a> {
    pub fn new(
        store: &'a dyn ObjectStore,
        renderer: &'a dyn TemplateRenderer,
        config: &'a PublisherConfig,
    ) -> Self {
        Self {
            store,
            renderer,
            config,
        }
    }

    /// Validation failures are returned before any storage call is made.
    pub fn handle(&self, event: &CustomResourceEvent) -> Result<PublishOutcome, PublisherError> {
        let span = tracing::info_span!(
            "template_publisher",
            request_type = event.request_type.as_str(),
            logical_resource_id = %event.logical_resource_id,
            stack_id = %event.stack_id
        );
        let _entered = span.enter();

        let validated = match validate_event(event) {
            Ok(value) => value,
            Err(error) => {
                tracing::error!(
                    event = "validation_failed",
                    field = error.field(),
                    error = %error,
                    "resource properties rejected"
                );
                return Err(error.into());
            }
        };
        log_warnings(&validated.warnings);

        match validated.plan {
            PublishPlan::Delete { destination } => self.delete(destination),
            PublishPlan::Render {
                destination,
                source,
                variables,
            } => self.publish(destination, &source, &variables),
        }
    }

    fn delete(&self, destination: DestinationObject) -> Result<PublishOutcome, PublisherError> {
        let uri = destination.uri();
        tracing::info!(event = "deleting_object", uri = %uri);

        let acknowledgement = self
            .store
            .delete_object(&destination.bucket, &destination.key)
            .map_err(|message| {
                PublisherError::storage("delete", &destination.bucket, &destination.key, message)
            })?;

        Ok(PublishOutcome::Deleted {
            physical_resource_id: uri,
            acknowledgement,
        })
    }

    fn publish(
        &self,
        destination: DestinationObject,
        source: &TemplateSource,
        variables: &TemplateVariables,
    ) -> Result<PublishOutcome, PublisherError> {
        let scratch = ScratchSpace::create(&self.config.scratch_dir)?;
        let staged_path = scratch.template_path();

        tracing::info!(
            event = "fetching_template",
            uri = %object_uri(&source.bucket, &source.key)
        );
        self.store
            .download_object(&source.bucket, &source.key, &staged_path)
            .map_err(|message| {
                PublisherError::storage("download", &source.bucket, &source.key, message)
            })?;
        let template = decode_template(fs::read(&staged_path)?)?;

        tracing::info!(
            event = "rendering_template",
            variables = variables.len(),
            template_bytes = template.len()
        );
        let rendered = self.renderer.render(&template, variables)?;

        let uri = destination.uri();
        tracing::info!(
            event = "uploading_rendered_object",
            uri = %uri,
            rendered_bytes = rendered.len()
        );
        self.store
            .write_object(&destination.bucket, &destination.key, rendered.as_bytes())
            .map_err(|message| {
                PublisherError::storage("upload", &destination.bucket, &destination.key, message)
            })?;

        let template_s3_url = public_object_url(
            &self.config.storage_domain,
            &destination.bucket,
            &destination.key,
        );
        tracing::info!(event = "template_published", template_s3_url = %template_s3_url);

        Ok(PublishOutcome::Published {
            physical_resource_id: uri,
            output: PublishOutput { template_s3_url },
        })
    }
}

fn log_warnings(warnings: &[PropertyWarning]) {
    for warning in warnings {
        match warning {
            PropertyWarning::CommaListOverridesLiteral { name } => tracing::warn!(
                event = "comma_list_overrides_literal",
                name = %name,
                "CommaLists value replaces the HarnessLiterals value of the same name"
            ),
            PropertyWarning::SuffixIgnored { reason } => tracing::warn!(
                event = "suffix_ignored",
                reason = *reason,
                "publishing without a file extension"
            ),
            PropertyWarning::NoCommaLists => tracing::info!(
                event = "no_comma_lists",
                "no CommaLists supplied; only HarnessLiterals are available to the template"
            ),
        }
    }
}

/// Per-invocation directory under the configured scratch root, removed on drop.
struct ScratchSpace {
    dir: TempDir,
}

impl ScratchSpace {
    fn create(root: &Path) -> Result<Self, std::io::Error> {
        let dir = tempfile::Builder::new()
            .prefix("template-publisher-")
            .tempdir_in(root)?;
        Ok(Self { dir })
    }

    fn template_path(&self) -> PathBuf {
        self.dir.path().join(STAGED_TEMPLATE_NAME)
    }
}
