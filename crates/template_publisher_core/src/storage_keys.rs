pub const DEFAULT_STORAGE_DOMAIN: &str = "s3.amazonaws.com";

/// Unique trailing segment of a stack identifier, e.g. the GUID at the end of
/// `arn:aws:cloudformation:<region>:<account>:stack/<name>/<guid>`.
pub fn stack_guid(stack_id: &str) -> &str {
    stack_id.rsplit('/').next().unwrap_or(stack_id)
}

/// `<prefix><logical_resource_id>-<stack_guid><suffix>`
///
/// `suffix` is the already dot-prefixed extension, or empty for none.
pub fn destination_object_key(
    key_prefix: &str,
    logical_resource_id: &str,
    stack_id: &str,
    suffix: &str,
) -> String {
    format!(
        "{key_prefix}{logical_resource_id}-{}{suffix}",
        stack_guid(stack_id)
    )
}

pub fn public_object_url(storage_domain: &str, bucket: &str, key: &str) -> String {
    format!("https://{bucket}.{storage_domain}/{key}")
}

pub fn object_uri(bucket: &str, key: &str) -> String {
    format!("s3://{bucket}/{key}")
}
