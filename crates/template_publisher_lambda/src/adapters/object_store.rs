use std::path::Path;

use template_publisher_core::contract::DeleteAcknowledgement;

/// Blob store addressed by bucket and key.
///
/// Deleting a key that does not exist must succeed.
pub trait ObjectStore {
    /// Writes the object's bytes to `destination`, replacing any existing file.
    fn download_object(&self, bucket: &str, key: &str, destination: &Path) -> Result<(), String>;

    fn write_object(&self, bucket: &str, key: &str, body: &[u8]) -> Result<(), String>;

    fn delete_object(&self, bucket: &str, key: &str) -> Result<DeleteAcknowledgement, String>;
}
