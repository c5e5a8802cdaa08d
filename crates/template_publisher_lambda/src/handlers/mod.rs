pub mod envelope;
pub mod publisher;
