pub mod object_store;
pub mod response;
