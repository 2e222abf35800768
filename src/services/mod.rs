pub mod client;
pub mod credential;
pub mod provider;
pub mod registry;
pub mod request;
pub mod rotation;
pub mod rotation_types;
pub mod schema;
pub mod session;
pub mod store;
