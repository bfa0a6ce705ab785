pub mod credential_service;
pub mod resource_service;
pub mod connection_service;
