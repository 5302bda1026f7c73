pub mod config;
pub mod domain;
pub mod grpc;
pub mod registry;
pub mod routes;
pub mod startup;
pub mod store;
pub mod telemetry;
