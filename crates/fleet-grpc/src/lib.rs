//! fleet-grpc — gRPC surface for the fleet registry.
//!
//! Thin adapter over `fleet-registry`: maps `FleetManager` RPCs onto
//! store operations, core errors onto transport status codes
//! (`AlreadyExists` → `ALREADY_EXISTS`, `NotFound` → `NOT_FOUND`), and
//! internal records onto wire messages with epoch-seconds timestamps.
//! No correctness logic lives here.

pub mod server;

/// Generated protobuf types and gRPC service stubs.
pub mod proto {
    tonic::include_proto!("fleet.v1");
}

pub use server::FleetServer;
