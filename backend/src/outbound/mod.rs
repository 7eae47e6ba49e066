//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **persistence**: PostgreSQL repositories using Diesel
//! - **cache**: revocation list backed by Redis or process memory
//! - **token**: HS256 session token codec
//! - **calculation**: HTTP hand-off to the power calculation service
//!
//! Adapters translate between domain types and infrastructure
//! representations. They contain no business rules.

pub mod cache;
pub mod calculation;
pub mod persistence;
pub mod token;
