//! Identifier and credential allocation.
//!
//! Once the topology shape is frozen, a single pass assigns every server its
//! SID, display name and client port, and every link its port and password.

pub mod allocator;
pub mod registry;

pub use allocator::{allocate, generate_password, generate_sid, AllocationOptions};
pub use registry::UsedRegistry;
