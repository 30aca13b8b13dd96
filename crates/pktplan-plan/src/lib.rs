//! Packet schemas and compiled per-type read/write plans.
//!
//! A packet type declares its fields once, in wire order, through a
//! [`PacketSchema`]. [`TypePlan::compile`] resolves every condition and
//! custom codec up front and produces an immutable plan; encoding and
//! decoding afterwards is a straight walk over the compiled steps.

pub mod error;
pub mod packet;
pub mod plan;
pub mod schema;

pub use error::{PlanError, Result};
pub use packet::{Discriminator, Packet, PacketType};
pub use plan::TypePlan;
pub use schema::{Condition, FieldInfo, FieldKind, PacketSchema};
