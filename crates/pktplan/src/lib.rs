//! Declarative binary packet codecs with two-level id dispatch.
//!
//! A packet type lists its fields once, in wire order, and gets a compiled
//! read/write plan. A registry maps outer message ids (and, under one
//! reserved id, module ids) to those plans and frames every packet with a
//! 2-byte length prefix.
//!
//! # Crate Structure
//!
//! - [`wire`]: primitive encodings and pluggable custom codecs
//! - [`plan`]: packet traits, field schemas and compiled type plans
//! - [`frame`]: length-prefixed envelopes and stream adapters
//! - [`registry`]: dispatch tables and `serialize`/`deserialize`
//! - [`demo`]: a small sample catalogue

/// Re-export wire types.
pub mod wire {
    pub use pktplan_wire::*;
}

/// Re-export plan types.
pub mod plan {
    pub use pktplan_plan::*;
}

/// Re-export frame types.
pub mod frame {
    pub use pktplan_frame::*;
}

/// Re-export registry types.
pub mod registry {
    pub use pktplan_registry::*;
}

pub mod demo;

pub use pktplan_plan::{Condition, Discriminator, Packet, PacketSchema, PacketType};
pub use pktplan_registry::{Catalogue, Decoded, PacketRegistry, RegistryBuilder, RegistryConfig};
