//! Packet type registry and envelope dispatch.
//!
//! A [`RegistryBuilder`] collects custom codecs and packet types, then
//! compiles one plan per type and freezes the dispatch tables into a
//! [`PacketRegistry`]. After that, serializing looks the encoder up by the
//! packet's concrete type, and deserializing reads the outer message id
//! (and, for the multiplexed id, the module id) to pick the decoder.
//!
//! Packet types that fail to compile are left out and reported through
//! [`PacketRegistry::rejected`]; the rest of the catalogue stays usable.

pub mod config;
pub mod error;
pub mod registry;

pub use config::RegistryConfig;
pub use error::{CodecError, RegistrationError, RegistryError, Result};
pub use registry::{Catalogue, Decoded, PacketRegistry, RegisteredType, RegistryBuilder};
