use std::any::{type_name, Any};
use std::fmt;

use crate::schema::PacketSchema;

/// The intrinsic identifier of a packet type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Discriminator {
    /// Top-level packet selected by its outer message identifier.
    Message(u8),
    /// Sub-packet of the multiplexed family, selected by module identifier.
    Module(u16),
}

impl Discriminator {
    pub fn is_module(self) -> bool {
        matches!(self, Discriminator::Module(_))
    }
}

impl fmt::Display for Discriminator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Discriminator::Message(id) => write!(f, "message {id}"),
            Discriminator::Module(id) => write!(f, "module {id}"),
        }
    }
}

/// A concrete packet type in a catalogue.
///
/// Decoding starts from `Default::default()`, so fields gated off on the
/// wire keep their default value.
pub trait PacketType: Default + fmt::Debug + Send + Sync + 'static {
    /// Fixed for the type; never changes per instance.
    const DISCRIMINATOR: Discriminator;

    /// Field declarations in wire order.
    fn schema() -> PacketSchema<Self>;
}

/// Object-safe view of any packet value.
pub trait Packet: Any + fmt::Debug + Send + Sync {
    fn discriminator(&self) -> Discriminator;

    fn type_name(&self) -> &'static str;

    fn as_any(&self) -> &dyn Any;

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send + Sync>;
}

impl<T: PacketType> Packet for T {
    fn discriminator(&self) -> Discriminator {
        T::DISCRIMINATOR
    }

    fn type_name(&self) -> &'static str {
        type_name::<T>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send + Sync> {
        self
    }
}

impl dyn Packet {
    /// True if the packet is a `T`.
    pub fn is<T: PacketType>(&self) -> bool {
        self.as_any().is::<T>()
    }

    pub fn downcast_ref<T: PacketType>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    /// Take ownership of the concrete packet, or `None` if it is not a `T`.
    pub fn downcast<T: PacketType>(self: Box<Self>) -> Option<Box<T>> {
        self.into_any().downcast::<T>().ok()
    }
}
