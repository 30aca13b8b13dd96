use pktplan_frame::FrameError;
use pktplan_plan::{Discriminator, PlanError};
use pktplan_wire::WireError;

/// Why one packet type or codec was left out of a registry.
#[derive(Debug, thiserror::Error)]
pub enum RegistrationError {
    /// The type's schema did not compile.
    #[error(transparent)]
    Plan(#[from] PlanError),

    /// Another type already owns the discriminator. The first one is kept.
    #[error("{discriminator} is already taken by {existing}; {rejected} was not registered")]
    DuplicateDiscriminator {
        discriminator: Discriminator,
        existing: &'static str,
        rejected: &'static str,
    },

    /// The same type was registered twice.
    #[error("{0} is registered more than once")]
    DuplicateType(&'static str),

    /// A top-level message claims the outer id reserved for module packets.
    #[error("{packet}: message id {id} is reserved for module packets")]
    ReservedMessageId { packet: &'static str, id: u8 },

    /// A custom codec could not be added to the codec table.
    #[error("custom codec rejected: {0}")]
    Codec(#[from] WireError),
}

/// Returned by `RegistryBuilder::build_strict` when anything was rejected.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("{} registration(s) rejected: {}", .0.len(), summarize(.0))]
    Rejected(Vec<RegistrationError>),
}

fn summarize(errors: &[RegistrationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Errors from serializing or deserializing a packet.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// No plan exists for the packet's concrete type.
    #[error("packet type {0} is not registered")]
    Unregistered(&'static str),

    #[error(transparent)]
    Frame(#[from] FrameError),

    #[error(transparent)]
    Plan(#[from] PlanError),

    /// Body bytes were left after the last field (strict mode only).
    #[error("{packet}: {remaining} unread bytes after the last field")]
    TrailingBytes {
        packet: &'static str,
        remaining: usize,
    },
}

pub type Result<T> = std::result::Result<T, CodecError>;
