use pktplan_wire::WireError;

/// Errors raised while compiling or running a type plan.
///
/// Every variant names the packet type, and the field where one is involved.
#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    /// Two fields or properties share a name.
    #[error("{packet}: duplicate field or property name `{name}`")]
    DuplicateName { packet: &'static str, name: &'static str },

    /// A condition names a field or property that does not exist.
    #[error("{packet}.{field}: condition references unknown field `{target}`")]
    UnresolvedCondition {
        packet: &'static str,
        field: &'static str,
        target: &'static str,
    },

    /// A condition target has the wrong shape for its condition form.
    #[error("{packet}.{field}: condition target `{target}` is not a {expected}")]
    ConditionTargetMismatch {
        packet: &'static str,
        field: &'static str,
        target: &'static str,
        expected: &'static str,
    },

    /// A condition names a field declared after the field it gates.
    #[error("{packet}.{field}: condition references later field `{target}`")]
    ForwardCondition {
        packet: &'static str,
        field: &'static str,
        target: &'static str,
    },

    /// A field is gated on its own value.
    #[error("{packet}.{field}: a field cannot gate itself")]
    SelfCondition {
        packet: &'static str,
        field: &'static str,
    },

    /// A bit condition names a bit outside a flags byte.
    #[error("{packet}.{field}: bit {bit} is out of range for a flags byte")]
    BitOutOfRange {
        packet: &'static str,
        field: &'static str,
        bit: u8,
    },

    /// A custom field type has no registered codec.
    #[error("{packet}.{field}: no custom codec registered for {value_type}")]
    MissingCodec {
        packet: &'static str,
        field: &'static str,
        value_type: &'static str,
    },

    /// A raw tail field is followed by another field.
    #[error("{packet}.{field}: raw tail field must be the last declared field")]
    RawTailNotLast {
        packet: &'static str,
        field: &'static str,
    },

    /// `when` was called before any field was declared.
    #[error("{packet}: condition declared before any field")]
    DanglingCondition { packet: &'static str },

    /// Reading or writing one field failed.
    #[error("{packet}.{field}: {source}")]
    Field {
        packet: &'static str,
        field: &'static str,
        source: WireError,
    },
}

pub type Result<T> = std::result::Result<T, PlanError>;
