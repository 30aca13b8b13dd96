use std::any::type_name;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use bytes::BytesMut;
use pktplan_wire::{
    get_raw, get_text, put_raw, put_text, ByteSource, CodecTable, ErasedCodec, Primitive,
    WireError,
};

use crate::error::{PlanError, Result};
use crate::packet::PacketType;
use crate::schema::{
    Condition, ErasedAccess, FieldAccess, FieldDecl, FieldInfo, PacketSchema, PrimitiveAccess,
    PropertyAccess,
};

type Gate<T> = Arc<dyn Fn(&T) -> bool + Send + Sync>;

enum Op<T> {
    Primitive(PrimitiveAccess<T>),
    Custom {
        access: Arc<dyn ErasedAccess<T>>,
        codec: Arc<dyn ErasedCodec>,
    },
}

struct Step<T> {
    name: &'static str,
    gate: Option<Gate<T>>,
    op: Op<T>,
}

impl<T> Step<T> {
    fn enabled(&self, packet: &T) -> bool {
        self.gate.as_ref().map_or(true, |gate| gate(packet))
    }

    fn write(&self, packet: &T, dst: &mut BytesMut) -> pktplan_wire::Result<()> {
        match &self.op {
            Op::Primitive(access) => match access {
                PrimitiveAccess::I32(get, _) => get(packet).put(dst),
                PrimitiveAccess::I16(get, _) => get(packet).put(dst),
                PrimitiveAccess::U16(get, _) => get(packet).put(dst),
                PrimitiveAccess::U8(get, _) => get(packet).put(dst),
                PrimitiveAccess::Bool(get, _) => get(packet).put(dst),
                PrimitiveAccess::Text(get, _) => put_text(get(packet), dst)?,
                PrimitiveAccess::RawTail(get, _) => put_raw(get(packet), dst),
            },
            Op::Custom { access, codec } => codec.write_any(access.get(packet), dst)?,
        }
        Ok(())
    }

    fn read(&self, packet: &mut T, src: &mut ByteSource) -> pktplan_wire::Result<()> {
        match &self.op {
            Op::Primitive(access) => match access {
                PrimitiveAccess::I32(_, set) => set(packet, i32::get(src)?),
                PrimitiveAccess::I16(_, set) => set(packet, i16::get(src)?),
                PrimitiveAccess::U16(_, set) => set(packet, u16::get(src)?),
                PrimitiveAccess::U8(_, set) => set(packet, u8::get(src)?),
                PrimitiveAccess::Bool(_, set) => set(packet, bool::get(src)?),
                PrimitiveAccess::Text(_, set) => set(packet, get_text(src)?),
                PrimitiveAccess::RawTail(_, set) => set(packet, get_raw(src)),
            },
            Op::Custom { access, codec } => access.set(packet, codec.read_any(src)?)?,
        }
        Ok(())
    }
}

/// Compiled, immutable read/write procedure for one packet type.
pub struct TypePlan<T> {
    packet: &'static str,
    steps: Vec<Step<T>>,
    fields: Vec<FieldInfo>,
}

impl<T: 'static> TypePlan<T> {
    /// Compile `schema` against the registered custom codecs.
    ///
    /// Every condition and custom codec is resolved here; a plan that
    /// compiles cannot fail for a lookup reason while encoding.
    pub fn compile(schema: PacketSchema<T>, codecs: &CodecTable) -> Result<Self> {
        let packet = type_name::<T>();

        if schema.dangling_condition {
            return Err(PlanError::DanglingCondition { packet });
        }

        let mut seen = HashSet::new();
        let names = schema
            .fields
            .iter()
            .map(|f| f.name)
            .chain(schema.properties.iter().map(|p| p.name));
        for name in names {
            if !seen.insert(name) {
                return Err(PlanError::DuplicateName { packet, name });
            }
        }

        let fields: Vec<FieldInfo> = schema.fields.iter().map(FieldDecl::info).collect();
        let last = schema.fields.len().saturating_sub(1);

        let mut gates = Vec::with_capacity(schema.fields.len());
        for (index, decl) in schema.fields.iter().enumerate() {
            if matches!(&decl.access, FieldAccess::Primitive(PrimitiveAccess::RawTail(..)))
                && index != last
            {
                return Err(PlanError::RawTailNotLast {
                    packet,
                    field: decl.name,
                });
            }
            let gate = match decl.condition {
                Some(condition) => Some(resolve_gate(&schema, packet, index, condition)?),
                None => None,
            };
            gates.push(gate);
        }

        let mut steps = Vec::with_capacity(schema.fields.len());
        for (decl, gate) in schema.fields.into_iter().zip(gates) {
            let op = match decl.access {
                FieldAccess::Primitive(access) => Op::Primitive(access),
                FieldAccess::Custom(access) => {
                    let codec = codecs.get(access.value_type_id()).ok_or_else(|| {
                        PlanError::MissingCodec {
                            packet,
                            field: decl.name,
                            value_type: access.value_type(),
                        }
                    })?;
                    Op::Custom { access, codec }
                }
            };
            steps.push(Step {
                name: decl.name,
                gate,
                op,
            });
        }

        tracing::trace!(packet, steps = steps.len(), "compiled type plan");
        Ok(Self {
            packet,
            steps,
            fields,
        })
    }

    /// Name of the packet type this plan encodes.
    pub fn packet_name(&self) -> &'static str {
        self.packet
    }

    /// Field declarations, in wire order.
    pub fn fields(&self) -> &[FieldInfo] {
        &self.fields
    }

    /// Append the body of `packet` to `dst`, skipping gated-off fields.
    pub fn write(&self, packet: &T, dst: &mut BytesMut) -> Result<()> {
        for step in &self.steps {
            if !step.enabled(packet) {
                continue;
            }
            step.write(packet, dst).map_err(|err| self.field_error(step, err))?;
        }
        Ok(())
    }

    /// Fill `packet` from `src`, in declaration order.
    ///
    /// Conditions see the fields already read; compilation guarantees a
    /// gate only references earlier fields.
    pub fn read(&self, packet: &mut T, src: &mut ByteSource) -> Result<()> {
        for step in &self.steps {
            if !step.enabled(packet) {
                continue;
            }
            step.read(packet, src).map_err(|err| self.field_error(step, err))?;
        }
        Ok(())
    }

    /// Size of the body `packet` encodes to.
    pub fn encoded_len(&self, packet: &T) -> Result<usize> {
        let mut scratch = BytesMut::new();
        self.write(packet, &mut scratch)?;
        Ok(scratch.len())
    }

    fn field_error(&self, step: &Step<T>, source: WireError) -> PlanError {
        PlanError::Field {
            packet: self.packet,
            field: step.name,
            source,
        }
    }
}

impl<T: PacketType> TypePlan<T> {
    /// Compile the plan for a catalogue type from its declared schema.
    pub fn for_type(codecs: &CodecTable) -> Result<Self> {
        Self::compile(T::schema(), codecs)
    }

    /// Decode a fresh `T` from `src`.
    pub fn decode(&self, src: &mut ByteSource) -> Result<T> {
        let mut packet = T::default();
        self.read(&mut packet, src)?;
        Ok(packet)
    }
}

impl<T> fmt::Debug for TypePlan<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypePlan")
            .field("packet", &self.packet)
            .field("fields", &self.fields)
            .finish()
    }
}

fn resolve_gate<T: 'static>(
    schema: &PacketSchema<T>,
    packet: &'static str,
    index: usize,
    condition: Condition,
) -> Result<Gate<T>> {
    let field = schema.fields[index].name;
    let target = condition.target();
    if target == field {
        return Err(PlanError::SelfCondition { packet, field });
    }

    let mismatch = |expected: &'static str| PlanError::ConditionTargetMismatch {
        packet,
        field,
        target,
        expected,
    };

    if let Condition::Bit { bit, .. } = condition {
        if bit > 7 {
            return Err(PlanError::BitOutOfRange { packet, field, bit });
        }
    }

    if let Some(position) = schema.fields.iter().position(|f| f.name == target) {
        // Decode evaluates gates against fields already read.
        if position > index {
            return Err(PlanError::ForwardCondition {
                packet,
                field,
                target,
            });
        }
        let decl = &schema.fields[position];
        return match (condition, &decl.access) {
            (Condition::Bit { bit, .. }, FieldAccess::Primitive(PrimitiveAccess::U8(get, _))) => {
                let get = *get;
                Ok(Arc::new(move |p: &T| get(p) & (1 << bit) != 0))
            }
            (Condition::Flag { .. }, FieldAccess::Primitive(PrimitiveAccess::Bool(get, _))) => {
                let get = *get;
                Ok(Arc::new(move |p: &T| get(p)))
            }
            (Condition::Bit { .. }, _) => Err(mismatch("u8 flags field")),
            (Condition::Flag { .. }, _) => Err(mismatch("bool field")),
        };
    }

    if let Some(property) = schema.properties.iter().find(|p| p.name == target) {
        return match (condition, &property.access) {
            (Condition::Bit { bit, .. }, PropertyAccess::Bits(read)) => {
                let read = *read;
                Ok(Arc::new(move |p: &T| read(p) & (1 << bit) != 0))
            }
            (Condition::Flag { .. }, PropertyAccess::Flag(read)) => {
                let read = *read;
                Ok(Arc::new(move |p: &T| read(p)))
            }
            (Condition::Bit { .. }, PropertyAccess::Flag(_)) => Err(mismatch("bits property")),
            (Condition::Flag { .. }, PropertyAccess::Bits(_)) => Err(mismatch("flag property")),
        };
    }

    Err(PlanError::UnresolvedCondition {
        packet,
        field,
        target,
    })
}
