use std::any::{type_name, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::io::{Read, Write};
use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use pktplan_frame::{encode_frame, split_frame, FrameHeader, FrameReader, FrameWriter, RawFrame};
use pktplan_plan::{Discriminator, FieldInfo, Packet, PacketType, PlanError, TypePlan};
use pktplan_wire::{ByteSource, CodecTable, CustomCodec, WireError};

use crate::config::RegistryConfig;
use crate::error::{CodecError, RegistrationError, RegistryError, Result};

/// A set of packet types (and the codecs they need) installed together.
pub trait Catalogue {
    fn install(&self, builder: RegistryBuilder) -> RegistryBuilder;
}

/// Compiled plan for one type, with the packet type erased.
trait ErasedPlan: Send + Sync {
    fn name(&self) -> &'static str;

    fn discriminator(&self) -> Discriminator;

    fn fields(&self) -> &[FieldInfo];

    fn write(&self, packet: &dyn Packet, dst: &mut BytesMut) -> pktplan_plan::Result<()>;

    fn decode(&self, src: &mut ByteSource) -> pktplan_plan::Result<Box<dyn Packet>>;
}

impl<T: PacketType> ErasedPlan for TypePlan<T> {
    fn name(&self) -> &'static str {
        self.packet_name()
    }

    fn discriminator(&self) -> Discriminator {
        T::DISCRIMINATOR
    }

    fn fields(&self) -> &[FieldInfo] {
        TypePlan::fields(self)
    }

    fn write(&self, packet: &dyn Packet, dst: &mut BytesMut) -> pktplan_plan::Result<()> {
        let packet = packet
            .as_any()
            .downcast_ref::<T>()
            .ok_or_else(|| PlanError::Field {
                packet: self.packet_name(),
                field: "<packet>",
                source: WireError::TypeMismatch {
                    expected: type_name::<T>(),
                },
            })?;
        TypePlan::write(self, packet, dst)
    }

    fn decode(&self, src: &mut ByteSource) -> pktplan_plan::Result<Box<dyn Packet>> {
        Ok(Box::new(TypePlan::decode(self, src)?))
    }
}

type CompileFn = fn(&CodecTable) -> pktplan_plan::Result<Arc<dyn ErasedPlan>>;

fn compile_plan<T: PacketType>(
    codecs: &CodecTable,
) -> pktplan_plan::Result<Arc<dyn ErasedPlan>> {
    Ok(Arc::new(TypePlan::<T>::for_type(codecs)?))
}

struct Pending {
    type_id: TypeId,
    name: &'static str,
    discriminator: Discriminator,
    compile: CompileFn,
}

/// Collects codecs and packet types, then freezes them into a registry.
///
/// Nothing is compiled until [`build`](Self::build), so codecs and packet
/// types can be added in any order.
pub struct RegistryBuilder {
    config: RegistryConfig,
    codecs: CodecTable,
    pending: Vec<Pending>,
    errors: Vec<RegistrationError>,
}

impl RegistryBuilder {
    /// Create an empty builder with default config.
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Create an empty builder with explicit config.
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            config,
            codecs: CodecTable::new(),
            pending: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Add the codec for custom field type `C::Value`.
    pub fn codec<C: CustomCodec>(mut self, codec: C) -> Self {
        if let Err(err) = self.codecs.register(codec) {
            self.errors.push(RegistrationError::Codec(err));
        }
        self
    }

    /// Add packet type `T`.
    pub fn packet<T: PacketType>(mut self) -> Self {
        self.pending.push(Pending {
            type_id: TypeId::of::<T>(),
            name: type_name::<T>(),
            discriminator: T::DISCRIMINATOR,
            compile: compile_plan::<T>,
        });
        self
    }

    /// Add everything `catalogue` provides.
    pub fn catalogue(self, catalogue: &impl Catalogue) -> Self {
        catalogue.install(self)
    }

    /// Compile every type and build the dispatch tables.
    ///
    /// A type that fails is logged and recorded in
    /// [`PacketRegistry::rejected`]; the remaining types are unaffected.
    pub fn build(self) -> PacketRegistry {
        let RegistryBuilder {
            config,
            codecs,
            pending,
            mut errors,
        } = self;
        let multiplexed_id = config.multiplexed_id();

        let mut encoders: HashMap<TypeId, Arc<dyn ErasedPlan>> = HashMap::new();
        let mut messages: HashMap<u8, Arc<dyn ErasedPlan>> = HashMap::new();
        let mut modules: HashMap<u16, Arc<dyn ErasedPlan>> = HashMap::new();

        for entry in pending {
            if encoders.contains_key(&entry.type_id) {
                errors.push(RegistrationError::DuplicateType(entry.name));
                continue;
            }

            let existing = match entry.discriminator {
                Discriminator::Message(id) if id == multiplexed_id => {
                    errors.push(RegistrationError::ReservedMessageId {
                        packet: entry.name,
                        id,
                    });
                    continue;
                }
                Discriminator::Message(id) => messages.get(&id),
                Discriminator::Module(id) => modules.get(&id),
            };
            if let Some(existing) = existing {
                errors.push(RegistrationError::DuplicateDiscriminator {
                    discriminator: entry.discriminator,
                    existing: existing.name(),
                    rejected: entry.name,
                });
                continue;
            }

            let plan = match (entry.compile)(&codecs) {
                Ok(plan) => plan,
                Err(err) => {
                    errors.push(RegistrationError::Plan(err));
                    continue;
                }
            };

            match entry.discriminator {
                Discriminator::Message(id) => messages.insert(id, Arc::clone(&plan)),
                Discriminator::Module(id) => modules.insert(id, Arc::clone(&plan)),
            };
            encoders.insert(entry.type_id, plan);
            tracing::debug!(
                packet = entry.name,
                discriminator = %entry.discriminator,
                "registered packet type"
            );
        }

        for err in &errors {
            tracing::warn!(error = %err, "packet registration rejected");
        }

        PacketRegistry {
            config,
            encoders,
            messages,
            modules,
            rejected: errors,
        }
    }

    /// Like [`build`](Self::build), but any rejection fails the whole build.
    pub fn build_strict(self) -> std::result::Result<PacketRegistry, RegistryError> {
        let mut registry = self.build();
        if registry.rejected.is_empty() {
            Ok(registry)
        } else {
            Err(RegistryError::Rejected(std::mem::take(&mut registry.rejected)))
        }
    }
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Description of one registered packet type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredType {
    pub name: &'static str,
    pub discriminator: Discriminator,
    pub fields: Vec<FieldInfo>,
}

/// Outcome of decoding one frame.
#[derive(Debug)]
pub enum Decoded {
    Packet(Box<dyn Packet>),
    /// No type is registered for this outer message id. The frame was skipped.
    UnknownMessage(u8),
    /// No type is registered for this module id. The frame was skipped.
    UnknownModule(u16),
}

impl Decoded {
    pub fn packet(&self) -> Option<&(dyn Packet + 'static)> {
        match self {
            Decoded::Packet(packet) => Some(packet.as_ref()),
            _ => None,
        }
    }

    pub fn into_packet(self) -> Option<Box<dyn Packet>> {
        match self {
            Decoded::Packet(packet) => Some(packet),
            _ => None,
        }
    }
}

/// Immutable dispatch tables for a packet catalogue.
///
/// Safe to share between threads; every call is independent.
pub struct PacketRegistry {
    config: RegistryConfig,
    encoders: HashMap<TypeId, Arc<dyn ErasedPlan>>,
    messages: HashMap<u8, Arc<dyn ErasedPlan>>,
    modules: HashMap<u16, Arc<dyn ErasedPlan>>,
    rejected: Vec<RegistrationError>,
}

impl PacketRegistry {
    /// Start building a registry with default config.
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Get registry configuration.
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Registrations left out when the registry was built.
    pub fn rejected(&self) -> &[RegistrationError] {
        &self.rejected
    }

    pub fn is_registered<T: PacketType>(&self) -> bool {
        self.encoders.contains_key(&TypeId::of::<T>())
    }

    pub fn len(&self) -> usize {
        self.encoders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.encoders.is_empty()
    }

    /// Registered types, ordered by discriminator.
    pub fn registered(&self) -> Vec<RegisteredType> {
        let mut types: Vec<RegisteredType> = self
            .encoders
            .values()
            .map(|plan| RegisteredType {
                name: plan.name(),
                discriminator: plan.discriminator(),
                fields: plan.fields().to_vec(),
            })
            .collect();
        types.sort_by_key(|t| t.discriminator);
        types
    }

    /// Append the framed encoding of `packet` to `dst`.
    ///
    /// On error nothing is left in `dst`. Returns the frame size.
    pub fn serialize_into(&self, packet: &dyn Packet, dst: &mut BytesMut) -> Result<usize> {
        let plan = self
            .encoders
            .get(&packet.as_any().type_id())
            .ok_or(CodecError::Unregistered(packet.type_name()))?;
        let header = self.header(plan.discriminator());

        encode_frame(header, &self.config.frame, dst, |body: &mut BytesMut| {
            plan.write(packet, body).map_err(CodecError::from)
        })
    }

    /// Encode `packet` into a new frame.
    pub fn try_serialize(&self, packet: &dyn Packet) -> Result<Bytes> {
        let mut buf = BytesMut::new();
        self.serialize_into(packet, &mut buf)?;
        Ok(buf.freeze())
    }

    /// Encode `packet` into a new frame, or return empty bytes on failure.
    ///
    /// The failure is logged; use [`try_serialize`](Self::try_serialize) to
    /// handle it instead.
    pub fn serialize(&self, packet: &dyn Packet) -> Bytes {
        match self.try_serialize(packet) {
            Ok(bytes) => bytes,
            Err(err) => {
                tracing::warn!(packet = packet.type_name(), error = %err, "serialize failed");
                Bytes::new()
            }
        }
    }

    /// Decode the next frame from `src`, consuming exactly its length.
    ///
    /// Bytes after the frame stay in `src`. Frames with unknown ids are
    /// consumed and reported as [`Decoded::UnknownMessage`] or
    /// [`Decoded::UnknownModule`].
    pub fn deserialize(&self, src: &mut Bytes) -> Result<Decoded> {
        let frame = split_frame(src, &self.config.frame)?;
        self.decode_frame(frame)
    }

    /// Decode a frame that was already cut from the stream.
    pub fn decode_frame(&self, frame: RawFrame) -> Result<Decoded> {
        let plan = match frame.header.module_id {
            Some(module_id) => match self.modules.get(&module_id) {
                Some(plan) => plan,
                None => {
                    tracing::warn!(module_id, "skipping frame with unknown module id");
                    return Ok(Decoded::UnknownModule(module_id));
                }
            },
            None => match self.messages.get(&frame.header.message_id) {
                Some(plan) => plan,
                None => {
                    tracing::warn!(
                        message_id = frame.header.message_id,
                        "skipping frame with unknown message id"
                    );
                    return Ok(Decoded::UnknownMessage(frame.header.message_id));
                }
            },
        };

        let mut src = ByteSource::new(frame.body);
        let packet = plan.decode(&mut src)?;

        if !src.is_empty() {
            if self.config.strict_trailing_bytes {
                return Err(CodecError::TrailingBytes {
                    packet: plan.name(),
                    remaining: src.remaining(),
                });
            }
            tracing::debug!(
                packet = plan.name(),
                remaining = src.remaining(),
                "ignoring trailing body bytes"
            );
        }

        Ok(Decoded::Packet(packet))
    }

    /// Frame reader using this registry's envelope layout.
    pub fn reader<R: Read>(&self, inner: R) -> FrameReader<R> {
        FrameReader::with_config(inner, self.config.frame.clone())
    }

    /// Frame writer using this registry's envelope layout.
    pub fn writer<W: Write>(&self, inner: W) -> FrameWriter<W> {
        FrameWriter::with_config(inner, self.config.frame.clone())
    }

    /// Read and decode the next frame from a blocking stream.
    pub fn read_packet<R: Read>(&self, reader: &mut FrameReader<R>) -> Result<Decoded> {
        let frame = reader.read_frame()?;
        self.decode_frame(frame)
    }

    /// Serialize `packet` and write it to a blocking stream.
    pub fn write_packet<W: Write>(
        &self,
        writer: &mut FrameWriter<W>,
        packet: &dyn Packet,
    ) -> Result<usize> {
        writer.write_with(|buf: &mut BytesMut, _config| self.serialize_into(packet, buf))
    }

    fn header(&self, discriminator: Discriminator) -> FrameHeader {
        match discriminator {
            Discriminator::Message(id) => FrameHeader::message(id),
            Discriminator::Module(id) => FrameHeader::module(self.config.multiplexed_id(), id),
        }
    }
}

impl Default for PacketRegistry {
    fn default() -> Self {
        RegistryBuilder::new().build()
    }
}

impl fmt::Debug for PacketRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.registered().iter().map(|t| t.name).collect();
        f.debug_struct("PacketRegistry")
            .field("config", &self.config)
            .field("types", &names)
            .field("rejected", &self.rejected.len())
            .finish()
    }
}
