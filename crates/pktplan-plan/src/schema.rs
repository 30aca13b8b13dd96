use std::any::{type_name, Any, TypeId};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use bytes::Bytes;
use pktplan_wire::{PrimitiveKind, WireError};

/// Predicate gating whether a field is present on the wire.
///
/// The form is always explicit: a bit test against a flags byte, or a
/// boolean field/property. The target is resolved by name among the
/// fields and properties of the same schema when the plan is compiled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    /// Holds iff bit `bit` of the named `u8` field or bits property is set.
    Bit { field: &'static str, bit: u8 },
    /// Holds iff the named `bool` field or flag property is true.
    Flag { field: &'static str },
}

impl Condition {
    pub const fn bit(field: &'static str, bit: u8) -> Self {
        Condition::Bit { field, bit }
    }

    pub const fn flag(field: &'static str) -> Self {
        Condition::Flag { field }
    }

    /// Name of the referenced field or property.
    pub fn target(&self) -> &'static str {
        match self {
            Condition::Bit { field, .. } | Condition::Flag { field } => field,
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Bit { field, bit } => write!(f, "{field}[bit {bit}]"),
            Condition::Flag { field } => write!(f, "{field}"),
        }
    }
}

/// Declared type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Primitive(PrimitiveKind),
    Custom { value_type: &'static str },
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::Primitive(kind) => f.write_str(kind.name()),
            FieldKind::Custom { value_type } => write!(f, "custom({value_type})"),
        }
    }
}

/// Public description of one declared field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldInfo {
    pub name: &'static str,
    pub kind: FieldKind,
    pub condition: Option<Condition>,
}

/// Typed getter/setter pair for a primitive field.
pub(crate) enum PrimitiveAccess<T> {
    I32(fn(&T) -> i32, fn(&mut T, i32)),
    I16(fn(&T) -> i16, fn(&mut T, i16)),
    U16(fn(&T) -> u16, fn(&mut T, u16)),
    U8(fn(&T) -> u8, fn(&mut T, u8)),
    Bool(fn(&T) -> bool, fn(&mut T, bool)),
    Text(fn(&T) -> &str, fn(&mut T, String)),
    RawTail(fn(&T) -> &[u8], fn(&mut T, Bytes)),
}

impl<T> PrimitiveAccess<T> {
    pub(crate) fn kind(&self) -> PrimitiveKind {
        match self {
            PrimitiveAccess::I32(..) => PrimitiveKind::I32,
            PrimitiveAccess::I16(..) => PrimitiveKind::I16,
            PrimitiveAccess::U16(..) => PrimitiveKind::U16,
            PrimitiveAccess::U8(..) => PrimitiveKind::U8,
            PrimitiveAccess::Bool(..) => PrimitiveKind::Bool,
            PrimitiveAccess::Text(..) => PrimitiveKind::Text,
            PrimitiveAccess::RawTail(..) => PrimitiveKind::RawTail,
        }
    }
}

/// Getter/setter for a custom-typed field, with the value type erased.
pub(crate) trait ErasedAccess<T>: Send + Sync {
    fn value_type_id(&self) -> TypeId;

    fn value_type(&self) -> &'static str;

    fn get<'a>(&self, packet: &'a T) -> &'a dyn Any;

    fn set(&self, packet: &mut T, value: Box<dyn Any + Send>) -> pktplan_wire::Result<()>;
}

struct CustomAccess<T, V> {
    get: fn(&T) -> &V,
    set: fn(&mut T, V),
    _marker: PhantomData<fn() -> V>,
}

impl<T: 'static, V: Any + Send + Sync> ErasedAccess<T> for CustomAccess<T, V> {
    fn value_type_id(&self) -> TypeId {
        TypeId::of::<V>()
    }

    fn value_type(&self) -> &'static str {
        type_name::<V>()
    }

    fn get<'a>(&self, packet: &'a T) -> &'a dyn Any {
        (self.get)(packet)
    }

    fn set(&self, packet: &mut T, value: Box<dyn Any + Send>) -> pktplan_wire::Result<()> {
        let value = value
            .downcast::<V>()
            .map_err(|_| WireError::TypeMismatch {
                expected: type_name::<V>(),
            })?;
        (self.set)(packet, *value);
        Ok(())
    }
}

pub(crate) enum FieldAccess<T> {
    Primitive(PrimitiveAccess<T>),
    Custom(Arc<dyn ErasedAccess<T>>),
}

impl<T> FieldAccess<T> {
    pub(crate) fn kind(&self) -> FieldKind {
        match self {
            FieldAccess::Primitive(access) => FieldKind::Primitive(access.kind()),
            FieldAccess::Custom(access) => FieldKind::Custom {
                value_type: access.value_type(),
            },
        }
    }
}

pub(crate) struct FieldDecl<T> {
    pub(crate) name: &'static str,
    pub(crate) access: FieldAccess<T>,
    pub(crate) condition: Option<Condition>,
}

impl<T> FieldDecl<T> {
    pub(crate) fn info(&self) -> FieldInfo {
        FieldInfo {
            name: self.name,
            kind: self.access.kind(),
            condition: self.condition,
        }
    }
}

/// Computed, non-wire value a condition may reference.
pub(crate) enum PropertyAccess<T> {
    Flag(fn(&T) -> bool),
    Bits(fn(&T) -> u8),
}

pub(crate) struct PropertyDecl<T> {
    pub(crate) name: &'static str,
    pub(crate) access: PropertyAccess<T>,
}

/// Ordered field declarations for one packet type.
///
/// Fields are encoded in the order they are declared. Each declaration
/// takes plain function pointers for reading and writing the field, so a
/// schema never needs to inspect the packet type at run time:
///
/// ```ignore
/// PacketSchema::<Login>::new()
///     .u8("flags", |p| p.flags, |p, v| p.flags = v)
///     .text("name", |p| p.name.as_str(), |p, v| p.name = v)
///     .i32("token", |p| p.token, |p, v| p.token = v)
///     .when(Condition::bit("flags", 0))
/// ```
pub struct PacketSchema<T> {
    pub(crate) fields: Vec<FieldDecl<T>>,
    pub(crate) properties: Vec<PropertyDecl<T>>,
    pub(crate) dangling_condition: bool,
}

impl<T: 'static> PacketSchema<T> {
    pub fn new() -> Self {
        Self {
            fields: Vec::new(),
            properties: Vec::new(),
            dangling_condition: false,
        }
    }

    pub fn i32(self, name: &'static str, get: fn(&T) -> i32, set: fn(&mut T, i32)) -> Self {
        self.primitive(name, PrimitiveAccess::I32(get, set))
    }

    pub fn i16(self, name: &'static str, get: fn(&T) -> i16, set: fn(&mut T, i16)) -> Self {
        self.primitive(name, PrimitiveAccess::I16(get, set))
    }

    pub fn u16(self, name: &'static str, get: fn(&T) -> u16, set: fn(&mut T, u16)) -> Self {
        self.primitive(name, PrimitiveAccess::U16(get, set))
    }

    pub fn u8(self, name: &'static str, get: fn(&T) -> u8, set: fn(&mut T, u8)) -> Self {
        self.primitive(name, PrimitiveAccess::U8(get, set))
    }

    pub fn bool(self, name: &'static str, get: fn(&T) -> bool, set: fn(&mut T, bool)) -> Self {
        self.primitive(name, PrimitiveAccess::Bool(get, set))
    }

    /// Length-prefixed UTF-8 text.
    pub fn text(
        self,
        name: &'static str,
        get: fn(&T) -> &str,
        set: fn(&mut T, String),
    ) -> Self {
        self.primitive(name, PrimitiveAccess::Text(get, set))
    }

    /// Raw bytes running to the end of the message body. Must be declared last.
    pub fn raw_tail(
        self,
        name: &'static str,
        get: fn(&T) -> &[u8],
        set: fn(&mut T, Bytes),
    ) -> Self {
        self.primitive(name, PrimitiveAccess::RawTail(get, set))
    }

    /// Field of any other type; its codec is looked up by `V` when compiled.
    pub fn custom<V: Any + Send + Sync>(
        mut self,
        name: &'static str,
        get: fn(&T) -> &V,
        set: fn(&mut T, V),
    ) -> Self {
        let access = CustomAccess {
            get,
            set,
            _marker: PhantomData,
        };
        self.fields.push(FieldDecl {
            name,
            access: FieldAccess::Custom(Arc::new(access)),
            condition: None,
        });
        self
    }

    /// Named boolean a [`Condition::Flag`] may reference. Not written to the wire.
    pub fn flag_property(mut self, name: &'static str, read: fn(&T) -> bool) -> Self {
        self.properties.push(PropertyDecl {
            name,
            access: PropertyAccess::Flag(read),
        });
        self
    }

    /// Named flags byte a [`Condition::Bit`] may reference. Not written to the wire.
    pub fn bits_property(mut self, name: &'static str, read: fn(&T) -> u8) -> Self {
        self.properties.push(PropertyDecl {
            name,
            access: PropertyAccess::Bits(read),
        });
        self
    }

    /// Gate the most recently declared field on `condition`.
    pub fn when(mut self, condition: Condition) -> Self {
        match self.fields.last_mut() {
            Some(field) => field.condition = Some(condition),
            None => self.dangling_condition = true,
        }
        self
    }

    /// Declared fields, in wire order.
    pub fn fields(&self) -> Vec<FieldInfo> {
        self.fields.iter().map(FieldDecl::info).collect()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    fn primitive(mut self, name: &'static str, access: PrimitiveAccess<T>) -> Self {
        self.fields.push(FieldDecl {
            name,
            access: FieldAccess::Primitive(access),
            condition: None,
        });
        self
    }
}

impl<T: 'static> Default for PacketSchema<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for PacketSchema<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields: Vec<FieldInfo> = self.fields.iter().map(FieldDecl::info).collect();
        let properties: Vec<&str> = self.properties.iter().map(|p| p.name).collect();
        f.debug_struct("PacketSchema")
            .field("fields", &fields)
            .field("properties", &properties)
            .finish()
    }
}
