use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use bytes::BytesMut;

use crate::error::{Result, WireError};
use crate::primitive::Primitive;
use crate::source::ByteSource;

/// Read/write logic for a field type that is not a primitive.
///
/// One codec is registered per value type in a [`CodecTable`]; plans look it
/// up when they are compiled, never while encoding.
pub trait CustomCodec: Send + Sync + 'static {
    type Value: Any + Send + Sync;

    fn write(&self, value: &Self::Value, dst: &mut BytesMut) -> Result<()>;

    fn read(&self, src: &mut ByteSource) -> Result<Self::Value>;
}

/// Type-erased view of a [`CustomCodec`].
pub trait ErasedCodec: Send + Sync {
    /// Name of the value type this codec handles.
    fn value_type(&self) -> &'static str;

    fn write_any(&self, value: &dyn Any, dst: &mut BytesMut) -> Result<()>;

    fn read_any(&self, src: &mut ByteSource) -> Result<Box<dyn Any + Send>>;
}

impl<C: CustomCodec> ErasedCodec for C {
    fn value_type(&self) -> &'static str {
        type_name::<C::Value>()
    }

    fn write_any(&self, value: &dyn Any, dst: &mut BytesMut) -> Result<()> {
        let value = value
            .downcast_ref::<C::Value>()
            .ok_or(WireError::TypeMismatch {
                expected: type_name::<C::Value>(),
            })?;
        self.write(value, dst)
    }

    fn read_any(&self, src: &mut ByteSource) -> Result<Box<dyn Any + Send>> {
        Ok(Box::new(self.read(src)?))
    }
}

/// Custom codecs keyed by the value type they encode.
#[derive(Clone, Default)]
pub struct CodecTable {
    codecs: HashMap<TypeId, Arc<dyn ErasedCodec>>,
}

impl CodecTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the codec for `C::Value`.
    ///
    /// A value type has exactly one codec: a second registration is rejected
    /// and the first one stays in place.
    pub fn register<C: CustomCodec>(&mut self, codec: C) -> Result<()> {
        let type_id = TypeId::of::<C::Value>();
        if self.codecs.contains_key(&type_id) {
            return Err(WireError::DuplicateCodec(type_name::<C::Value>()));
        }
        self.codecs.insert(type_id, Arc::new(codec));
        tracing::trace!(value_type = type_name::<C::Value>(), "registered custom codec");
        Ok(())
    }

    /// Look up the codec for a value type.
    pub fn get(&self, type_id: TypeId) -> Option<Arc<dyn ErasedCodec>> {
        self.codecs.get(&type_id).cloned()
    }

    pub fn contains<V: Any>(&self) -> bool {
        self.codecs.contains_key(&TypeId::of::<V>())
    }

    pub fn len(&self) -> usize {
        self.codecs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codecs.is_empty()
    }
}

impl fmt::Debug for CodecTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.codecs.values().map(|c| c.value_type()).collect();
        names.sort_unstable();
        f.debug_struct("CodecTable").field("codecs", &names).finish()
    }
}

/// Codec for a C-like enum carried on the wire as primitive `R`.
///
/// `E` converts into `R` for writing and back through `TryFrom<R>` for
/// reading; raw values without a variant fail with
/// [`WireError::InvalidEnum`].
pub struct EnumCodec<E, R> {
    _marker: PhantomData<fn() -> (E, R)>,
}

impl<E, R> EnumCodec<E, R> {
    pub const fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<E, R> Default for EnumCodec<E, R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E, R> fmt::Debug for EnumCodec<E, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnumCodec")
            .field("value", &type_name::<E>())
            .field("repr", &type_name::<R>())
            .finish()
    }
}

impl<E, R> CustomCodec for EnumCodec<E, R>
where
    E: Copy + Into<R> + TryFrom<R> + Send + Sync + 'static,
    R: Primitive + Into<i64>,
{
    type Value = E;

    fn write(&self, value: &E, dst: &mut BytesMut) -> Result<()> {
        let raw: R = (*value).into();
        raw.put(dst);
        Ok(())
    }

    fn read(&self, src: &mut ByteSource) -> Result<E> {
        let raw = R::get(src)?;
        E::try_from(raw).map_err(|_| WireError::InvalidEnum {
            type_name: type_name::<E>(),
            value: raw.into(),
        })
    }
}
