//! The field registry driving generic sizing and encoding.
//!
//! Every encodable type describes itself as an ordered list of named fields
//! ([`Fields`]); sizing, encoding and offset computation are then generic
//! prefix-sum walks over that list. Registries are built once per type and
//! cached in a global table keyed by [`TypeId`].

use std::any::{Any, TypeId};
use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::{OnceLock, RwLock};

use crate::codec::Buffer;
use crate::error::{EncodeError, Error};
use crate::types::{Fixed, LongDateTime, Tag, Version16Dot16};
use crate::validate::{self, Validate};

/// A type with a field registry.
pub trait Encodable: 'static {
    /// Describe this type's fields, in wire order.
    ///
    /// Called at most once per type; use [`fields_of`] to get the cached
    /// registry.
    fn build_fields() -> Fields<Self>
    where
        Self: Sized;

    /// Recompute derived state before encoding.
    ///
    /// Runs once per encoding pass, before sizing. Field closures themselves
    /// must stay pure: they can be evaluated during both sizing and encoding.
    fn fixup(&mut self) {}
}

type WriteFn<T> = Box<dyn Fn(&T, &mut Buffer) -> Result<(), EncodeError> + Send + Sync>;
type SizeFn<T> = Box<dyn Fn(&T) -> usize + Send + Sync>;

enum FieldSize<T: ?Sized> {
    Const(usize),
    Computed(SizeFn<T>),
}

/// One named field of an encodable type.
pub struct Field<T: ?Sized> {
    name: &'static str,
    size: FieldSize<T>,
    write: WriteFn<T>,
}

impl<T> Field<T> {
    fn size_for(&self, value: &T) -> usize {
        match &self.size {
            FieldSize::Const(n) => *n,
            FieldSize::Computed(get) => get(value),
        }
    }
}

/// The ordered field list of one type.
pub struct Fields<T: ?Sized> {
    fields: Vec<Field<T>>,
}

impl<T: 'static> Default for Fields<T> {
    fn default() -> Self {
        Fields::new()
    }
}

impl<T: 'static> Fields<T> {
    pub fn new() -> Self {
        Fields { fields: Vec::new() }
    }

    /// Start from a parent type's fields, projected through an accessor.
    ///
    /// Parent fields keep their order (root-first through the whole chain,
    /// since the parent may itself inherit); fields the child adds under an
    /// inherited name replace the inherited one in place.
    pub fn inherit<P: Encodable>(project: for<'a> fn(&'a T) -> &'a P) -> Self {
        let parent = fields_of::<P>();
        let fields = parent
            .fields
            .iter()
            .map(|field| Field {
                name: field.name,
                size: match &field.size {
                    FieldSize::Const(n) => FieldSize::Const(*n),
                    FieldSize::Computed(_) => {
                        FieldSize::Computed(Box::new(move |value| field.size_for(project(value))))
                    }
                },
                write: Box::new(move |value, buf| (field.write)(project(value), buf)),
            })
            .collect();
        Fields { fields }
    }

    fn push(mut self, name: &'static str, size: FieldSize<T>, write: WriteFn<T>) -> Self {
        match self.fields.iter_mut().find(|field| field.name == name) {
            Some(existing) => {
                existing.size = size;
                existing.write = write;
            }
            None => self.fields.push(Field { name, size, write }),
        }
        self
    }

    pub fn uint8(self, name: &'static str, get: fn(&T) -> u8) -> Self {
        self.push(
            name,
            FieldSize::Const(1),
            Box::new(move |value, buf| {
                buf.put_u8(get(value));
                Ok(())
            }),
        )
    }

    pub fn int8(self, name: &'static str, get: fn(&T) -> i8) -> Self {
        self.push(
            name,
            FieldSize::Const(1),
            Box::new(move |value, buf| {
                buf.put_i8(get(value));
                Ok(())
            }),
        )
    }

    pub fn uint16(self, name: &'static str, get: fn(&T) -> u16) -> Self {
        self.push(
            name,
            FieldSize::Const(2),
            Box::new(move |value, buf| {
                buf.put_u16(get(value));
                Ok(())
            }),
        )
    }

    pub fn int16(self, name: &'static str, get: fn(&T) -> i16) -> Self {
        self.push(
            name,
            FieldSize::Const(2),
            Box::new(move |value, buf| {
                buf.put_i16(get(value));
                Ok(())
            }),
        )
    }

    pub fn uint24(self, name: &'static str, get: fn(&T) -> u32) -> Self {
        self.push(
            name,
            FieldSize::Const(3),
            Box::new(move |value, buf| {
                buf.put_u24(get(value));
                Ok(())
            }),
        )
    }

    pub fn uint32(self, name: &'static str, get: fn(&T) -> u32) -> Self {
        self.push(
            name,
            FieldSize::Const(4),
            Box::new(move |value, buf| {
                buf.put_u32(get(value));
                Ok(())
            }),
        )
    }

    pub fn fixed(self, name: &'static str, get: fn(&T) -> Fixed) -> Self {
        self.push(
            name,
            FieldSize::Const(4),
            Box::new(move |value, buf| {
                buf.put_fixed(get(value));
                Ok(())
            }),
        )
    }

    pub fn tag(self, name: &'static str, get: fn(&T) -> Tag) -> Self {
        self.push(
            name,
            FieldSize::Const(4),
            Box::new(move |value, buf| {
                buf.put_tag(get(value));
                Ok(())
            }),
        )
    }

    pub fn version(self, name: &'static str, get: fn(&T) -> Version16Dot16) -> Self {
        self.push(
            name,
            FieldSize::Const(4),
            Box::new(move |value, buf| {
                buf.put_version(get(value));
                Ok(())
            }),
        )
    }

    pub fn datetime(self, name: &'static str, get: fn(&T) -> LongDateTime) -> Self {
        self.push(
            name,
            FieldSize::Const(8),
            Box::new(move |value, buf| {
                buf.put_datetime(get(value));
                Ok(())
            }),
        )
    }

    /// A u16 offset computed from layout; overflowing u16 is a fatal error.
    pub fn offset16(self, name: &'static str, get: fn(&T) -> usize) -> Self {
        self.push(
            name,
            FieldSize::Const(2),
            Box::new(move |value, buf| {
                let raw = get(value);
                let offset = u16::try_from(raw)
                    .map_err(|_| EncodeError::OffsetOverflow { field: name, value: raw })?;
                buf.put_u16(offset);
                Ok(())
            }),
        )
    }

    pub fn bytes(self, name: &'static str, get: for<'a> fn(&'a T) -> Cow<'a, [u8]>) -> Self {
        self.push(
            name,
            FieldSize::Computed(Box::new(move |value| get(value).len())),
            Box::new(move |value, buf| {
                buf.put_bytes(&get(value));
                Ok(())
            }),
        )
    }

    pub fn uint16_array(self, name: &'static str, get: for<'a> fn(&'a T) -> Cow<'a, [u16]>) -> Self {
        self.push(
            name,
            FieldSize::Computed(Box::new(move |value| get(value).len() * 2)),
            Box::new(move |value, buf| {
                for item in get(value).iter() {
                    buf.put_u16(*item);
                }
                Ok(())
            }),
        )
    }

    pub fn int16_array(self, name: &'static str, get: for<'a> fn(&'a T) -> Cow<'a, [i16]>) -> Self {
        self.push(
            name,
            FieldSize::Computed(Box::new(move |value| get(value).len() * 2)),
            Box::new(move |value, buf| {
                for item in get(value).iter() {
                    buf.put_i16(*item);
                }
                Ok(())
            }),
        )
    }

    pub fn uint32_array(self, name: &'static str, get: for<'a> fn(&'a T) -> Cow<'a, [u32]>) -> Self {
        self.push(
            name,
            FieldSize::Computed(Box::new(move |value| get(value).len() * 4)),
            Box::new(move |value, buf| {
                for item in get(value).iter() {
                    buf.put_u32(*item);
                }
                Ok(())
            }),
        )
    }

    /// A nested table, encoded in place.
    pub fn table(self, name: &'static str, get: for<'a> fn(&'a T) -> &'a dyn FontTable) -> Self {
        self.push(
            name,
            FieldSize::Computed(Box::new(move |value| get(value).dyn_size())),
            Box::new(move |value, buf| get(value).dyn_encode(buf)),
        )
    }

    /// An array of fixed-shape records.
    pub fn record_array<S: Encodable + Clone>(
        self,
        name: &'static str,
        get: for<'a> fn(&'a T) -> Cow<'a, [S]>,
    ) -> Self {
        self.push(
            name,
            FieldSize::Computed(Box::new(move |value| {
                get(value).iter().map(|item| size_of(item, 0)).sum()
            })),
            Box::new(move |value, buf| {
                for item in get(value).iter() {
                    encode_value(item, buf)?;
                }
                Ok(())
            }),
        )
    }

    /// A list of heterogeneous tables, each padded to `align` bytes.
    pub fn dyn_array(
        self,
        name: &'static str,
        get: for<'a> fn(&'a T) -> Vec<&'a dyn FontTable>,
        align: usize,
    ) -> Self {
        self.push(
            name,
            FieldSize::Computed(Box::new(move |value| {
                get(value)
                    .iter()
                    .map(|item| align_len(item.dyn_size(), align))
                    .sum()
            })),
            Box::new(move |value, buf| {
                for item in get(value) {
                    let start = buf.len();
                    item.dyn_encode(buf)?;
                    buf.pad_from(start, align);
                }
                Ok(())
            }),
        )
    }
}

pub(crate) fn align_len(len: usize, align: usize) -> usize {
    if align < 2 {
        len
    } else {
        len.div_ceil(align) * align
    }
}

fn registry() -> &'static RwLock<HashMap<TypeId, &'static (dyn Any + Send + Sync)>> {
    static REGISTRY: OnceLock<RwLock<HashMap<TypeId, &'static (dyn Any + Send + Sync)>>> =
        OnceLock::new();
    REGISTRY.get_or_init(Default::default)
}

/// The cached field registry of `T`, built on first use.
pub fn fields_of<T: Encodable>() -> &'static Fields<T> {
    let id = TypeId::of::<T>();
    let cached = registry().read().unwrap().get(&id).copied();
    if let Some(entry) = cached {
        return entry.downcast_ref().unwrap();
    }
    // Built outside the lock: a parent registry may be built recursively.
    // A racing thread can leak one extra copy, which is harmless.
    let built: &'static Fields<T> = Box::leak(Box::new(T::build_fields()));
    let entry = *registry().write().unwrap().entry(id).or_insert(built);
    entry.downcast_ref().unwrap()
}

/// Total encoded size of `value`, rounded up to `align` bytes.
pub fn size_of<T: Encodable>(value: &T, align: usize) -> usize {
    let size = fields_of::<T>()
        .fields
        .iter()
        .map(|field| field.size_for(value))
        .sum();
    align_len(size, align)
}

/// Stream every field of `value` into `buf`, in registry order.
pub fn encode_value<T: Encodable>(value: &T, buf: &mut Buffer) -> Result<(), EncodeError> {
    for field in &fields_of::<T>().fields {
        (field.write)(value, buf)?;
    }
    Ok(())
}

/// Byte offset of the named field from the start of `value`'s encoding.
///
/// Panics if `T` has no field of that name.
pub fn offset_of<T: Encodable>(value: &T, name: &str) -> usize {
    let mut offset = 0;
    for field in &fields_of::<T>().fields {
        if field.name == name {
            return offset;
        }
        offset += field.size_for(value);
    }
    panic!("type has no field named '{name}'");
}

/// Fixup, validate and encode a single table.
pub fn dump_table<T: Encodable + Validate>(table: &mut T) -> Result<Vec<u8>, Error> {
    table.fixup();
    validate::validate(table)?;
    let mut buf = Buffer::with_capacity(size_of(table, 0));
    encode_value(table, &mut buf)?;
    Ok(buf.into_inner())
}

/// Object-safe access to an encodable table.
///
/// Blanket-implemented for every `Encodable + Validate` type; this is what
/// lets the font container and heterogeneous subtable lists hold tables of
/// mixed types.
pub trait FontTable: Any + Send + Sync {
    fn dyn_size(&self) -> usize;
    fn dyn_encode(&self, buf: &mut Buffer) -> Result<(), EncodeError>;
    fn dyn_fixup(&mut self);
    fn dyn_validate(&self, ctx: &mut crate::validate::ValidationCtx);
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Encodable + Validate + Send + Sync> FontTable for T {
    fn dyn_size(&self) -> usize {
        size_of(self, 0)
    }

    fn dyn_encode(&self, buf: &mut Buffer) -> Result<(), EncodeError> {
        encode_value(self, buf)
    }

    fn dyn_fixup(&mut self) {
        self.fixup();
    }

    fn dyn_validate(&self, ctx: &mut crate::validate::ValidationCtx) {
        self.validate_impl(ctx);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
