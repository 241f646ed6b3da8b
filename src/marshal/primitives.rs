//! Marshal implementations for scalars, pointers and inline arrays

use super::{layout_of, FieldReader, FieldWriter, Marshal, NumericKind, TypeDescriptor};
use crate::core::types::Address;
use std::mem::size_of;

macro_rules! impl_marshal_pod {
    ($($ty:ty => $kind:ident),* $(,)?) => {
        $(
            impl Marshal for $ty {
                fn descriptor() -> TypeDescriptor {
                    TypeDescriptor::primitive(NumericKind::$kind, size_of::<$ty>())
                }

                fn read_raw(bytes: &[u8]) -> Option<Self> {
                    bytemuck::try_pod_read_unaligned(bytes).ok()
                }

                fn unmarshal(reader: &mut FieldReader<'_>) -> Option<Self> {
                    Self::read_raw(reader.take(size_of::<$ty>())?)
                }

                fn marshal(&self, writer: &mut FieldWriter) {
                    writer.write_bytes(bytemuck::bytes_of(self));
                }

                fn zeroed() -> Self {
                    bytemuck::Zeroable::zeroed()
                }
            }
        )*
    };
}

impl_marshal_pod! {
    u8 => U8,
    i8 => I8,
    u16 => U16,
    i16 => I16,
    u32 => U32,
    i32 => I32,
    u64 => U64,
    i64 => I64,
    f32 => F32,
    f64 => F64,
}

impl Marshal for bool {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::Boolean
    }

    fn read_raw(bytes: &[u8]) -> Option<Self> {
        bytes.first().map(|byte| *byte != 0)
    }

    fn unmarshal(reader: &mut FieldReader<'_>) -> Option<Self> {
        Self::read_raw(reader.take(1)?)
    }

    fn marshal(&self, writer: &mut FieldWriter) {
        writer.write_bytes(&[u8::from(*self)]);
    }

    fn zeroed() -> Self {
        false
    }
}

impl Marshal for Address {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::primitive(NumericKind::Pointer, size_of::<usize>())
    }

    fn read_raw(bytes: &[u8]) -> Option<Self> {
        bytemuck::try_pod_read_unaligned::<usize>(bytes)
            .ok()
            .map(Address::new)
    }

    fn unmarshal(reader: &mut FieldReader<'_>) -> Option<Self> {
        Self::read_raw(reader.take(size_of::<usize>())?)
    }

    fn marshal(&self, writer: &mut FieldWriter) {
        writer.write_bytes(&self.as_usize().to_ne_bytes());
    }

    fn zeroed() -> Self {
        Address::null()
    }
}

/// Decodes `N` consecutive raw-copy elements of `size` bytes each
fn read_elements<T: Marshal, const N: usize>(bytes: &[u8], size: usize) -> Option<[T; N]> {
    let items = (0..N)
        .map(|index| T::read_raw(bytes.get(index * size..(index + 1) * size)?))
        .collect::<Option<Vec<T>>>()?;
    items.try_into().ok()
}

// The element layout is looked up once per array, not once per element.
impl<T: Marshal, const N: usize> Marshal for [T; N] {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::fixed_buffer(T::descriptor(), N)
    }

    fn read_raw(bytes: &[u8]) -> Option<Self> {
        read_elements(bytes, layout_of::<T>().size)
    }

    fn unmarshal(reader: &mut FieldReader<'_>) -> Option<Self> {
        let element = layout_of::<T>();
        let bytes = reader.take(element.size.checked_mul(N)?)?;
        if !element.requires_marshal {
            return read_elements(bytes, element.size);
        }

        let mut inner = FieldReader::new(bytes);
        let items = (0..N)
            .map(|_| T::unmarshal(&mut inner))
            .collect::<Option<Vec<T>>>()?;
        items.try_into().ok()
    }

    fn marshal(&self, writer: &mut FieldWriter) {
        let size = layout_of::<T>().size;
        for item in self {
            writer.write_sized(item, size);
        }
    }

    fn zeroed() -> Self {
        std::array::from_fn(|_| T::zeroed())
    }
}
