//! Typed value marshaling
//!
//! Every type read from or written to the target implements [`Marshal`].
//! Its [`TypeDescriptor`] is turned once into a [`TypeLayout`] and cached by
//! [`layout_of`]. Types whose layout needs no field mapping are decoded by a
//! raw byte copy, the rest are decoded field by field through [`FieldReader`].

mod cache;
mod descriptor;
mod primitives;

pub use cache::{cached_layouts, layout_of};
pub use descriptor::{FieldDescriptor, NumericKind, StructBuilder, TypeDescriptor, TypeLayout};

/// A value that can cross the process boundary
pub trait Marshal: Sized + 'static {
    /// Layout description of the type in target memory
    fn descriptor() -> TypeDescriptor;

    /// Decodes by raw copy. Only called with exactly `layout.size` bytes.
    ///
    /// The default forwards to [`unmarshal`](Self::unmarshal). Scalars, arrays
    /// of them and types declared with [`marshal_pod!`](crate::marshal_pod)
    /// override it with a `bytemuck` copy.
    fn read_raw(bytes: &[u8]) -> Option<Self> {
        Self::unmarshal(&mut FieldReader::new(bytes))
    }

    /// Decodes field by field
    fn unmarshal(reader: &mut FieldReader<'_>) -> Option<Self>;

    /// Serializes the value in target layout
    fn marshal(&self, writer: &mut FieldWriter);

    /// Value returned when decoding fails
    fn zeroed() -> Self;
}

/// Decodes a `T` from the start of `bytes` through the fast or fallback path
pub fn decode<T: Marshal>(bytes: &[u8]) -> Option<T> {
    let layout = layout_of::<T>();
    let bytes = bytes.get(..layout.size)?;
    if layout.requires_marshal {
        T::unmarshal(&mut FieldReader::new(bytes))
    } else {
        T::read_raw(bytes)
    }
}

#[doc(hidden)]
pub fn pod_read<T: bytemuck::Pod>(bytes: &[u8]) -> Option<T> {
    bytemuck::try_pod_read_unaligned(bytes).ok()
}

#[doc(hidden)]
pub fn pod_bytes<T: bytemuck::Pod>(value: &T) -> &[u8] {
    bytemuck::bytes_of(value)
}

#[doc(hidden)]
pub fn pod_zeroed<T: bytemuck::Pod>() -> T {
    bytemuck::Zeroable::zeroed()
}

/// Serializes a `T` into exactly `layout.size` bytes
pub fn encode<T: Marshal>(value: &T) -> Vec<u8> {
    let mut writer = FieldWriter::with_capacity(layout_of::<T>().size);
    writer.write(value);
    writer.into_bytes()
}

/// Cursor over a marshaled buffer
#[derive(Debug)]
pub struct FieldReader<'a> {
    bytes: &'a [u8],
    position: usize,
}

impl<'a> FieldReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        FieldReader { bytes, position: 0 }
    }

    /// Takes the next `len` bytes
    pub fn take(&mut self, len: usize) -> Option<&'a [u8]> {
        let end = self.position.checked_add(len)?;
        let slice = self.bytes.get(self.position..end)?;
        self.position = end;
        Some(slice)
    }

    /// Decodes the next field as a `T`
    pub fn read<T: Marshal>(&mut self) -> Option<T> {
        let size = layout_of::<T>().size;
        decode(self.take(size)?)
    }

    /// Reads an inline string of `len` bytes, stopping at the first zero
    pub fn read_fixed_string(&mut self, len: usize) -> Option<String> {
        let bytes = self.take(len)?;
        let end = bytes.iter().position(|b| *b == 0).unwrap_or(len);
        String::from_utf8(bytes[..end].to_vec()).ok()
    }

    pub fn skip(&mut self, len: usize) -> Option<()> {
        self.take(len).map(|_| ())
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.position
    }
}

/// Growable buffer a value marshals itself into
#[derive(Debug, Default)]
pub struct FieldWriter {
    buffer: Vec<u8>,
}

impl FieldWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        FieldWriter {
            buffer: Vec::with_capacity(capacity),
        }
    }

    /// Appends a field, padded or truncated to its layout size
    pub fn write<T: Marshal>(&mut self, value: &T) {
        self.write_sized(value, layout_of::<T>().size);
    }

    /// Like [`write`](Self::write) with the layout size already known
    pub(crate) fn write_sized<T: Marshal>(&mut self, value: &T, size: usize) {
        let start = self.buffer.len();
        value.marshal(self);
        self.buffer.resize(start + size, 0);
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// Appends an inline string of exactly `len` bytes, always zero terminated
    pub fn write_fixed_string(&mut self, value: &str, len: usize) {
        if len == 0 {
            return;
        }
        let bytes = value.as_bytes();
        let copied = bytes.len().min(len - 1);
        self.buffer.extend_from_slice(&bytes[..copied]);
        self.pad(len - copied);
    }

    /// Appends `len` zero bytes
    pub fn pad(&mut self, len: usize) {
        self.buffer.resize(self.buffer.len() + len, 0);
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }
}

/// Declares a fieldless enum stored as an integer and implements [`Marshal`] for it.
///
/// Unknown discriminants fail to decode. The zero value is the variant whose
/// discriminant is 0, or the first variant if none is.
///
/// ```
/// memscan::marshal_enum! {
///     pub enum Stance: u8 {
///         Standing = 0,
///         Crouching = 1,
///         Prone = 2,
///     }
/// }
/// ```
#[macro_export]
macro_rules! marshal_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident : $repr:ty {
            $first:ident = $first_value:expr
            $(, $variant:ident = $value:expr)* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr($repr)]
        $vis enum $name {
            $first = $first_value,
            $($variant = $value,)*
        }

        impl $name {
            /// Maps a raw discriminant to a variant
            pub fn from_raw(raw: $repr) -> Option<Self> {
                if raw == $first_value {
                    return Some($name::$first);
                }
                $(
                    if raw == $value {
                        return Some($name::$variant);
                    }
                )*
                None
            }
        }

        impl $crate::marshal::Marshal for $name {
            fn descriptor() -> $crate::marshal::TypeDescriptor {
                $crate::marshal::TypeDescriptor::enumeration::<$repr>()
            }

            fn read_raw(bytes: &[u8]) -> Option<Self> {
                <$repr as $crate::marshal::Marshal>::read_raw(bytes).and_then(Self::from_raw)
            }

            fn unmarshal(reader: &mut $crate::marshal::FieldReader<'_>) -> Option<Self> {
                reader.read::<$repr>().and_then(Self::from_raw)
            }

            fn marshal(&self, writer: &mut $crate::marshal::FieldWriter) {
                writer.write(&(*self as $repr));
            }

            fn zeroed() -> Self {
                Self::from_raw(0).unwrap_or($name::$first)
            }
        }
    };
}

/// Implements [`Marshal`] for a `#[repr(C)]` struct that is `bytemuck::Pod`.
///
/// The fields are listed in declaration order. The struct decodes by a single
/// raw copy and never goes through [`Marshal::unmarshal`].
///
/// ```
/// #[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
/// #[repr(C)]
/// struct Vec3 {
///     x: f32,
///     y: f32,
///     z: f32,
/// }
///
/// memscan::marshal_pod!(Vec3 { x: f32, y: f32, z: f32 });
///
/// let layout = memscan::layout_of::<Vec3>();
/// assert_eq!(layout.size, 12);
/// assert!(!layout.requires_marshal);
/// ```
#[macro_export]
macro_rules! marshal_pod {
    ($name:ident { $($field:ident : $ty:ty),* $(,)? }) => {
        impl $crate::marshal::Marshal for $name {
            fn descriptor() -> $crate::marshal::TypeDescriptor {
                $crate::marshal::TypeDescriptor::structure()
                    .native_size(::std::mem::size_of::<$name>())
                    $(.field::<$ty>(stringify!($field)))*
                    .build()
            }

            fn read_raw(bytes: &[u8]) -> Option<Self> {
                $crate::marshal::pod_read(bytes)
            }

            fn unmarshal(reader: &mut $crate::marshal::FieldReader<'_>) -> Option<Self> {
                Self::read_raw(reader.take(::std::mem::size_of::<$name>())?)
            }

            fn marshal(&self, writer: &mut $crate::marshal::FieldWriter) {
                writer.write_bytes($crate::marshal::pod_bytes(self));
            }

            fn zeroed() -> Self {
                $crate::marshal::pod_zeroed()
            }
        }
    };
}
