//! Type descriptions and the layout facts derived from them

use super::Marshal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Underlying numeric kind of a marshaled type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumericKind {
    Boolean,
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
    F32,
    F64,
    Pointer,
    Composite,
}

impl fmt::Display for NumericKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NumericKind::Boolean => "bool",
            NumericKind::I8 => "i8",
            NumericKind::U8 => "u8",
            NumericKind::I16 => "i16",
            NumericKind::U16 => "u16",
            NumericKind::I32 => "i32",
            NumericKind::U32 => "u32",
            NumericKind::I64 => "i64",
            NumericKind::U64 => "u64",
            NumericKind::F32 => "f32",
            NumericKind::F64 => "f64",
            NumericKind::Pointer => "pointer",
            NumericKind::Composite => "composite",
        };
        f.write_str(name)
    }
}

/// Shape of a type as it is laid out in target memory
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeDescriptor {
    /// A scalar with a fixed size
    Primitive { kind: NumericKind, size: usize },
    /// A one-byte boolean
    Boolean,
    /// An enumeration stored as its underlying integer
    Enumeration(Box<TypeDescriptor>),
    /// An inline array of `len` elements
    FixedBuffer {
        element: Box<TypeDescriptor>,
        len: usize,
    },
    /// A composite with named fields
    Struct {
        /// Size declared by the type itself, if its in-memory layout matches the wire layout
        native_size: Option<usize>,
        fields: Vec<FieldDescriptor>,
    },
}

/// One field of a [`TypeDescriptor::Struct`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub descriptor: TypeDescriptor,
    /// Field carries an explicit marshaling annotation
    pub marshal_as: bool,
}

impl TypeDescriptor {
    pub fn primitive(kind: NumericKind, size: usize) -> Self {
        TypeDescriptor::Primitive { kind, size }
    }

    /// Enumeration backed by the integer type `U`
    pub fn enumeration<U: Marshal>() -> Self {
        TypeDescriptor::Enumeration(Box::new(U::descriptor()))
    }

    pub fn fixed_buffer(element: TypeDescriptor, len: usize) -> Self {
        TypeDescriptor::FixedBuffer {
            element: Box::new(element),
            len,
        }
    }

    /// Starts describing a struct
    pub fn structure() -> StructBuilder {
        StructBuilder::default()
    }

    /// Size of the type in target memory.
    ///
    /// Structs without a native size sum their fields, with fixed buffers
    /// contributing `element_size * len`.
    pub fn size(&self) -> usize {
        match self {
            TypeDescriptor::Primitive { size, .. } => *size,
            TypeDescriptor::Boolean => 1,
            TypeDescriptor::Enumeration(underlying) => underlying.size(),
            TypeDescriptor::FixedBuffer { element, len } => element.size() * len,
            TypeDescriptor::Struct {
                native_size: Some(size),
                ..
            } => *size,
            TypeDescriptor::Struct {
                native_size: None,
                fields,
            } => fields.iter().map(|field| field.descriptor.size()).sum(),
        }
    }

    /// Numeric kind; enumerations report their underlying kind
    pub fn kind(&self) -> NumericKind {
        match self {
            TypeDescriptor::Primitive { kind, .. } => *kind,
            TypeDescriptor::Boolean => NumericKind::Boolean,
            TypeDescriptor::Enumeration(underlying) => underlying.kind(),
            TypeDescriptor::FixedBuffer { .. } | TypeDescriptor::Struct { .. } => {
                NumericKind::Composite
            }
        }
    }

    /// Whether any field, at any depth, carries a marshaling annotation
    pub fn requires_marshal(&self) -> bool {
        match self {
            TypeDescriptor::Primitive { .. }
            | TypeDescriptor::Boolean
            | TypeDescriptor::Enumeration(_) => false,
            TypeDescriptor::FixedBuffer { element, .. } => element.requires_marshal(),
            TypeDescriptor::Struct { fields, .. } => fields
                .iter()
                .any(|field| field.marshal_as || field.descriptor.requires_marshal()),
        }
    }
}

/// Builder for [`TypeDescriptor::Struct`]
#[derive(Debug, Default)]
pub struct StructBuilder {
    native_size: Option<usize>,
    fields: Vec<FieldDescriptor>,
}

impl StructBuilder {
    /// Declares the in-memory size of the type, usually `size_of::<Self>()`
    pub fn native_size(mut self, size: usize) -> Self {
        self.native_size = Some(size);
        self
    }

    pub fn field<T: Marshal>(self, name: &'static str) -> Self {
        self.push(name, T::descriptor(), false)
    }

    /// Inline array of `len` elements of `T`
    pub fn fixed_buffer<T: Marshal>(self, name: &'static str, len: usize) -> Self {
        self.push(name, TypeDescriptor::fixed_buffer(T::descriptor(), len), false)
    }

    /// Field with an explicit marshaling annotation, forcing the fallback path
    pub fn marshaled(self, name: &'static str, descriptor: TypeDescriptor) -> Self {
        self.push(name, descriptor, true)
    }

    pub fn build(self) -> TypeDescriptor {
        TypeDescriptor::Struct {
            native_size: self.native_size,
            fields: self.fields,
        }
    }

    fn push(mut self, name: &'static str, descriptor: TypeDescriptor, marshal_as: bool) -> Self {
        self.fields.push(FieldDescriptor {
            name,
            descriptor,
            marshal_as,
        });
        self
    }
}

/// Static layout facts for a type, computed once per type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TypeLayout {
    pub size: usize,
    pub kind: NumericKind,
    /// Decode field by field instead of by raw copy
    pub requires_marshal: bool,
}

impl TypeLayout {
    pub fn from_descriptor(descriptor: &TypeDescriptor) -> Self {
        TypeLayout {
            size: descriptor.size(),
            kind: descriptor.kind(),
            requires_marshal: descriptor.requires_marshal(),
        }
    }
}
