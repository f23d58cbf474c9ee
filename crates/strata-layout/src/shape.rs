//! Shape declaration: field descriptors in, offsets and [`StructureInfo`] out.
//!
//! A [`Shape`] is the immutable layout tree for one declared aggregate.
//! It is computed once per shape via [`ShapeBuilder`] and shared by every
//! instance (`Arc<Shape>`). Offset assignment is the only behavioral
//! difference between structs and unions, so both are one node kind
//! parameterised by [`LayoutKind`].

use std::sync::Arc;

use indexmap::IndexMap;
use strata_core::{round_up, Abi, LayoutError, MemSize, NativeType, StructureInfo};

/// How a composite assigns offsets to its fields.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LayoutKind {
    /// Struct semantics: fields at strictly increasing, aligned offsets.
    Sequential,
    /// Union semantics: every field at offset 0, bytes aliased.
    Overlapping,
}

/// The three things a field descriptor may declare.
#[derive(Clone, Debug)]
pub enum ShapeKind {
    /// A single primitive value.
    Primitive(NativeType),
    /// An ordered aggregate of named fields.
    Composite {
        /// Offset-assignment policy.
        layout: LayoutKind,
        /// Fields in declaration order, offsets assigned.
        fields: Vec<Field>,
        /// Field name → index into `fields`. `IndexMap` keeps declaration
        /// order deterministic, which matters for ABI reports.
        index: IndexMap<String, usize>,
    },
    /// Fixed-length contiguous repetition of one element shape.
    Array {
        /// The repeated element.
        element: Arc<Shape>,
        /// Number of elements (≥ 1).
        len: usize,
    },
}

/// One declared field: a name, a nested shape, and its relative offset.
#[derive(Clone, Debug)]
pub struct Field {
    /// Field name, unique within the composite.
    pub name: String,
    /// The field's own shape (recursively carries its `MemSize`).
    pub shape: Arc<Shape>,
    /// Offset relative to the start of the parent.
    pub offset: usize,
}

/// Immutable layout tree node with its computed [`StructureInfo`].
#[derive(Clone, Debug)]
pub struct Shape {
    kind: ShapeKind,
    info: StructureInfo,
    abi: Abi,
}

impl Shape {
    /// A primitive shape under the given ABI.
    pub fn primitive(ty: NativeType, abi: Abi) -> Arc<Self> {
        let m = ty.mem_size(abi);
        Arc::new(Self {
            kind: ShapeKind::Primitive(ty),
            // size == alignment for primitives, so the cursor needs no padding.
            info: StructureInfo::from_cursor(m.size(), m.alignment(), false),
            abi,
        })
    }

    /// A fixed-length array of `len` copies of `element`.
    ///
    /// `element[i].offset = i * element.size`, no inter-element padding;
    /// array alignment = element alignment. Compressed elements are
    /// rejected — elements repeat, so none occupies a trailing position.
    pub fn array(element: Arc<Self>, len: usize) -> Result<Arc<Self>, LayoutError> {
        if len == 0 {
            return Err(LayoutError::ZeroLengthArray);
        }
        if element.info.compressed() {
            return Err(LayoutError::CompressedArrayElement);
        }
        let total = element
            .info
            .size()
            .checked_mul(len)
            .ok_or(LayoutError::SizeOverflow)?;
        let abi = element.abi;
        let info = StructureInfo::from_cursor(total, element.info.alignment(), false);
        Ok(Arc::new(Self {
            kind: ShapeKind::Array { element, len },
            info,
            abi,
        }))
    }

    /// The computed layout record.
    pub fn info(&self) -> &StructureInfo {
        &self.info
    }

    /// Total size in bytes (including padding unless compressed).
    pub fn size(&self) -> usize {
        self.info.size()
    }

    /// Alignment in bytes.
    pub fn alignment(&self) -> usize {
        self.info.alignment()
    }

    /// The ABI this shape was declared under.
    pub fn abi(&self) -> Abi {
        self.abi
    }

    /// The node kind.
    pub fn kind(&self) -> &ShapeKind {
        &self.kind
    }

    /// Storage requirement for embedding this shape in a parent.
    pub fn mem_size(&self) -> MemSize {
        self.info.mem_size()
    }

    /// Look up a declared field by name (composites only).
    pub fn field(&self, name: &str) -> Option<&Field> {
        match &self.kind {
            ShapeKind::Composite { fields, index, .. } => {
                index.get(name).map(|&i| &fields[i])
            }
            _ => None,
        }
    }

    /// Declared fields in declaration order (empty for non-composites).
    pub fn fields(&self) -> &[Field] {
        match &self.kind {
            ShapeKind::Composite { fields, .. } => fields,
            _ => &[],
        }
    }

    /// Array element shape and length, if this is an array.
    pub fn as_array(&self) -> Option<(&Arc<Shape>, usize)> {
        match &self.kind {
            ShapeKind::Array { element, len } => Some((element, *len)),
            _ => None,
        }
    }

    /// Primitive type, if this is a primitive.
    pub fn as_primitive(&self) -> Option<NativeType> {
        match &self.kind {
            ShapeKind::Primitive(ty) => Some(*ty),
            _ => None,
        }
    }
}

/// Builder for composite shapes.
///
/// Fields are appended in declaration order; `build()` runs the layout
/// algorithm and produces the shared `Arc<Shape>`.
pub struct ShapeBuilder {
    abi: Abi,
    layout: LayoutKind,
    fields: Vec<(String, Result<Arc<Shape>, LayoutError>)>,
    compressed: bool,
}

impl ShapeBuilder {
    /// Start a struct (sequential) shape.
    pub fn sequential(abi: Abi) -> Self {
        Self {
            abi,
            layout: LayoutKind::Sequential,
            fields: Vec::new(),
            compressed: false,
        }
    }

    /// Start a union (overlapping) shape.
    pub fn overlapping(abi: Abi) -> Self {
        Self {
            abi,
            layout: LayoutKind::Overlapping,
            fields: Vec::new(),
            compressed: false,
        }
    }

    /// Append a primitive field.
    pub fn primitive(mut self, name: impl Into<String>, ty: NativeType) -> Self {
        let shape = Shape::primitive(ty, self.abi);
        self.fields.push((name.into(), Ok(shape)));
        self
    }

    /// Append a nested composite (or any pre-built shape).
    pub fn nested(mut self, name: impl Into<String>, shape: Arc<Shape>) -> Self {
        self.fields.push((name.into(), Ok(shape)));
        self
    }

    /// Append a fixed-length array field.
    pub fn array(mut self, name: impl Into<String>, element: Arc<Shape>, len: usize) -> Self {
        // Construction may fail (zero length, compressed element);
        // surfaced at build() so the chain stays fluent.
        self.fields.push((name.into(), Shape::array(element, len)));
        self
    }

    /// Drop the trailing padding from the built shape.
    ///
    /// A compressed shape is only legal as the final field of its parent.
    pub fn compressed(mut self) -> Self {
        self.compressed = true;
        self
    }

    /// Run the layout algorithm.
    ///
    /// Sequential: `offset = round_up(cursor, align)`, cursor advances,
    /// aggregate alignment is the max over fields, final size is the
    /// cursor rounded up (or verbatim when compressed).
    /// Overlapping: every offset is 0, size is the max field size rounded
    /// up to the max field alignment.
    pub fn build(self) -> Result<Arc<Shape>, LayoutError> {
        if self.fields.is_empty() {
            return Err(LayoutError::EmptyFieldList);
        }

        let mut index = IndexMap::with_capacity(self.fields.len());
        let mut fields = Vec::with_capacity(self.fields.len());
        let last = self.fields.len() - 1;
        let mut cursor = 0usize;
        let mut agg_align = 1usize;

        for (i, (name, shape)) in self.fields.into_iter().enumerate() {
            let shape = shape?;
            if shape.info().compressed()
                && (self.layout == LayoutKind::Sequential && i != last)
            {
                return Err(LayoutError::CompressedNotLast { field: name });
            }
            let m = shape.mem_size();
            let offset = match self.layout {
                LayoutKind::Sequential => {
                    let offset = round_up(cursor, m.alignment());
                    cursor = offset
                        .checked_add(m.size())
                        .ok_or(LayoutError::SizeOverflow)?;
                    offset
                }
                LayoutKind::Overlapping => {
                    cursor = cursor.max(m.size());
                    0
                }
            };
            agg_align = agg_align.max(m.alignment());

            if index.insert(name.clone(), fields.len()).is_some() {
                return Err(LayoutError::DuplicateField { name });
            }
            fields.push(Field {
                name,
                shape,
                offset,
            });
        }

        let info = StructureInfo::from_cursor(cursor, agg_align, self.compressed);
        Ok(Arc::new(Shape {
            kind: ShapeKind::Composite {
                layout: self.layout,
                fields,
                index,
            },
            info,
            abi: self.abi,
        }))
    }
}
