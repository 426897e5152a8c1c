use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::types::{LogicalType, Value};
use super::validity::ValidityMask;

/// Typed value storage backing a flat vector or a segment buffer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ValueBuffer {
    Boolean(Vec<bool>),
    Integer(Vec<i32>),
    BigInt(Vec<i64>),
    Double(Vec<f64>),
    Varchar(Vec<String>),
    /// Fallback storage for nested values assembled by the column variants.
    /// Never written into a segment.
    Rows(Vec<Value>),
}

impl ValueBuffer {
    pub fn for_type(ty: &LogicalType) -> Self {
        match ty {
            LogicalType::Boolean | LogicalType::Validity => ValueBuffer::Boolean(Vec::new()),
            LogicalType::Integer => ValueBuffer::Integer(Vec::new()),
            LogicalType::BigInt => ValueBuffer::BigInt(Vec::new()),
            LogicalType::Double => ValueBuffer::Double(Vec::new()),
            LogicalType::Varchar => ValueBuffer::Varchar(Vec::new()),
            LogicalType::List(_) | LogicalType::Struct(_) | LogicalType::Array(..) => {
                ValueBuffer::Rows(Vec::new())
            }
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ValueBuffer::Boolean(v) => v.len(),
            ValueBuffer::Integer(v) => v.len(),
            ValueBuffer::BigInt(v) => v.len(),
            ValueBuffer::Double(v) => v.len(),
            ValueBuffer::Varchar(v) => v.len(),
            ValueBuffer::Rows(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Appends a value; nulls store the slot's zero value, the validity mask
    /// is tracked by the caller.
    pub fn push_value(&mut self, value: &Value) {
        match (self, value) {
            (ValueBuffer::Boolean(v), Value::Boolean(b)) => v.push(*b),
            (ValueBuffer::Boolean(v), Value::Null) => v.push(false),
            (ValueBuffer::Integer(v), Value::Integer(i)) => v.push(*i),
            (ValueBuffer::Integer(v), Value::Null) => v.push(0),
            (ValueBuffer::BigInt(v), Value::BigInt(i)) => v.push(*i),
            (ValueBuffer::BigInt(v), Value::Null) => v.push(0),
            (ValueBuffer::Double(v), Value::Double(d)) => v.push(*d),
            (ValueBuffer::Double(v), Value::Null) => v.push(0.0),
            (ValueBuffer::Varchar(v), Value::Varchar(s)) => v.push(s.clone()),
            (ValueBuffer::Varchar(v), Value::Null) => v.push(String::new()),
            (ValueBuffer::Rows(v), value) => v.push(value.clone()),
            (buffer, value) => {
                debug_assert!(false, "value {:?} does not fit buffer {:?}", value, buffer);
            }
        }
    }

    pub fn value_at(&self, row: usize) -> Value {
        match self {
            ValueBuffer::Boolean(v) => Value::Boolean(v[row]),
            ValueBuffer::Integer(v) => Value::Integer(v[row]),
            ValueBuffer::BigInt(v) => Value::BigInt(v[row]),
            ValueBuffer::Double(v) => Value::Double(v[row]),
            ValueBuffer::Varchar(v) => Value::Varchar(v[row].clone()),
            ValueBuffer::Rows(v) => v[row].clone(),
        }
    }

    pub fn set_value(&mut self, row: usize, value: &Value) {
        match (self, value) {
            (ValueBuffer::Boolean(v), Value::Boolean(b)) => v[row] = *b,
            (ValueBuffer::Boolean(v), Value::Null) => v[row] = false,
            (ValueBuffer::Integer(v), Value::Integer(i)) => v[row] = *i,
            (ValueBuffer::Integer(v), Value::Null) => v[row] = 0,
            (ValueBuffer::BigInt(v), Value::BigInt(i)) => v[row] = *i,
            (ValueBuffer::BigInt(v), Value::Null) => v[row] = 0,
            (ValueBuffer::Double(v), Value::Double(d)) => v[row] = *d,
            (ValueBuffer::Double(v), Value::Null) => v[row] = 0.0,
            (ValueBuffer::Varchar(v), Value::Varchar(s)) => v[row] = s.clone(),
            (ValueBuffer::Varchar(v), Value::Null) => v[row].clear(),
            (ValueBuffer::Rows(v), value) => v[row] = value.clone(),
            (buffer, value) => {
                debug_assert!(false, "value {:?} does not fit buffer {:?}", value, buffer);
            }
        }
    }

    pub fn truncate(&mut self, new_len: usize) {
        match self {
            ValueBuffer::Boolean(v) => v.truncate(new_len),
            ValueBuffer::Integer(v) => v.truncate(new_len),
            ValueBuffer::BigInt(v) => v.truncate(new_len),
            ValueBuffer::Double(v) => v.truncate(new_len),
            ValueBuffer::Varchar(v) => v.truncate(new_len),
            ValueBuffer::Rows(v) => v.truncate(new_len),
        }
    }
}

/// Row-addressed view a reference-encoded vector reads through, implemented
/// by the segment so whole-vector scans stay zero-copy.
pub trait VectorSource: Send + Sync {
    fn source_value(&self, row: usize) -> Value;
    fn source_is_valid(&self, row: usize) -> bool;
}

#[derive(Clone)]
enum VectorEncoding {
    Flat {
        buffer: ValueBuffer,
        validity: ValidityMask,
    },
    Reference {
        source: Arc<dyn VectorSource>,
        offset: usize,
        len: usize,
    },
}

impl std::fmt::Debug for VectorEncoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VectorEncoding::Flat { buffer, .. } => {
                write!(f, "Flat(len={})", buffer.len())
            }
            VectorEncoding::Reference { offset, len, .. } => {
                write!(f, "Reference(offset={}, len={})", offset, len)
            }
        }
    }
}

/// The unit of data interchange for scans and appends: a batch of rows of
/// one logical type, either materialized (`Flat`) or borrowed from a
/// segment's buffer (`Reference`).
#[derive(Debug, Clone)]
pub struct ValueVector {
    ty: LogicalType,
    data: VectorEncoding,
}

impl ValueVector {
    pub fn new(ty: LogicalType) -> Self {
        let buffer = ValueBuffer::for_type(&ty);
        Self {
            ty,
            data: VectorEncoding::Flat {
                buffer,
                validity: ValidityMask::new(),
            },
        }
    }

    pub fn from_values(ty: LogicalType, values: Vec<Value>) -> Self {
        let mut vector = Self::new(ty);
        for value in values {
            vector.push(value);
        }
        vector
    }

    pub fn reference(ty: LogicalType, source: Arc<dyn VectorSource>, offset: usize, len: usize) -> Self {
        Self {
            ty,
            data: VectorEncoding::Reference {
                source,
                offset,
                len,
            },
        }
    }

    pub fn logical_type(&self) -> &LogicalType {
        &self.ty
    }

    pub fn len(&self) -> usize {
        match &self.data {
            VectorEncoding::Flat { buffer, .. } => buffer.len(),
            VectorEncoding::Reference { len, .. } => *len,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_flat(&self) -> bool {
        matches!(self.data, VectorEncoding::Flat { .. })
    }

    pub fn get(&self, row: usize) -> Value {
        match &self.data {
            VectorEncoding::Flat { buffer, validity } => {
                if !validity.is_valid(row) {
                    Value::Null
                } else {
                    buffer.value_at(row)
                }
            }
            VectorEncoding::Reference {
                source,
                offset,
                len,
            } => {
                debug_assert!(row < *len);
                if !source.source_is_valid(offset + row) {
                    Value::Null
                } else {
                    source.source_value(offset + row)
                }
            }
        }
    }

    pub fn is_valid(&self, row: usize) -> bool {
        match &self.data {
            VectorEncoding::Flat { validity, .. } => validity.is_valid(row),
            VectorEncoding::Reference { source, offset, .. } => {
                source.source_is_valid(offset + row)
            }
        }
    }

    pub fn push(&mut self, value: Value) {
        match &mut self.data {
            VectorEncoding::Flat { buffer, validity } => {
                validity.push(!value.is_null());
                buffer.push_value(&value);
            }
            VectorEncoding::Reference { .. } => {
                debug_assert!(false, "push on a reference vector; flatten first");
            }
        }
    }

    /// Overwrites one row in place. The vector must be flat; scans flatten
    /// before the overlay patches rows.
    pub fn set(&mut self, row: usize, value: Value) {
        match &mut self.data {
            VectorEncoding::Flat { buffer, validity } => {
                validity.set(row, !value.is_null());
                buffer.set_value(row, &value);
            }
            VectorEncoding::Reference { .. } => {
                debug_assert!(false, "set on a reference vector; flatten first");
            }
        }
    }

    pub fn set_null(&mut self, row: usize) {
        self.set(row, Value::Null);
    }

    pub fn clear(&mut self) {
        self.data = VectorEncoding::Flat {
            buffer: ValueBuffer::for_type(&self.ty),
            validity: ValidityMask::new(),
        };
    }

    /// Grows the vector to `len` rows, padding with nulls. Never shrinks.
    /// Reference vectors are materialized first so the rows stay writable.
    pub fn resize(&mut self, len: usize) {
        if !self.is_flat() {
            self.flatten(self.len());
        }
        while self.len() < len {
            self.push(Value::Null);
        }
    }

    /// Forces a fully materialized representation of the first `count` rows.
    /// No-op when the vector already owns its data.
    pub fn flatten(&mut self, count: usize) {
        if self.is_flat() {
            return;
        }
        let count = count.min(self.len());
        let mut buffer = ValueBuffer::for_type(&self.ty);
        let mut validity = ValidityMask::new();
        for row in 0..count {
            let value = self.get(row);
            validity.push(!value.is_null());
            buffer.push_value(&value);
        }
        self.data = VectorEncoding::Flat { buffer, validity };
    }

    /// Keeps only the rows selected by `sel`, in selection order.
    pub fn slice(&mut self, sel: &SelectionVector, count: usize) {
        let mut buffer = ValueBuffer::for_type(&self.ty);
        let mut validity = ValidityMask::new();
        for i in 0..count {
            let value = self.get(sel.index(i));
            validity.push(!value.is_null());
            buffer.push_value(&value);
        }
        self.data = VectorEncoding::Flat { buffer, validity };
    }

    /// Uniform per-row access over any encoding, optionally routed through a
    /// selection vector.
    pub fn to_unified<'a>(&'a self, sel: Option<&'a SelectionVector>) -> UnifiedFormat<'a> {
        UnifiedFormat { vector: self, sel }
    }
}

/// Row indirection over a vector: resolves a logical position to the backing
/// row through the optional selection vector.
pub struct UnifiedFormat<'a> {
    vector: &'a ValueVector,
    sel: Option<&'a SelectionVector>,
}

impl UnifiedFormat<'_> {
    #[inline]
    fn row_index(&self, position: usize) -> usize {
        match self.sel {
            Some(sel) => sel.index(position),
            None => position,
        }
    }

    pub fn value(&self, position: usize) -> Value {
        self.vector.get(self.row_index(position))
    }

    pub fn is_valid(&self, position: usize) -> bool {
        self.vector.is_valid(self.row_index(position))
    }

    pub fn logical_type(&self) -> &LogicalType {
        self.vector.logical_type()
    }
}

#[derive(Debug, Clone, Default)]
pub struct SelectionVector {
    indices: Vec<usize>,
}

impl SelectionVector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_indices(indices: Vec<usize>) -> Self {
        Self { indices }
    }

    pub fn push(&mut self, row: usize) {
        self.indices.push(row);
    }

    #[inline]
    pub fn index(&self, position: usize) -> usize {
        self.indices[position]
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn clear(&mut self) {
        self.indices.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.indices.iter().copied()
    }
}
