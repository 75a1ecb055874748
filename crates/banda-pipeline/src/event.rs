//! Decode event model.
//!
//! A decode event is the ordered list of key/value pairs a protocol decoder
//! extracted from one transmission: model name, device id, measurements.
//! The pipeline treats it as opaque data; the only consumer that looks
//! inside is the dedup fingerprint.

/// The kind of a [`Value`], used when arrays are summarized by shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// Signed integer.
    Int,
    /// Double-precision float.
    Double,
    /// UTF-8 string.
    Str,
    /// Nested array.
    Array,
}

impl ValueKind {
    /// Stable one-byte tag for hashing.
    pub(crate) fn tag(self) -> u8 {
        match self {
            ValueKind::Int => 0,
            ValueKind::Double => 1,
            ValueKind::Str => 2,
            ValueKind::Array => 3,
        }
    }
}

/// A single decoded field value.
///
/// Integers take the 32-bit range the supported wire formats produce.
/// Arrays are carried as a shape summary (element kind and count): the
/// pipeline never needs array contents, only a stable identity for
/// fingerprinting.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Signed integer value.
    Int(i32),
    /// Double-precision value.
    Double(f64),
    /// String value.
    Str(String),
    /// Array summarized by element kind and length.
    Array {
        /// Kind of the array elements.
        kind: ValueKind,
        /// Number of elements.
        count: u32,
    },
}

/// An ordered key/value record emitted by a protocol decoder.
///
/// Field order is part of the event's identity: two events with the same
/// pairs in a different order fingerprint differently, matching how decoders
/// emit fields in a fixed protocol-defined order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodeEvent {
    fields: Vec<(String, Value)>,
}

impl DecodeEvent {
    /// Create an empty event.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a field, preserving insertion order.
    pub fn push(&mut self, key: impl Into<String>, value: Value) {
        self.fields.push((key.into(), value));
    }

    /// Builder-style [`push`](Self::push).
    pub fn with(mut self, key: impl Into<String>, value: Value) -> Self {
        self.push(key, value);
        self
    }

    /// Fields in insertion order.
    pub fn fields(&self) -> &[(String, Value)] {
        &self.fields
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// True when the event carries no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Value for `key`, if present (first match wins).
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }
}
