//! Schema reflection: field descriptors derived from a resource type.
//!
//! A schema type is any plain record that derives `serde` and
//! `schemars::JsonSchema`. Its JSON Schema is generated once, flattened into
//! an ordered list of [`FieldDescriptor`]s and memoized per type in a
//! [`FieldCache`].

use std::{
    any::{type_name, TypeId},
    collections::HashMap,
    fmt,
    sync::{Arc, RwLock},
};

use schemars::JsonSchema;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::error::SchemaError;

/// A resource type that can be described, defaulted and decoded from a form.
///
/// Blanket-implemented; derive `Serialize`, `Deserialize`, `JsonSchema` and
/// `Default` on a record to make it a schema. Wire names follow the serde
/// attributes (`rename`, `rename_all`).
pub trait Schema: JsonSchema + Serialize + DeserializeOwned + Default + Send + 'static {}

impl<T> Schema for T where T: JsonSchema + Serialize + DeserializeOwned + Default + Send + 'static {}

/// Bit width of an integer field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntWidth {
    W8,
    W16,
    W32,
    W64,
    /// `i128` / `u128`. Form values still travel through a 64-bit JSON
    /// number, so only the 64-bit range decodes; larger values are rejected.
    W128,
    /// Pointer-sized (`isize` / `usize`).
    Size,
}

impl IntWidth {
    fn from_format(format: Option<&str>, prefix: &str) -> Self {
        match format.and_then(|f| f.strip_prefix(prefix)) {
            Some("8") => Self::W8,
            Some("16") => Self::W16,
            Some("32") => Self::W32,
            Some("128") => Self::W128,
            Some("") => Self::Size,
            _ => Self::W64,
        }
    }

    /// Whether a parsed 64-bit signed value fits this width.
    #[must_use]
    pub fn fits_signed(self, value: i64) -> bool {
        match self {
            Self::W8 => i8::try_from(value).is_ok(),
            Self::W16 => i16::try_from(value).is_ok(),
            Self::W32 => i32::try_from(value).is_ok(),
            Self::Size => isize::try_from(value).is_ok(),
            Self::W64 | Self::W128 => true,
        }
    }

    /// Whether a parsed 64-bit unsigned value fits this width.
    #[must_use]
    pub fn fits_unsigned(self, value: u64) -> bool {
        match self {
            Self::W8 => u8::try_from(value).is_ok(),
            Self::W16 => u16::try_from(value).is_ok(),
            Self::W32 => u32::try_from(value).is_ok(),
            Self::Size => usize::try_from(value).is_ok(),
            Self::W64 | Self::W128 => true,
        }
    }

    fn suffix(self) -> &'static str {
        match self {
            Self::W8 => "8",
            Self::W16 => "16",
            Self::W32 => "32",
            Self::W64 => "64",
            Self::W128 => "128",
            Self::Size => "size",
        }
    }
}

/// Precision of a floating point field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FloatWidth {
    F32,
    F64,
}

impl FloatWidth {
    fn from_format(format: Option<&str>) -> Self {
        match format {
            Some("float") => Self::F32,
            _ => Self::F64,
        }
    }

    /// Whether a finite parsed value stays finite at this precision.
    #[must_use]
    pub fn fits(self, value: f64) -> bool {
        match self {
            Self::F32 => (f64::from(f32::MIN)..=f64::from(f32::MAX)).contains(&value),
            Self::F64 => value.is_finite(),
        }
    }
}

/// The primitive kind of a schema field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    String,
    Int(IntWidth),
    Uint(IntWidth),
    Float(FloatWidth),
    Bool,
    /// Anything else (nested records, sequences, maps). Recorded but never
    /// decoded from a form.
    Unsupported,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String => f.write_str("string"),
            Self::Int(width) => write!(f, "int{}", width.suffix()),
            Self::Uint(width) => write!(f, "uint{}", width.suffix()),
            Self::Float(FloatWidth::F32) => f.write_str("float32"),
            Self::Float(FloatWidth::F64) => f.write_str("float64"),
            Self::Bool => f.write_str("bool"),
            Self::Unsupported => f.write_str("unsupported"),
        }
    }
}

/// One serializable field of a schema type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// Wire name used both in JSON output and as the form key.
    pub name: String,
    /// Primitive kind the form value is coerced to.
    pub kind: FieldKind,
    /// `Option<_>` field; an absent form value leaves it `None`.
    pub nullable: bool,
    /// Declaration position within the record.
    pub index: usize,
}

/// Reflect over `T` and return its fields in declaration order.
///
/// # Errors
/// Returns [`SchemaError::NotARecord`] if `T` is not a struct with named
/// fields.
pub fn describe<T: JsonSchema>() -> Result<Vec<FieldDescriptor>, SchemaError> {
    let schema = schemars::schema_for!(T);
    let root = schema.as_value();

    if root.get("type").and_then(Value::as_str) != Some("object") {
        return Err(SchemaError::NotARecord { type_name: type_name::<T>() });
    }

    let Some(properties) = root.get("properties") else {
        return Ok(Vec::new());
    };
    let properties = properties
        .as_object()
        .ok_or(SchemaError::NotARecord { type_name: type_name::<T>() })?;

    Ok(properties
        .iter()
        .enumerate()
        .map(|(index, (name, property))| {
            let (kind, nullable) = classify(property);
            FieldDescriptor { name: name.clone(), kind, nullable, index }
        })
        .collect())
}

fn classify(property: &Value) -> (FieldKind, bool) {
    let (ty, nullable) = match property.get("type") {
        Some(Value::String(ty)) => (ty.as_str(), false),
        // `Option<T>` renders as `["<ty>", "null"]`.
        Some(Value::Array(types)) if types.len() == 2 => {
            let mut concrete = types.iter().filter_map(Value::as_str).filter(|t| *t != "null");
            match (concrete.next(), concrete.next()) {
                (Some(ty), None) => (ty, true),
                _ => return (FieldKind::Unsupported, false),
            }
        }
        _ => return (FieldKind::Unsupported, false),
    };

    let format = property.get("format").and_then(Value::as_str);
    let kind = match ty {
        "string" if property.get("enum").is_none() => FieldKind::String,
        "boolean" => FieldKind::Bool,
        "number" => FieldKind::Float(FloatWidth::from_format(format)),
        "integer" if format.is_some_and(|f| f.starts_with("uint")) => {
            FieldKind::Uint(IntWidth::from_format(format, "uint"))
        }
        "integer" => FieldKind::Int(IntWidth::from_format(format, "int")),
        _ => FieldKind::Unsupported,
    };
    (kind, nullable)
}

/// Memoized field descriptors, keyed by schema type.
///
/// Reads take a shared lock; the first request for a type computes the
/// descriptors outside the lock and inserts them. Two callers racing on the
/// same type both compute the same list, and the later insert wins.
#[derive(Debug, Default)]
pub struct FieldCache {
    entries: RwLock<HashMap<TypeId, Arc<[FieldDescriptor]>>>,
}

impl FieldCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the fields of `T`, computing them on first use.
    ///
    /// # Errors
    /// Propagates [`SchemaError`] from [`describe`]. Failures are not cached.
    ///
    /// # Panics
    /// Panics if the internal `RwLock` is poisoned.
    pub fn fields<T: JsonSchema + 'static>(&self) -> Result<Arc<[FieldDescriptor]>, SchemaError> {
        let key = TypeId::of::<T>();

        {
            #[expect(clippy::expect_used, reason = "lock poisoning is unrecoverable")]
            let entries = self.entries.read().expect("field cache read lock poisoned");
            if let Some(fields) = entries.get(&key) {
                return Ok(Arc::clone(fields));
            }
        }

        let fields: Arc<[FieldDescriptor]> = describe::<T>()?.into();
        tracing::debug!(schema = type_name::<T>(), fields = fields.len(), "cached schema fields");

        #[expect(clippy::expect_used, reason = "lock poisoning is unrecoverable")]
        self.entries
            .write()
            .expect("field cache write lock poisoned")
            .insert(key, Arc::clone(&fields));
        Ok(fields)
    }

    /// Number of schema types cached so far.
    ///
    /// # Panics
    /// Panics if the internal `RwLock` is poisoned.
    #[must_use]
    pub fn len(&self) -> usize {
        #[expect(clippy::expect_used, reason = "lock poisoning is unrecoverable")]
        let entries = self.entries.read().expect("field cache read lock poisoned");
        entries.len()
    }

    /// Returns `true` if no type has been described yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
