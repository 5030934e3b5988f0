//! Form decoding: urlencoded request values into a typed schema instance.
//!
//! Every field starts at its `Default` value. A form value with the field's
//! wire name overrides it after coercion to the field's kind; absent and
//! empty values are left alone, so required-field checks belong to the
//! resource handler.

use std::fmt::Display;

use serde_json::{Number, Value};
use url::form_urlencoded;

use crate::{
    error::{DecodeError, SchemaError},
    schema::{FieldCache, FieldDescriptor, FieldKind, Schema},
};

/// Ordered name/value pairs collected from a request.
///
/// Lookups return the first value for a name, so sources pushed earlier take
/// precedence over later ones.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormValues {
    pairs: Vec<(String, String)>,
}

impl FormValues {
    /// Create an empty set of values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse an `application/x-www-form-urlencoded` payload.
    #[must_use]
    pub fn parse(input: &[u8]) -> Self {
        let mut values = Self::new();
        values.extend_urlencoded(input);
        values
    }

    /// Append the pairs of an urlencoded payload after the existing ones.
    pub fn extend_urlencoded(&mut self, input: &[u8]) {
        self.pairs.extend(
            form_urlencoded::parse(input).map(|(k, v)| (k.into_owned(), v.into_owned())),
        );
    }

    /// Append a single pair.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.pairs.push((name.into(), value.into()));
    }

    /// First value for `name`, if any.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FormValues {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self { pairs: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect() }
    }
}

/// Boolean form rule: only `"true"` and `"1"` are true; every other value,
/// `"yes"` included, is false rather than an error.
#[must_use]
pub fn parse_bool(raw: &str) -> bool {
    raw == "true" || raw == "1"
}

/// Decode `form` into a fresh `T`.
///
/// Fields are visited in declaration order and the first value that fails to
/// convert aborts the decode.
///
/// # Errors
/// Returns [`DecodeError::InvalidValue`] naming the offending field,
/// [`DecodeError::Schema`] if `T` cannot be described, or
/// [`DecodeError::Convert`] if the populated record does not deserialize.
pub fn decode<T: Schema>(cache: &FieldCache, form: &FormValues) -> Result<T, DecodeError> {
    let fields = cache.fields::<T>()?;

    let defaults = serde_json::to_value(T::default()).map_err(|source| SchemaError::DefaultValue {
        type_name: std::any::type_name::<T>(),
        source,
    })?;
    let Value::Object(mut record) = defaults else {
        return Err(SchemaError::NotARecord { type_name: std::any::type_name::<T>() }.into());
    };

    for field in fields.iter() {
        let Some(raw) = form.get(&field.name).filter(|v| !v.is_empty()) else {
            continue;
        };
        if let Some(value) = coerce(field, raw)? {
            record.insert(field.name.clone(), value);
        }
    }

    serde_json::from_value(Value::Object(record)).map_err(DecodeError::Convert)
}

fn coerce(field: &FieldDescriptor, raw: &str) -> Result<Option<Value>, DecodeError> {
    let value = match field.kind {
        FieldKind::String => Value::String(raw.to_owned()),
        FieldKind::Int(width) => {
            let parsed: i64 = raw.parse().map_err(|e| invalid(field, raw, e))?;
            if !width.fits_signed(parsed) {
                return Err(invalid(field, raw, "value out of range"));
            }
            Value::from(parsed)
        }
        FieldKind::Uint(width) => {
            let parsed: u64 = raw.parse().map_err(|e| invalid(field, raw, e))?;
            if !width.fits_unsigned(parsed) {
                return Err(invalid(field, raw, "value out of range"));
            }
            Value::from(parsed)
        }
        FieldKind::Float(width) => {
            let parsed: f64 = raw.parse().map_err(|e| invalid(field, raw, e))?;
            let number = Number::from_f64(parsed).ok_or_else(|| invalid(field, raw, "value is not finite"))?;
            if !width.fits(parsed) {
                return Err(invalid(field, raw, "value out of range"));
            }
            Value::Number(number)
        }
        FieldKind::Bool => Value::Bool(parse_bool(raw)),
        FieldKind::Unsupported => return Ok(None),
    };
    Ok(Some(value))
}

fn invalid(field: &FieldDescriptor, raw: &str, reason: impl Display) -> DecodeError {
    DecodeError::InvalidValue {
        field: field.name.clone(),
        kind: field.kind,
        value: raw.to_owned(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use schemars::JsonSchema;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
    struct Widget {
        id: i64,
        name: String,
        #[serde(rename = "qty")]
        quantity: u16,
        price: f64,
        active: bool,
        tags: Vec<String>,
        note: Option<String>,
        rank: Option<i32>,
    }

    fn form(pairs: &[(&str, &str)]) -> FormValues {
        pairs.iter().copied().collect()
    }

    fn decode_widget(pairs: &[(&str, &str)]) -> Result<Widget, DecodeError> {
        decode::<Widget>(&FieldCache::new(), &form(pairs))
    }

    #[test]
    fn form_values_first_value_wins() {
        let mut values = FormValues::parse(b"name=body&name=second");
        values.extend_urlencoded(b"name=query&extra=1");
        assert_eq!(values.get("name"), Some("body"));
        assert_eq!(values.get("extra"), Some("1"));
        assert_eq!(values.get("missing"), None);
        assert_eq!(values.len(), 4);
    }

    #[test]
    fn form_values_parse_percent_and_plus_encoding() {
        let values = FormValues::parse(b"name=New+Test&note=a%26b");
        assert_eq!(values.get("name"), Some("New Test"));
        assert_eq!(values.get("note"), Some("a&b"));
    }

    #[test]
    fn decode_populates_matching_fields() {
        let widget = match decode_widget(&[
            ("id", "-7"),
            ("name", "New Test"),
            ("qty", "12"),
            ("price", "2.5"),
            ("active", "true"),
            ("note", "fragile"),
            ("rank", "3"),
        ]) {
            Ok(w) => w,
            Err(e) => panic!("decode failed: {e}"),
        };
        assert_eq!(
            widget,
            Widget {
                id: -7,
                name: "New Test".to_owned(),
                quantity: 12,
                price: 2.5,
                active: true,
                tags: Vec::new(),
                note: Some("fragile".to_owned()),
                rank: Some(3),
            }
        );
    }

    #[test]
    fn decode_absent_and_empty_values_keep_defaults() {
        let widget = match decode_widget(&[("name", ""), ("qty", "")]) {
            Ok(w) => w,
            Err(e) => panic!("decode failed: {e}"),
        };
        assert_eq!(widget, Widget::default());
    }

    #[test]
    fn decode_uses_wire_name_not_field_name() {
        let widget = match decode_widget(&[("quantity", "5")]) {
            Ok(w) => w,
            Err(e) => panic!("decode failed: {e}"),
        };
        assert_eq!(widget.quantity, 0, "only the renamed key 'qty' may populate the field");
    }

    #[test]
    fn decode_bool_accepts_only_true_and_one() {
        for (raw, expected) in [("true", true), ("1", true), ("false", false), ("0", false), ("yes", false), ("TRUE", false)] {
            let widget = match decode_widget(&[("active", raw)]) {
                Ok(w) => w,
                Err(e) => panic!("decode of {raw:?} failed: {e}"),
            };
            assert_eq!(widget.active, expected, "active={raw:?}");
        }
    }

    #[test]
    fn decode_invalid_integer_names_the_field() {
        match decode_widget(&[("name", "ok"), ("id", "12abc")]) {
            Err(DecodeError::InvalidValue { field, value, .. }) => {
                assert_eq!(field, "id");
                assert_eq!(value, "12abc");
            }
            other => panic!("expected InvalidValue, got {other:?}"),
        }
    }

    #[test]
    fn decode_rejects_values_outside_declared_width() {
        match decode_widget(&[("qty", "70000")]) {
            Err(DecodeError::InvalidValue { field, kind, .. }) => {
                assert_eq!(field, "qty");
                assert_eq!(kind, FieldKind::Uint(crate::schema::IntWidth::W16));
            }
            other => panic!("expected InvalidValue, got {other:?}"),
        }
        assert!(decode_widget(&[("qty", "-1")]).is_err(), "negative value for unsigned field");
    }

    #[test]
    fn decode_rejects_malformed_and_non_finite_floats() {
        assert!(matches!(decode_widget(&[("price", "cheap")]), Err(DecodeError::InvalidValue { .. })));
        assert!(matches!(decode_widget(&[("price", "inf")]), Err(DecodeError::InvalidValue { .. })));
    }

    #[derive(Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
    struct Reading {
        ratio: f32,
        serial: u128,
        enabled: bool,
    }

    impl Default for Reading {
        fn default() -> Self {
            Self { ratio: 1.0, serial: 0, enabled: true }
        }
    }

    #[test]
    fn decode_rejects_single_precision_overflow() {
        let mut values = FormValues::new();
        values.push("ratio", "1e300");
        match decode::<Reading>(&FieldCache::new(), &values) {
            Err(DecodeError::InvalidValue { field, reason, .. }) => {
                assert_eq!(field, "ratio");
                assert_eq!(reason, "value out of range");
            }
            other => panic!("expected InvalidValue, got {other:?}"),
        }

        let mut values = FormValues::new();
        values.push("ratio", "0.25");
        assert!(matches!(decode::<Reading>(&FieldCache::new(), &values), Ok(Reading { ratio, .. }) if ratio == 0.25));
    }

    #[test]
    fn decode_empty_bool_keeps_true_default() {
        for pairs in [&[("enabled", "")][..], &[][..]] {
            let reading = match decode::<Reading>(&FieldCache::new(), &form(pairs)) {
                Ok(r) => r,
                Err(e) => panic!("decode failed: {e}"),
            };
            assert!(reading.enabled, "empty or absent value must not run the boolean rule");
        }
        let reading = decode::<Reading>(&FieldCache::new(), &form(&[("enabled", "no")]));
        assert!(matches!(reading, Ok(Reading { enabled: false, .. })));
    }

    #[test]
    fn decode_wide_integers_accept_only_the_64_bit_range() {
        let max = u64::MAX.to_string();
        let reading = decode::<Reading>(&FieldCache::new(), &form(&[("serial", max.as_str())]));
        assert!(matches!(reading, Ok(Reading { serial, .. }) if serial == u128::from(u64::MAX)));

        let beyond = (u128::from(u64::MAX) + 1).to_string();
        let reading = decode::<Reading>(&FieldCache::new(), &form(&[("serial", beyond.as_str())]));
        assert!(matches!(reading, Err(DecodeError::InvalidValue { .. })));
    }

    #[test]
    fn decode_skips_unsupported_kinds() {
        let widget = match decode_widget(&[("tags", "a,b"), ("name", "x")]) {
            Ok(w) => w,
            Err(e) => panic!("decode failed: {e}"),
        };
        assert!(widget.tags.is_empty());
        assert_eq!(widget.name, "x");
    }

    #[test]
    fn decode_non_record_schema_is_an_error() {
        let result = decode::<String>(&FieldCache::new(), &FormValues::new());
        assert!(matches!(result, Err(DecodeError::Schema(SchemaError::NotARecord { .. }))));
    }

    proptest::proptest! {
        #[test]
        fn proptest_bool_is_false_unless_true_or_one(raw in "\\PC{1,12}") {
            proptest::prop_assume!(raw != "true" && raw != "1");
            proptest::prop_assert!(!parse_bool(&raw));
        }

        #[test]
        fn proptest_signed_integers_decode_exactly(id in proptest::prelude::any::<i64>()) {
            let widget = decode_widget(&[("id", id.to_string().as_str())]);
            let decoded_ok = matches!(widget, Ok(Widget { id: decoded, .. }) if decoded == id);
            proptest::prop_assert!(decoded_ok);
        }

        #[test]
        fn proptest_arbitrary_form_never_panics(
            pairs in proptest::collection::vec(("[a-z]{1,6}", "\\PC{0,16}"), 0..8usize),
        ) {
            let values: FormValues = pairs.into_iter().collect();
            let _ = decode::<Widget>(&FieldCache::new(), &values);
        }
    }
}
