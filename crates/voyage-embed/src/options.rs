use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::types::ProviderOptions;

/// Namespace key under which voyage options live in a [`ProviderOptions`] bag.
pub const VOYAGE_OPTIONS_KEY: &str = "voyage";

/// Declares a closed string enum whose wire names live in one table.
macro_rules! wire_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $wire:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALLOWED: &'static [&'static str] = &[$($wire),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $wire),+
                }
            }
        }

        impl FromStr for $name {
            type Err = ();

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($wire => Ok(Self::$variant),)+
                    _ => Err(()),
                }
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }
    };
}

wire_enum! {
    /// Selects the prompt prefix the service prepends to every input.
    InputType {
        Query => "query",
        Document => "document",
    }
}

wire_enum! {
    /// Numeric encoding of the returned vector components.
    OutputDtype {
        Float => "float",
        Int8 => "int8",
        Uint8 => "uint8",
        Binary => "binary",
        Ubinary => "ubinary",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationReason {
    TypeMismatch { expected: &'static str },
    InvalidEnumValue { allowed: &'static [&'static str] },
}

impl fmt::Display for ValidationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TypeMismatch { expected } => write!(f, "expected {expected}"),
            Self::InvalidEnumValue { allowed } => {
                write!(f, "expected one of {}", allowed.join(", "))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}: {reason}", field_label(.field))]
pub struct OptionsValidationError {
    /// Dotted path of the offending field; empty when the options value itself is wrong.
    pub field: String,
    pub reason: ValidationReason,
}

impl OptionsValidationError {
    fn type_mismatch(field: &str, expected: &'static str) -> Self {
        Self {
            field: field.to_string(),
            reason: ValidationReason::TypeMismatch { expected },
        }
    }

    fn invalid_enum(field: &str, allowed: &'static [&'static str]) -> Self {
        Self {
            field: field.to_string(),
            reason: ValidationReason::InvalidEnumValue { allowed },
        }
    }

    fn under(mut self, prefix: &str) -> Self {
        self.field = if self.field.is_empty() {
            prefix.to_string()
        } else {
            format!("{prefix}.{}", self.field)
        };
        self
    }
}

/// Request-time options for the contextualized embeddings endpoint.
///
/// Every field is optional; an absent field leaves the remote default in place.
/// Combinations are not cross-checked locally.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VoyageEmbeddingOptions {
    pub input_type: Option<InputType>,
    pub output_dimension: Option<u32>,
    pub output_dtype: Option<OutputDtype>,
    pub truncation: Option<bool>,
}

impl VoyageEmbeddingOptions {
    /// Validates a loosely typed options value.
    ///
    /// Unrecognized keys are ignored and `null` counts as absent.
    pub fn validate(raw: Option<&Value>) -> Result<Self, OptionsValidationError> {
        let obj = match raw {
            None | Some(Value::Null) => return Ok(Self::default()),
            Some(Value::Object(obj)) => obj,
            Some(_) => return Err(OptionsValidationError::type_mismatch("", "object")),
        };

        let input_type = match present(obj, "inputType") {
            None => None,
            Some(Value::String(s)) => Some(s.parse::<InputType>().map_err(|()| {
                OptionsValidationError::invalid_enum("inputType", InputType::ALLOWED)
            })?),
            Some(_) => return Err(OptionsValidationError::type_mismatch("inputType", "string")),
        };

        let output_dimension = match present(obj, "outputDimension") {
            None => None,
            Some(v) => Some(positive_dimension(v).ok_or_else(|| {
                OptionsValidationError::type_mismatch("outputDimension", "positive integer")
            })?),
        };

        let output_dtype = match present(obj, "outputDtype") {
            None => None,
            Some(Value::String(s)) => Some(s.parse::<OutputDtype>().map_err(|()| {
                OptionsValidationError::invalid_enum("outputDtype", OutputDtype::ALLOWED)
            })?),
            Some(_) => return Err(OptionsValidationError::type_mismatch("outputDtype", "string")),
        };

        let truncation = match present(obj, "truncation") {
            None => None,
            Some(Value::Bool(b)) => Some(*b),
            Some(_) => return Err(OptionsValidationError::type_mismatch("truncation", "boolean")),
        };

        Ok(Self {
            input_type,
            output_dimension,
            output_dtype,
            truncation,
        })
    }

    pub fn with_input_type(mut self, input_type: InputType) -> Self {
        self.input_type = Some(input_type);
        self
    }

    pub fn with_output_dimension(mut self, dimension: u32) -> Self {
        self.output_dimension = Some(dimension);
        self
    }

    pub fn with_output_dtype(mut self, dtype: OutputDtype) -> Self {
        self.output_dtype = Some(dtype);
        self
    }

    pub fn with_truncation(mut self, truncation: bool) -> Self {
        self.truncation = Some(truncation);
        self
    }

    /// Renders these options as a provider options bag namespaced under `voyage`.
    pub fn to_provider_options(&self) -> ProviderOptions {
        let mut inner = Map::new();
        if let Some(t) = self.input_type {
            inner.insert("inputType".to_string(), Value::String(t.as_str().to_string()));
        }
        if let Some(d) = self.output_dimension {
            inner.insert("outputDimension".to_string(), Value::Number(d.into()));
        }
        if let Some(d) = self.output_dtype {
            inner.insert("outputDtype".to_string(), Value::String(d.as_str().to_string()));
        }
        if let Some(t) = self.truncation {
            inner.insert("truncation".to_string(), Value::Bool(t));
        }

        let mut bag = ProviderOptions::new();
        bag.insert(VOYAGE_OPTIONS_KEY.to_string(), Value::Object(inner));
        bag
    }
}

/// Pulls the `provider_key` entry out of `bag` and validates it.
pub fn parse_provider_options(
    bag: &ProviderOptions,
    provider_key: &str,
) -> Result<VoyageEmbeddingOptions, OptionsValidationError> {
    VoyageEmbeddingOptions::validate(bag.get(provider_key)).map_err(|e| e.under(provider_key))
}

/// Accepts any JSON number with an integral positive value, including `512.0`.
#[allow(clippy::float_cmp, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn positive_dimension(v: &Value) -> Option<u32> {
    if let Some(d) = v.as_u64() {
        return u32::try_from(d).ok().filter(|d| *d > 0);
    }
    let f = v.as_f64()?;
    (f > 0.0 && f.fract() == 0.0 && f <= f64::from(u32::MAX)).then_some(f as u32)
}

fn field_label(field: &str) -> &str {
    if field.is_empty() { "options" } else { field }
}

fn present<'a>(obj: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    obj.get(key).filter(|v| !v.is_null())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn absent_options_yield_defaults() {
        assert_eq!(
            VoyageEmbeddingOptions::validate(None),
            Ok(VoyageEmbeddingOptions::default())
        );
        assert_eq!(
            VoyageEmbeddingOptions::validate(Some(&Value::Null)),
            Ok(VoyageEmbeddingOptions::default())
        );
    }

    #[test]
    fn recognized_fields_pass_through_unchanged() {
        let raw = json!({
            "inputType": "document",
            "outputDimension": 512,
            "outputDtype": "ubinary",
            "truncation": false,
        });
        let opts = VoyageEmbeddingOptions::validate(Some(&raw)).expect("valid options");
        assert_eq!(opts.input_type, Some(InputType::Document));
        assert_eq!(opts.output_dimension, Some(512));
        assert_eq!(opts.output_dtype, Some(OutputDtype::Ubinary));
        assert_eq!(opts.truncation, Some(false));
    }

    #[test]
    fn every_dtype_is_accepted() {
        for dtype in OutputDtype::ALLOWED {
            let raw = json!({ "outputDtype": dtype });
            let opts = VoyageEmbeddingOptions::validate(Some(&raw)).expect("valid dtype");
            assert_eq!(opts.output_dtype.map(OutputDtype::as_str), Some(*dtype));
        }
    }

    #[test]
    fn integral_float_dimension_is_accepted() {
        let raw = json!({ "outputDimension": 512.0 });
        let opts = VoyageEmbeddingOptions::validate(Some(&raw)).expect("valid dimension");
        assert_eq!(opts.output_dimension, Some(512));
    }

    #[test]
    fn wire_names_round_trip_through_the_enum_table() {
        for name in InputType::ALLOWED {
            let parsed: InputType = name.parse().expect("known input type");
            assert_eq!(parsed.as_str(), *name);
            assert_eq!(serde_json::to_value(parsed).expect("serialize"), json!(name));
        }
        for name in OutputDtype::ALLOWED {
            let parsed: OutputDtype = name.parse().expect("known dtype");
            assert_eq!(parsed.as_str(), *name);
            assert_eq!(serde_json::to_value(parsed).expect("serialize"), json!(name));
        }
        assert!("Query".parse::<InputType>().is_err());
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let raw = json!({ "encodingFormat": "base64", "truncation": true });
        let opts = VoyageEmbeddingOptions::validate(Some(&raw)).expect("valid options");
        assert_eq!(
            opts,
            VoyageEmbeddingOptions::default().with_truncation(true)
        );
    }

    #[test]
    fn bad_enum_value_names_the_field() {
        let raw = json!({ "inputType": "foo" });
        let err = VoyageEmbeddingOptions::validate(Some(&raw)).expect_err("invalid enum");
        assert_eq!(err.field, "inputType");
        assert_eq!(
            err.reason,
            ValidationReason::InvalidEnumValue {
                allowed: InputType::ALLOWED
            }
        );

        let raw = json!({ "outputDtype": "float16" });
        let err = VoyageEmbeddingOptions::validate(Some(&raw)).expect_err("invalid enum");
        assert_eq!(err.field, "outputDtype");
    }

    #[test]
    fn wrong_types_are_type_mismatches() {
        let cases = [
            (json!({ "inputType": 1 }), "inputType"),
            (json!({ "truncation": "yes" }), "truncation"),
            (json!({ "outputDimension": "512" }), "outputDimension"),
            (json!({ "outputDimension": 0 }), "outputDimension"),
            (json!({ "outputDimension": -256 }), "outputDimension"),
            (json!({ "outputDimension": 1.5 }), "outputDimension"),
            (json!({ "outputDimension": -512.0 }), "outputDimension"),
            (json!({ "outputDimension": 1e12 }), "outputDimension"),
            (json!({ "outputDtype": false }), "outputDtype"),
        ];
        for (raw, field) in cases {
            let err = VoyageEmbeddingOptions::validate(Some(&raw)).expect_err("type mismatch");
            assert_eq!(err.field, field);
            assert!(matches!(err.reason, ValidationReason::TypeMismatch { .. }));
        }
    }

    #[test]
    fn non_object_options_fail() {
        let err =
            VoyageEmbeddingOptions::validate(Some(&json!("query"))).expect_err("not an object");
        assert!(err.field.is_empty());
        assert_eq!(err.to_string(), "options: expected object");
    }

    #[test]
    fn provider_bag_errors_are_namespaced() {
        let mut bag = ProviderOptions::new();
        bag.insert("voyage".to_string(), json!({ "inputType": "passage" }));
        let err = parse_provider_options(&bag, VOYAGE_OPTIONS_KEY).expect_err("invalid");
        assert_eq!(err.field, "voyage.inputType");
        assert_eq!(
            err.to_string(),
            "voyage.inputType: expected one of query, document"
        );

        bag.insert("voyage".to_string(), json!(42));
        let err = parse_provider_options(&bag, VOYAGE_OPTIONS_KEY).expect_err("invalid");
        assert_eq!(err.field, "voyage");
    }

    #[test]
    fn other_providers_entries_are_not_inspected() {
        let mut bag = ProviderOptions::new();
        bag.insert("openai".to_string(), json!({ "inputType": 7 }));
        let opts = parse_provider_options(&bag, VOYAGE_OPTIONS_KEY).expect("valid");
        assert_eq!(opts, VoyageEmbeddingOptions::default());
    }

    #[test]
    fn typed_options_render_back_into_a_bag() {
        let opts = VoyageEmbeddingOptions::default()
            .with_input_type(InputType::Query)
            .with_output_dimension(256)
            .with_output_dtype(OutputDtype::Int8);
        let bag = opts.to_provider_options();
        assert_eq!(
            bag.get("voyage"),
            Some(&json!({ "inputType": "query", "outputDimension": 256, "outputDtype": "int8" }))
        );
        assert_eq!(parse_provider_options(&bag, VOYAGE_OPTIONS_KEY), Ok(opts));
    }
}
