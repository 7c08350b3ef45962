//! Output schema: what the service is told to emit, and the check applied to
//! what it actually emits.
//!
//! Both sides are derived from [`SECTIONS`], so the schema sent with the
//! request and the validation applied to the reply cannot drift apart.

use serde_json::{Map, Value, json};
use shezhen_core::TcmAnalysis;
use tracing::warn;

use crate::error::{AnalysisFailure, ResponseProblem};

/// Leaf type of a required field. Only strings and string lists exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Leaf {
    Text,
    TextList,
}

/// A required top-level object and its required fields.
#[derive(Debug, Clone, Copy)]
pub struct Section {
    pub name: &'static str,
    pub fields: &'static [(&'static str, Leaf)],
}

/// The complete required shape of an analysis, in wire field names.
pub const SECTIONS: &[Section] = &[
    Section {
        name: "visualFeatures",
        fields: &[
            ("color", Leaf::Text),
            ("shape", Leaf::Text),
            ("coating", Leaf::Text),
            ("moisture", Leaf::Text),
        ],
    },
    Section {
        name: "diagnosis",
        fields: &[("mainSyndrome", Leaf::Text), ("explanation", Leaf::Text)],
    },
    Section {
        name: "recommendations",
        fields: &[
            ("dietary", Leaf::TextList),
            ("lifestyle", Leaf::TextList),
            ("herbalIngredients", Leaf::TextList),
        ],
    },
];

fn leaf_schema(leaf: Leaf) -> Value {
    match leaf {
        Leaf::Text => json!({ "type": "STRING" }),
        Leaf::TextList => json!({ "type": "ARRAY", "items": { "type": "STRING" } }),
    }
}

/// The `responseSchema` descriptor: every object field required, leaves are
/// strings or string arrays only.
#[must_use]
pub fn response_schema() -> Value {
    let mut properties = Map::new();
    for section in SECTIONS {
        let mut fields = Map::new();
        for (name, leaf) in section.fields {
            fields.insert((*name).to_string(), leaf_schema(*leaf));
        }
        let required: Vec<&str> = section.fields.iter().map(|(name, _)| *name).collect();
        properties.insert(
            section.name.to_string(),
            json!({ "type": "OBJECT", "properties": fields, "required": required }),
        );
    }
    let required: Vec<&str> = SECTIONS.iter().map(|s| s.name).collect();
    json!({ "type": "OBJECT", "properties": properties, "required": required })
}

/// A JSON sketch of the shape with `"..."` placeholders, for embedding in
/// the instruction text.
#[must_use]
pub fn shape_sketch() -> String {
    let mut out = String::from("{\n");
    for (i, section) in SECTIONS.iter().enumerate() {
        let fields: Vec<String> = section
            .fields
            .iter()
            .map(|(name, leaf)| match leaf {
                Leaf::Text => format!("\"{name}\": \"...\""),
                Leaf::TextList => format!("\"{name}\": [\"...\", \"...\"]"),
            })
            .collect();
        let sep = if i + 1 < SECTIONS.len() { "," } else { "" };
        out.push_str(&format!("  \"{}\": {{ {} }}{sep}\n", section.name, fields.join(", ")));
    }
    out.push('}');
    out
}

/// Required fields that are absent or null, as dotted paths.
///
/// A missing section is reported once, without listing its fields.
#[must_use]
pub fn missing_fields(value: &Value) -> Vec<String> {
    let Some(root) = value.as_object() else {
        return SECTIONS.iter().map(|s| s.name.to_string()).collect();
    };

    let mut missing = Vec::new();
    for section in SECTIONS {
        match root.get(section.name) {
            None | Some(Value::Null) => missing.push(section.name.to_string()),
            Some(Value::Object(obj)) => {
                for (field, _) in section.fields {
                    if obj.get(*field).is_none_or(Value::is_null) {
                        missing.push(format!("{}.{field}", section.name));
                    }
                }
            }
            // Wrong type, not missing; the typed decode reports it.
            Some(_) => {}
        }
    }
    missing
}

/// Parse and validate a raw response text.
///
/// Content is passed through verbatim; nothing is trimmed, translated or
/// sanitised.
///
/// # Errors
/// `MalformedResponse` with `InvalidJson` when the text does not parse, or
/// `ShapeMismatch` when required fields are missing or mistyped.
pub fn decode_analysis(text: &str) -> Result<TcmAnalysis, AnalysisFailure> {
    let value: Value = serde_json::from_str(text).map_err(|e| {
        warn!("analysis response is not valid JSON: {e}");
        AnalysisFailure::MalformedResponse {
            problem: ResponseProblem::InvalidJson,
            detail: e.to_string(),
        }
    })?;

    let missing = missing_fields(&value);
    if !missing.is_empty() {
        warn!(?missing, "analysis response is missing required fields");
        return Err(AnalysisFailure::MalformedResponse {
            detail: format!("missing required fields: {}", missing.join(", ")),
            problem: ResponseProblem::ShapeMismatch { missing },
        });
    }

    serde_json::from_value(value).map_err(|e| {
        warn!("analysis response has the wrong shape: {e}");
        AnalysisFailure::MalformedResponse {
            problem: ResponseProblem::ShapeMismatch { missing: Vec::new() },
            detail: e.to_string(),
        }
    })
}
