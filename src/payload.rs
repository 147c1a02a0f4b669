//! Turns the free-text response of an external record source into typed
//! records.
//!
//! The response is expected to contain a JSON array of flat objects, possibly
//! wrapped in prose or a Markdown code fence. Recovery is limited to stripping
//! fences and slicing from the first `[` to the last `]`; anything that still
//! fails to parse is a [`ConsolidatorError::Parse`] carrying the raw text.

use crate::error::{ConsolidatorError, Result};
use crate::schema::{
    HierarchyLevel, Record, StatementCode, ACCOUNT_COLUMN, LEVEL_COLUMN, STATEMENT_COLUMN,
};
use log::debug;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Removes code fences and isolates the outermost array, if any.
pub fn isolate_array(raw: &str) -> &str {
    let trimmed = raw.trim();
    let unfenced = strip_code_fence(trimmed);

    if let (Some(start), Some(end)) = (unfenced.find('['), unfenced.rfind(']')) {
        if start < end {
            return &unfenced[start..=end];
        }
    }
    unfenced
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Drop the info string (e.g. `json`) on the opening line.
    let body = rest.split_once('\n').map(|(_, body)| body).unwrap_or(rest);
    body.trim_end()
        .strip_suffix("```")
        .unwrap_or(body)
        .trim()
}

/// Parses a raw response into records.
pub fn parse_records(raw: &str) -> Result<Vec<Record>> {
    let isolated = isolate_array(raw);

    let value: Value = serde_json::from_str(isolated).map_err(|e| ConsolidatorError::Parse {
        message: format!("response is not valid JSON: {}", e),
        raw: raw.to_string(),
    })?;

    let Value::Array(items) = value else {
        return Err(ConsolidatorError::Parse {
            message: "response is not a JSON array".to_string(),
            raw: raw.to_string(),
        });
    };

    let records = items
        .into_iter()
        .enumerate()
        .map(|(index, item)| match item {
            Value::Object(object) => record_from_object(index, object),
            other => Err(ConsolidatorError::InvalidRecord {
                index,
                details: format!("expected an object, found {}", json_kind(&other)),
            }),
        })
        .collect::<Result<Vec<_>>>()?;

    debug!("Parsed {} records from {} bytes of response", records.len(), raw.len());
    Ok(records)
}

fn record_from_object(index: usize, mut object: Map<String, Value>) -> Result<Record> {
    let statement = object
        .remove(STATEMENT_COLUMN)
        .and_then(scalar_text)
        .ok_or_else(|| ConsolidatorError::InvalidRecord {
            index,
            details: format!("missing '{}'", STATEMENT_COLUMN),
        })?;

    let account_name = object
        .remove(ACCOUNT_COLUMN)
        .and_then(scalar_text)
        .ok_or_else(|| ConsolidatorError::InvalidRecord {
            index,
            details: format!("missing '{}'", ACCOUNT_COLUMN),
        })?;

    let hierarchy_level = object
        .remove(LEVEL_COLUMN)
        .map(|v| level_from_value(&v))
        .unwrap_or_default();

    let mut period_values = BTreeMap::new();
    for (label, value) in object {
        let amount = match &value {
            Value::Array(_) | Value::Object(_) => {
                return Err(ConsolidatorError::InvalidRecord {
                    index,
                    details: format!("period '{}' holds a nested {}", label, json_kind(&value)),
                })
            }
            other => coerce_amount(other),
        };
        period_values.insert(label, amount);
    }

    Ok(Record {
        statement_code: StatementCode::parse(&statement),
        hierarchy_level,
        account_name,
        period_values,
    })
}

fn scalar_text(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

fn level_from_value(value: &Value) -> HierarchyLevel {
    let numeric = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match numeric {
        Some(n) if n.fract() == 0.0 && (1.0..=3.0).contains(&n) => HierarchyLevel::from(n as u8),
        _ => HierarchyLevel::Detail,
    }
}

/// Numbers pass through; numeric strings are parsed (thousands separators and
/// accounting parentheses allowed); everything else, and non-finite results,
/// become zero.
pub fn coerce_amount(value: &Value) -> f64 {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_amount_text(s),
        _ => None,
    };
    parsed.filter(|v| v.is_finite()).unwrap_or(0.0)
}

fn parse_amount_text(text: &str) -> Option<f64> {
    let compact: String = text.trim().chars().filter(|c| *c != ',').collect();
    if let Some(inner) = compact
        .strip_prefix('(')
        .and_then(|rest| rest.strip_suffix(')'))
    {
        return inner.trim().parse::<f64>().ok().map(|v| -v);
    }
    compact.parse::<f64>().ok()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
