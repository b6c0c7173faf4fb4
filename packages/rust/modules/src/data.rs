//! Readers for the structured analysis input.
//!
//! Every reader distinguishes "absent" (`Ok(None)`, which the module turns into
//! its no-data block) from "present but malformed" (`Err`, a generation failure).

use serde_json::Value;

use reportforge_shared::{AnalysisInput, ChartPoint, ModuleError};

/// Subject used when the input does not name one.
const DEFAULT_SUBJECT: &str = "the organization";

/// A labelled scalar, e.g. a segment and its size.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub label: String,
    pub value: f64,
}

/// One named series of values.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub name: String,
    pub values: Vec<f64>,
}

/// Named series aligned against shared axis labels (radar axes or periods).
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesTable {
    pub axes: Vec<String>,
    pub series: Vec<Series>,
}

impl SeriesTable {
    /// Mean of each axis across all series.
    pub fn axis_means(&self) -> Vec<f64> {
        (0..self.axes.len())
            .map(|i| mean(self.series.iter().map(|s| s.values[i])))
            .collect()
    }
}

/// The report subject (`input.subject`).
pub fn subject(input: &AnalysisInput) -> &str {
    input
        .get("subject")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_SUBJECT)
}

/// The object stored under a module's id.
pub fn section<'a>(input: &'a AnalysisInput, id: &str) -> Result<Option<&'a Value>, ModuleError> {
    match input.get(id) {
        None | Some(Value::Null) => Ok(None),
        Some(value @ Value::Object(_)) => Ok(Some(value)),
        Some(other) => Err(ModuleError::generation(format!(
            "section '{id}' must be an object, got {}",
            type_name(other)
        ))),
    }
}

/// `[{"label": .., "value": ..}, ..]` under `field`.
pub fn entries(section: &Value, field: &str) -> Result<Option<Vec<Entry>>, ModuleError> {
    let Some(items) = array(section, field)? else {
        return Ok(None);
    };
    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let ctx = format!("{field}[{i}]");
            Ok(Entry {
                label: required_str(item, "label", &ctx)?,
                value: required_number(item, "value", &ctx)?,
            })
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Some)
}

/// `[{"label": .., "x": .., "y": .., "size": ..?}, ..]` under `field`.
pub fn points(section: &Value, field: &str) -> Result<Option<Vec<ChartPoint>>, ModuleError> {
    let Some(items) = array(section, field)? else {
        return Ok(None);
    };
    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let ctx = format!("{field}[{i}]");
            let size = match item.get("size") {
                None | Some(Value::Null) => None,
                Some(v) => Some(finite(v, &format!("{ctx}.size"))?),
            };
            Ok(ChartPoint {
                label: required_str(item, "label", &ctx)?,
                x: required_number(item, "x", &ctx)?,
                y: required_number(item, "y", &ctx)?,
                size,
            })
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Some)
}

/// Axis labels under `axes_field` plus `[{"name": .., "values": [..]}]` under
/// `series_field`. Every series must have one value per axis.
pub fn series_table(
    section: &Value,
    axes_field: &str,
    series_field: &str,
) -> Result<Option<SeriesTable>, ModuleError> {
    let (Some(axes), Some(items)) = (array(section, axes_field)?, array(section, series_field)?)
    else {
        return Ok(None);
    };

    let axes = axes
        .iter()
        .enumerate()
        .map(|(i, v)| {
            v.as_str().map(str::to_string).ok_or_else(|| {
                ModuleError::generation(format!("{axes_field}[{i}] must be a string"))
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut series = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        let ctx = format!("{series_field}[{i}]");
        let name = required_str(item, "name", &ctx)?;
        let raw = item
            .get("values")
            .and_then(Value::as_array)
            .ok_or_else(|| ModuleError::generation(format!("{ctx}.values must be an array")))?;
        if raw.len() != axes.len() {
            return Err(ModuleError::generation(format!(
                "{ctx} has {} values for {} {axes_field}",
                raw.len(),
                axes.len()
            )));
        }
        let values = raw
            .iter()
            .enumerate()
            .map(|(j, v)| finite(v, &format!("{ctx}.values[{j}]")))
            .collect::<Result<Vec<_>, _>>()?;
        series.push(Series { name, values });
    }

    Ok(Some(SeriesTable { axes, series }))
}

/// A module's section together with its entries, or `None` when either is absent.
pub fn section_entries<'a>(
    input: &'a AnalysisInput,
    id: &str,
    field: &str,
) -> Result<Option<(&'a Value, Vec<Entry>)>, ModuleError> {
    let Some(section) = section(input, id)? else {
        return Ok(None);
    };
    Ok(entries(section, field)?.map(|list| (section, list)))
}

/// A module's points, or `None` when the section or field is absent.
pub fn section_points(
    input: &AnalysisInput,
    id: &str,
    field: &str,
) -> Result<Option<Vec<ChartPoint>>, ModuleError> {
    match section(input, id)? {
        Some(section) => points(section, field),
        None => Ok(None),
    }
}

/// A module's series table, or `None` when the section or either field is absent.
pub fn section_table(
    input: &AnalysisInput,
    id: &str,
    axes_field: &str,
    series_field: &str,
) -> Result<Option<SeriesTable>, ModuleError> {
    match section(input, id)? {
        Some(section) => series_table(section, axes_field, series_field),
        None => Ok(None),
    }
}

/// Optional finite number under `field`.
pub fn number(section: &Value, field: &str) -> Result<Option<f64>, ModuleError> {
    match section.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => finite(v, field).map(Some),
    }
}

/// Optional non-empty string under `field`.
pub fn text(section: &Value, field: &str) -> Result<Option<String>, ModuleError> {
    match section.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.trim().to_string()).filter(|s| !s.is_empty())),
        Some(other) => Err(ModuleError::generation(format!(
            "{field} must be a string, got {}",
            type_name(other)
        ))),
    }
}

// ---------------------------------------------------------------------------
// Small numeric helpers shared by the sections
// ---------------------------------------------------------------------------

pub fn total(entries: &[Entry]) -> f64 {
    entries.iter().map(|e| e.value).sum()
}

pub fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    if count == 0 { 0.0 } else { sum / count as f64 }
}

/// Largest entry; ties resolve to the earliest one.
pub fn largest(entries: &[Entry]) -> Option<&Entry> {
    entries
        .iter()
        .fold(None, |best: Option<&Entry>, e| match best {
            Some(b) if b.value >= e.value => Some(b),
            _ => Some(e),
        })
}

/// Entries sorted by descending value, stable for ties.
pub fn ranked(entries: &[Entry]) -> Vec<&Entry> {
    let mut sorted: Vec<&Entry> = entries.iter().collect();
    sorted.sort_by(|a, b| b.value.total_cmp(&a.value));
    sorted
}

/// Require a strictly positive total, the precondition of every share computation.
pub fn positive_total(entries: &[Entry], what: &str) -> Result<f64, ModuleError> {
    if entries.iter().any(|e| e.value < 0.0) {
        return Err(ModuleError::generation(format!("{what} must not be negative")));
    }
    let sum = total(entries);
    if !sum.is_finite() {
        return Err(ModuleError::generation(format!("{what} total is not finite")));
    }
    if sum <= 0.0 {
        return Err(ModuleError::generation(format!("{what} sum to zero")));
    }
    Ok(sum)
}

pub fn labels(entries: &[Entry]) -> Vec<String> {
    entries.iter().map(|e| e.label.clone()).collect()
}

pub fn values(entries: &[Entry]) -> Vec<f64> {
    entries.iter().map(|e| e.value).collect()
}

// ---------------------------------------------------------------------------
// Internals
// ---------------------------------------------------------------------------

/// A non-empty array under `field`; missing, null and `[]` all read as absent.
fn array<'a>(section: &'a Value, field: &str) -> Result<Option<&'a Vec<Value>>, ModuleError> {
    match section.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Array(items)) if items.is_empty() => Ok(None),
        Some(Value::Array(items)) => Ok(Some(items)),
        Some(other) => Err(ModuleError::generation(format!(
            "{field} must be an array, got {}",
            type_name(other)
        ))),
    }
}

fn required_str(item: &Value, key: &str, ctx: &str) -> Result<String, ModuleError> {
    item.get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| ModuleError::generation(format!("{ctx}.{key} must be a string")))
}

fn required_number(item: &Value, key: &str, ctx: &str) -> Result<f64, ModuleError> {
    let value = item
        .get(key)
        .ok_or_else(|| ModuleError::generation(format!("{ctx}.{key} is missing")))?;
    finite(value, &format!("{ctx}.{key}"))
}

fn finite(value: &Value, ctx: &str) -> Result<f64, ModuleError> {
    value
        .as_f64()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ModuleError::generation(format!("{ctx} must be a finite number")))
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
