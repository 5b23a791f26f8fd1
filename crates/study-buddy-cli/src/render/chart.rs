//! Bar-chart data from ```` ```chart-json ```` blocks.

use serde_json::Value;

/// Default key for bar labels.
pub const DEFAULT_X_KEY: &str = "name";
/// Default key for bar values.
pub const DEFAULT_Y_KEY: &str = "value";

const BAR_GLYPH: char = '█';

/// Rows of a bar chart and the keys that pick label and value.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartData {
    /// One JSON object per bar.
    pub rows: Vec<Value>,
    /// Key holding each bar's label.
    pub x_key: String,
    /// Key holding each bar's value.
    pub y_key: String,
}

/// A single bar, resolved from a row.
#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    /// Label shown beside the bar.
    pub label: String,
    /// Bar length in data units.
    pub value: f64,
}

impl ChartData {
    /// Chart over `rows` with the default keys.
    #[must_use]
    pub fn new(rows: Vec<Value>) -> Self {
        Self {
            rows,
            x_key: DEFAULT_X_KEY.to_string(),
            y_key: DEFAULT_Y_KEY.to_string(),
        }
    }

    /// Interpret parsed chart JSON.
    ///
    /// Accepts a bare array of rows, or an object `{ data, xKey?, yKey? }`.
    /// Anything else is not chart data.
    #[must_use]
    pub fn from_json(value: Value) -> Option<Self> {
        match value {
            Value::Array(rows) => Some(Self::new(rows)),
            Value::Object(mut object) => {
                let Some(Value::Array(rows)) = object.remove("data") else {
                    return None;
                };
                let key = |name: &str, default: &str| {
                    object
                        .get(name)
                        .and_then(Value::as_str)
                        .unwrap_or(default)
                        .to_string()
                };
                Some(Self {
                    x_key: key("xKey", DEFAULT_X_KEY),
                    y_key: key("yKey", DEFAULT_Y_KEY),
                    rows,
                })
            }
            _ => None,
        }
    }

    /// Bars in row order. Missing or non-numeric values count as zero.
    #[must_use]
    pub fn bars(&self) -> Vec<Bar> {
        self.rows
            .iter()
            .map(|row| Bar {
                label: label_of(row.get(&self.x_key)),
                value: value_of(row.get(&self.y_key)),
            })
            .collect()
    }

    /// Render as horizontal bars that fit in `width` columns.
    #[must_use]
    pub fn to_lines(&self, width: usize) -> Vec<String> {
        let bars = self.bars();
        if bars.is_empty() {
            return vec!["(no data)".to_string()];
        }

        let label_width = bars.iter().map(|b| b.label.chars().count()).max().unwrap_or(0);
        let values: Vec<String> = bars.iter().map(|b| format_value(b.value)).collect();
        let value_width = values.iter().map(String::len).max().unwrap_or(0);
        // label + " │" + bar + " " + value
        let bar_room = width.saturating_sub(label_width + value_width + 3).max(1);
        let max = bars.iter().map(|b| b.value).fold(0.0_f64, f64::max);

        bars.iter()
            .zip(values)
            .map(|(bar, value)| {
                let length = scaled(bar.value, max, bar_room);
                format!(
                    "{:>label_width$} │{} {value}",
                    bar.label,
                    BAR_GLYPH.to_string().repeat(length),
                )
            })
            .collect()
    }
}

fn label_of(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

fn value_of(value: Option<&Value>) -> f64 {
    match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

fn format_value(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.0}")
    } else {
        format!("{value:.2}")
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
fn scaled(value: f64, max: f64, room: usize) -> usize {
    if max <= 0.0 || value <= 0.0 {
        return 0;
    }
    ((value / max) * room as f64).round() as usize
}
