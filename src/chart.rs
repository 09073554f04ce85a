//! Projection of aggregated data into the declarative config Chart.js
//! consumes, plus ownership of the per-canvas chart lifecycle. The config
//! builder is pure; only `ChartRegistry::render` touches the browser.

use serde::Serialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::HtmlCanvasElement;

use crate::aggregate::format_usd;

/// Fixed palette, cycled positionally over labels or series. Colors follow
/// set membership, not category identity, so a category may change color
/// between renders — accepted behavior.
pub const PALETTE: [&str; 5] = ["#FF6384", "#36A2EB", "#FFCE56", "#4BC0C0", "#9966FF"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    Pie,
    Bar,
    Line,
}

impl ChartKind {
    fn as_str(self) -> &'static str {
        match self {
            ChartKind::Pie => "pie",
            ChartKind::Bar => "bar",
            ChartKind::Line => "line",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub name: String,
    pub values: Vec<f64>,
}

#[derive(Clone)]
pub struct ChartInput {
    pub labels: Vec<String>,
    pub series: Vec<Series>,
    pub palette: &'static [&'static str],
    pub format_value: fn(f64) -> String,
}

impl ChartInput {
    pub fn single(name: &str, labels: Vec<String>, values: Vec<f64>) -> Self {
        Self {
            labels,
            series: vec![Series {
                name: name.to_string(),
                values,
            }],
            palette: &PALETTE,
            format_value: format_usd,
        }
    }
}

fn cycled(palette: &[&str], n: usize) -> Vec<String> {
    (0..n).map(|i| palette[i % palette.len()].to_string()).collect()
}

/// Chart.js hover convention: base hex color with an `80` alpha suffix.
fn hover_colors(colors: &[String]) -> Vec<String> {
    colors.iter().map(|c| format!("{}80", c)).collect()
}

/// Builds the full Chart.js config. A single series over pie/bar data gets
/// per-label colors sliced from the palette; multi-series charts get one
/// color per series.
pub fn chart_config(kind: ChartKind, input: &ChartInput) -> Value {
    let single = input.series.len() == 1;
    let datasets: Vec<Value> = input
        .series
        .iter()
        .enumerate()
        .map(|(i, series)| {
            let own_color = input.palette[i % input.palette.len()];
            match kind {
                ChartKind::Line => json!({
                    "label": series.name,
                    "data": series.values,
                    "borderColor": own_color,
                    "backgroundColor": format!("{}33", own_color),
                    "tension": 0.1,
                }),
                _ if single => {
                    let colors = cycled(input.palette, input.labels.len());
                    json!({
                        "label": series.name,
                        "data": series.values,
                        "backgroundColor": colors,
                        "hoverBackgroundColor": hover_colors(&colors),
                    })
                }
                _ => json!({
                    "label": series.name,
                    "data": series.values,
                    "backgroundColor": own_color,
                    "hoverBackgroundColor": format!("{}80", own_color),
                }),
            }
        })
        .collect();

    let legend = match kind {
        ChartKind::Pie => json!({ "position": "bottom" }),
        ChartKind::Line => json!({ "position": "top" }),
        ChartKind::Bar if single => json!({ "display": false }),
        ChartKind::Bar => json!({ "position": "top" }),
    };

    let mut config = json!({
        "type": kind.as_str(),
        "data": { "labels": input.labels, "datasets": datasets },
        "options": {
            "responsive": true,
            "maintainAspectRatio": false,
            "plugins": { "legend": legend },
        },
    });
    if kind != ChartKind::Pie {
        config["options"]["scales"] = json!({ "y": { "beginAtZero": true } });
    }
    config
}

#[wasm_bindgen]
extern "C" {
    /// Global `Chart` class from the Chart.js script tag.
    #[wasm_bindgen(js_name = Chart)]
    type JsChart;

    #[wasm_bindgen(constructor, js_class = "Chart")]
    fn new(canvas: &HtmlCanvasElement, config: &JsValue) -> JsChart;

    #[wasm_bindgen(method, js_class = "Chart")]
    fn destroy(this: &JsChart);
}

/// A live chart on one canvas. The tooltip closure must outlive the chart,
/// so it rides along and drops together with the handle. Dropping the handle
/// destroys the Chart.js instance; Chart.js keeps undestroyed charts in a
/// static registry, so an unmounted page would otherwise leak them.
pub struct ChartHandle {
    chart: JsChart,
    _tooltip: Closure<dyn Fn(JsValue) -> JsValue>,
}

impl Drop for ChartHandle {
    fn drop(&mut self) {
        self.chart.destroy();
    }
}

/// Tooltip label callback: "{label}: {formatted value}". Chart.js hands pie
/// charts a plain number in `parsed` and bar/line charts an `{x, y}` pair.
fn tooltip_callback(format_value: fn(f64) -> String) -> Closure<dyn Fn(JsValue) -> JsValue> {
    Closure::new(move |ctx: JsValue| {
        let label = js_sys::Reflect::get(&ctx, &"label".into())
            .ok()
            .and_then(|v| v.as_string())
            .unwrap_or_default();
        let parsed = js_sys::Reflect::get(&ctx, &"parsed".into()).ok();
        let value = parsed
            .as_ref()
            .and_then(|p| p.as_f64())
            .or_else(|| {
                parsed
                    .and_then(|p| js_sys::Reflect::get(&p, &"y".into()).ok())
                    .and_then(|v| v.as_f64())
            })
            .unwrap_or(0.0);
        JsValue::from_str(&format!("{}: {}", label, format_value(value)))
    })
}

fn set_path(root: &JsValue, path: &[&str], value: &JsValue) -> Result<(), JsValue> {
    let mut current = root.clone();
    let (last, parents) = path.split_last().expect("set_path needs a non-empty path");
    for key in parents {
        let key = JsValue::from_str(key);
        let mut next = js_sys::Reflect::get(&current, &key)?;
        if next.is_undefined() {
            next = js_sys::Object::new().into();
            js_sys::Reflect::set(&current, &key, &next)?;
        }
        current = next;
    }
    js_sys::Reflect::set(&current, &JsValue::from_str(last), value)?;
    Ok(())
}

fn canvas_by_id(id: &str) -> Option<HtmlCanvasElement> {
    web_sys::window()?
        .document()?
        .get_element_by_id(id)?
        .dyn_into()
        .ok()
}

/// Owns every live chart, keyed by canvas id. Invariant: at most one handle
/// per canvas at any time.
#[derive(Default)]
pub struct ChartRegistry {
    live: HashMap<String, ChartHandle>,
}

impl ChartRegistry {
    /// Replace-on-redraw: any prior chart on this canvas is dropped (and so
    /// destroyed) before a new one is created. Empty labels skip creation
    /// entirely (Chart.js misbehaves on zero-length datasets) and report
    /// `false`.
    pub fn render(&mut self, kind: ChartKind, canvas_id: &str, input: &ChartInput) -> bool {
        self.live.remove(canvas_id);
        if input.labels.is_empty() {
            return false;
        }
        let Some(canvas) = canvas_by_id(canvas_id) else {
            gloo_console::warn!(format!("canvas #{} not in document, chart skipped", canvas_id));
            return false;
        };

        let config = chart_config(kind, input);
        let js_config = match config.serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        {
            Ok(v) => v,
            Err(e) => {
                gloo_console::error!(format!("chart config rejected: {}", e));
                return false;
            }
        };
        let tooltip = tooltip_callback(input.format_value);
        if let Err(e) = set_path(
            &js_config,
            &["options", "plugins", "tooltip", "callbacks", "label"],
            tooltip.as_ref(),
        ) {
            gloo_console::error!("failed to attach tooltip formatter", e);
        }

        let chart = JsChart::new(&canvas, &js_config);
        self.live.insert(
            canvas_id.to_string(),
            ChartHandle {
                chart,
                _tooltip: tooltip,
            },
        );
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn single_series_slices_palette_per_label() {
        let input = ChartInput::single("Spent", labels(&["FOOD", "TRAVEL"]), vec![10.0, 20.0]);
        let config = chart_config(ChartKind::Pie, &input);
        assert_eq!(config["type"], "pie");
        let colors = config["data"]["datasets"][0]["backgroundColor"]
            .as_array()
            .unwrap();
        assert_eq!(colors.len(), 2);
        assert_eq!(colors[0], PALETTE[0]);
        assert_eq!(colors[1], PALETTE[1]);
    }

    #[test]
    fn palette_cycles_past_its_length() {
        let many: Vec<String> = (0..7).map(|i| format!("C{}", i)).collect();
        let input = ChartInput::single("Spent", many, vec![1.0; 7]);
        let config = chart_config(ChartKind::Bar, &input);
        let colors = config["data"]["datasets"][0]["backgroundColor"]
            .as_array()
            .unwrap();
        assert_eq!(colors[5], PALETTE[0]);
        assert_eq!(colors[6], PALETTE[1]);
    }

    #[test]
    fn hover_colors_carry_alpha_suffix() {
        let input = ChartInput::single("Spent", labels(&["FOOD"]), vec![10.0]);
        let config = chart_config(ChartKind::Bar, &input);
        assert_eq!(
            config["data"]["datasets"][0]["hoverBackgroundColor"][0],
            format!("{}80", PALETTE[0])
        );
    }

    #[test]
    fn multi_series_line_gets_one_color_per_series() {
        let input = ChartInput {
            labels: labels(&["Jan", "Feb"]),
            series: vec![
                Series {
                    name: "Expenses".into(),
                    values: vec![1.0, 2.0],
                },
                Series {
                    name: "Incomes".into(),
                    values: vec![3.0, 4.0],
                },
            ],
            palette: &PALETTE,
            format_value: format_usd,
        };
        let config = chart_config(ChartKind::Line, &input);
        let datasets = config["data"]["datasets"].as_array().unwrap();
        assert_eq!(datasets.len(), 2);
        assert_eq!(datasets[0]["borderColor"], PALETTE[0]);
        assert_eq!(datasets[1]["borderColor"], PALETTE[1]);
        assert_eq!(config["options"]["scales"]["y"]["beginAtZero"], true);
    }

    #[test]
    fn empty_labels_create_no_chart() {
        let mut registry = ChartRegistry::default();
        let input = ChartInput::single("Spent", Vec::new(), Vec::new());
        assert!(!registry.render(ChartKind::Pie, "expense-chart", &input));
        assert!(registry.live.is_empty());
    }

    #[test]
    fn pie_has_no_value_axis() {
        let input = ChartInput::single("Spent", labels(&["FOOD"]), vec![1.0]);
        let config = chart_config(ChartKind::Pie, &input);
        assert!(config["options"].get("scales").is_none());
    }
}
