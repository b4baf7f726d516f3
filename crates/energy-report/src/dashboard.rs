//! Three-panel dashboard rendered as SVG.
//!
//! Panels, laid out on a 2×2 grid:
//! 1. daily consumption trend line per building
//! 2. average weekly usage per building (bars)
//! 3. every reading over time (scatter)

use std::collections::BTreeMap;
use std::fmt::Write;

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use energy_core::models::PeriodTotal;
use energy_data::aggregator::EnergyAggregator;
use energy_data::merger::CanonicalDataset;

/// Line and bar colours, cycled per building.
const PALETTE: &[&str] = &[
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
    "#bcbd22", "#17becf",
];

/// Canvas and panel geometry in pixels.
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    pub width: u32,
    pub height: u32,
    /// Space between a panel's border and its plot area.
    pub margin: u32,
    pub font_family: String,
    pub font_size: u32,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            width: 1400,
            height: 800,
            margin: 55,
            font_family: "sans-serif".to_string(),
            font_size: 12,
        }
    }
}

/// Chart inputs derived from the canonical dataset.
#[derive(Debug, Clone)]
pub struct DashboardData {
    pub daily_by_building: BTreeMap<String, Vec<PeriodTotal>>,
    pub avg_weekly_by_building: BTreeMap<String, f64>,
    pub points: Vec<(NaiveDateTime, f64)>,
}

impl DashboardData {
    pub fn from_dataset(dataset: &CanonicalDataset) -> Self {
        let records = dataset.records();
        Self {
            daily_by_building: EnergyAggregator::daily_totals_by_building(records),
            avg_weekly_by_building: EnergyAggregator::average_weekly_by_building(records),
            points: dataset
                .time_ordered()
                .into_iter()
                .map(|r| (r.timestamp, r.kwh))
                .collect(),
        }
    }
}

/// Plot area of one panel.
#[derive(Debug, Clone, Copy)]
struct Area {
    x: f64,
    y: f64,
    w: f64,
    h: f64,
}

impl Area {
    fn right(&self) -> f64 {
        self.x + self.w
    }

    fn bottom(&self) -> f64 {
        self.y + self.h
    }
}

/// Linear mapping from a data range onto a pixel range.
#[derive(Debug, Clone, Copy)]
struct Scale {
    lo: f64,
    hi: f64,
    start: f64,
    end: f64,
}

impl Scale {
    fn map(&self, v: f64) -> f64 {
        if self.hi <= self.lo {
            return (self.start + self.end) / 2.0;
        }
        self.start + (v - self.lo) / (self.hi - self.lo) * (self.end - self.start)
    }
}

/// Renders [`DashboardData`] into a standalone SVG document.
pub struct DashboardRenderer {
    config: DashboardConfig,
}

impl DashboardRenderer {
    pub fn new(config: DashboardConfig) -> Self {
        Self { config }
    }

    pub fn render(&self, data: &DashboardData) -> String {
        let mut svg = String::new();
        let (w, h) = (self.config.width, self.config.height);

        writeln!(
            svg,
            r#"<?xml version="1.0" encoding="UTF-8"?>
<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {w} {h}" width="{w}" height="{h}">"#
        )
        .ok();
        writeln!(
            svg,
            r#"<style>
    text {{ font-family: {}; font-size: {}px; fill: #333; }}
    .title {{ font-size: {}px; font-weight: bold; }}
    .axis {{ stroke: #333; stroke-width: 1; }}
</style>"#,
            self.config.font_family,
            self.config.font_size,
            self.config.font_size + 2
        )
        .ok();
        writeln!(svg, r#"<rect width="{w}" height="{h}" fill="white" />"#).ok();

        let half_w = f64::from(w) / 2.0;
        let half_h = f64::from(h) / 2.0;
        self.daily_trend_panel(&mut svg, self.area(0.0, 0.0, half_w, half_h), data);
        self.weekly_bar_panel(&mut svg, self.area(half_w, 0.0, half_w, half_h), data);
        self.scatter_panel(&mut svg, self.area(0.0, half_h, half_w, half_h), data);

        writeln!(svg, "</svg>").ok();
        svg
    }

    // ── Panels ────────────────────────────────────────────────────────────────

    fn daily_trend_panel(&self, svg: &mut String, area: Area, data: &DashboardData) {
        let days: Vec<NaiveDate> = data
            .daily_by_building
            .values()
            .flatten()
            .map(|p| p.period)
            .collect();
        let y_max = data
            .daily_by_building
            .values()
            .flatten()
            .map(|p| p.kwh)
            .fold(0.0, f64::max);

        let x = date_scale(&days, area);
        let y = value_scale(y_max, area);
        self.frame(svg, area, "Daily Electricity Consumption", "Date", "kWh", y_max);
        if let (Some(first), Some(last)) = (days.iter().min(), days.iter().max()) {
            self.x_labels(svg, area, &first.to_string(), &last.to_string());
        }

        for (idx, (building, series)) in data.daily_by_building.iter().enumerate() {
            let color = PALETTE[idx % PALETTE.len()];
            let points: Vec<String> = series
                .iter()
                .map(|p| format!("{:.1},{:.1}", x.map(day_value(p.period)), y.map(p.kwh)))
                .collect();
            writeln!(
                svg,
                r#"  <polyline fill="none" stroke="{}" stroke-width="2" points="{}" />"#,
                color,
                points.join(" ")
            )
            .ok();
            for p in series {
                writeln!(
                    svg,
                    r#"  <circle cx="{:.1}" cy="{:.1}" r="2.5" fill="{}" />"#,
                    x.map(day_value(p.period)),
                    y.map(p.kwh),
                    color
                )
                .ok();
            }

            // Legend
            let ly = area.y + 12.0 + idx as f64 * 16.0;
            writeln!(
                svg,
                r#"  <rect x="{:.1}" y="{:.1}" width="10" height="10" fill="{}" />"#,
                area.right() - 110.0,
                ly - 9.0,
                color
            )
            .ok();
            writeln!(
                svg,
                r#"  <text x="{:.1}" y="{:.1}">{}</text>"#,
                area.right() - 95.0,
                ly,
                xml_escape(building)
            )
            .ok();
        }
    }

    fn weekly_bar_panel(&self, svg: &mut String, area: Area, data: &DashboardData) {
        let y_max = data.avg_weekly_by_building.values().copied().fold(0.0, f64::max);
        let y = value_scale(y_max, area);
        self.frame(svg, area, "Avg Weekly Usage By Building", "Building", "kWh", y_max);

        let n = data.avg_weekly_by_building.len().max(1) as f64;
        let slot = area.w / n;
        let bar_w = slot * 0.6;
        for (idx, (building, avg)) in data.avg_weekly_by_building.iter().enumerate() {
            let bx = area.x + slot * idx as f64 + (slot - bar_w) / 2.0;
            let top = y.map(*avg);
            writeln!(
                svg,
                r#"  <rect x="{:.1}" y="{:.1}" width="{:.1}" height="{:.1}" fill="{}" />"#,
                bx,
                top,
                bar_w,
                area.bottom() - top,
                PALETTE[idx % PALETTE.len()]
            )
            .ok();
            writeln!(
                svg,
                r#"  <text x="{:.1}" y="{:.1}" text-anchor="middle">{}</text>"#,
                bx + bar_w / 2.0,
                area.bottom() + 16.0,
                xml_escape(building)
            )
            .ok();
        }
    }

    fn scatter_panel(&self, svg: &mut String, area: Area, data: &DashboardData) {
        let y_max = data.points.iter().map(|(_, kwh)| *kwh).fold(0.0, f64::max);
        let secs: Vec<f64> = data.points.iter().map(|(ts, _)| ts_value(ts)).collect();
        let x = Scale {
            lo: secs.iter().copied().fold(f64::INFINITY, f64::min),
            hi: secs.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            start: area.x,
            end: area.right(),
        };
        let y = value_scale(y_max, area);
        self.frame(svg, area, "Consumption vs Time", "Timestamp", "kWh", y_max);
        if let (Some((first, _)), Some((last, _))) = (data.points.first(), data.points.last()) {
            self.x_labels(
                svg,
                area,
                &first.format("%Y-%m-%d %H:%M").to_string(),
                &last.format("%Y-%m-%d %H:%M").to_string(),
            );
        }

        for ((_, kwh), sx) in data.points.iter().zip(&secs) {
            writeln!(
                svg,
                r#"  <circle cx="{:.1}" cy="{:.1}" r="3" fill="{}" fill-opacity="0.5" />"#,
                x.map(*sx),
                y.map(*kwh),
                PALETTE[0]
            )
            .ok();
        }
    }

    // ── Shared drawing ────────────────────────────────────────────────────────

    fn area(&self, x: f64, y: f64, w: f64, h: f64) -> Area {
        let m = f64::from(self.config.margin);
        Area {
            x: x + m,
            y: y + m,
            w: (w - 2.0 * m).max(1.0),
            h: (h - 2.0 * m).max(1.0),
        }
    }

    /// Axes, title, axis captions and the y-axis range labels.
    fn frame(
        &self,
        svg: &mut String,
        area: Area,
        title: &str,
        x_label: &str,
        y_label: &str,
        y_max: f64,
    ) {
        writeln!(
            svg,
            r#"  <text class="title" x="{:.1}" y="{:.1}" text-anchor="middle">{}</text>"#,
            area.x + area.w / 2.0,
            area.y - 20.0,
            title
        )
        .ok();
        writeln!(
            svg,
            r#"  <line class="axis" x1="{:.1}" y1="{:.1}" x2="{:.1}" y2="{:.1}" />"#,
            area.x,
            area.bottom(),
            area.right(),
            area.bottom()
        )
        .ok();
        writeln!(
            svg,
            r#"  <line class="axis" x1="{:.1}" y1="{:.1}" x2="{:.1}" y2="{:.1}" />"#,
            area.x,
            area.y,
            area.x,
            area.bottom()
        )
        .ok();
        writeln!(
            svg,
            r#"  <text x="{:.1}" y="{:.1}" text-anchor="middle">{}</text>"#,
            area.x + area.w / 2.0,
            area.bottom() + 34.0,
            x_label
        )
        .ok();
        writeln!(
            svg,
            r#"  <text x="{:.1}" y="{:.1}" text-anchor="middle" transform="rotate(-90 {:.1} {:.1})">{}</text>"#,
            area.x - 38.0,
            area.y + area.h / 2.0,
            area.x - 38.0,
            area.y + area.h / 2.0,
            y_label
        )
        .ok();
        for (value, py) in [(0.0, area.bottom()), (nice_max(y_max), area.y)] {
            writeln!(
                svg,
                r#"  <text x="{:.1}" y="{:.1}" text-anchor="end">{:.0}</text>"#,
                area.x - 4.0,
                py + 4.0,
                value
            )
            .ok();
        }
    }

    fn x_labels(&self, svg: &mut String, area: Area, first: &str, last: &str) {
        writeln!(
            svg,
            r#"  <text x="{:.1}" y="{:.1}" text-anchor="start">{}</text>"#,
            area.x,
            area.bottom() + 16.0,
            first
        )
        .ok();
        writeln!(
            svg,
            r#"  <text x="{:.1}" y="{:.1}" text-anchor="end">{}</text>"#,
            area.right(),
            area.bottom() + 16.0,
            last
        )
        .ok();
    }
}

impl Default for DashboardRenderer {
    fn default() -> Self {
        Self::new(DashboardConfig::default())
    }
}

/// Render the dashboard for `dataset` with the default geometry.
pub fn render_dashboard(dataset: &CanonicalDataset) -> String {
    DashboardRenderer::default().render(&DashboardData::from_dataset(dataset))
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Upper bound of the y axis: the data maximum plus 5% headroom.
fn nice_max(y_max: f64) -> f64 {
    if y_max > 0.0 {
        y_max * 1.05
    } else {
        1.0
    }
}

fn value_scale(y_max: f64, area: Area) -> Scale {
    Scale {
        lo: 0.0,
        hi: nice_max(y_max),
        start: area.bottom(),
        end: area.y,
    }
}

fn date_scale(days: &[NaiveDate], area: Area) -> Scale {
    let values: Vec<f64> = days.iter().map(|d| day_value(*d)).collect();
    Scale {
        lo: values.iter().copied().fold(f64::INFINITY, f64::min),
        hi: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        start: area.x,
        end: area.right(),
    }
}

fn ts_value(ts: &NaiveDateTime) -> f64 {
    ts.and_utc().timestamp() as f64
}

fn day_value(day: NaiveDate) -> f64 {
    f64::from(day.num_days_from_ce())
}

fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use energy_core::models::ReadingRecord;

    fn reading(ts: &str, kwh: f64, building: &str) -> ReadingRecord {
        ReadingRecord::new(
            NaiveDateTime::parse_from_str(ts, "%Y-%m-%dT%H:%M").unwrap(),
            kwh,
            building,
        )
    }

    fn sample() -> CanonicalDataset {
        CanonicalDataset::new(vec![
            reading("2024-01-01T00:00", 10.0, "A"),
            reading("2024-01-02T00:00", 5.0, "A"),
            reading("2024-01-01T00:00", 7.0, "B & C"),
        ])
        .unwrap()
    }

    #[test]
    fn test_dashboard_has_three_panels() {
        let svg = render_dashboard(&sample());
        assert!(svg.starts_with("<?xml"));
        assert!(svg.trim_end().ends_with("</svg>"));
        assert!(svg.contains("Daily Electricity Consumption"));
        assert!(svg.contains("Avg Weekly Usage By Building"));
        assert!(svg.contains("Consumption vs Time"));
    }

    #[test]
    fn test_dashboard_one_line_per_building() {
        let svg = render_dashboard(&sample());
        assert_eq!(svg.matches("<polyline").count(), 2);
    }

    #[test]
    fn test_dashboard_scatter_has_every_reading() {
        let svg = render_dashboard(&sample());
        assert_eq!(svg.matches(r#"fill-opacity="0.5""#).count(), 3);
    }

    #[test]
    fn test_dashboard_escapes_names() {
        let svg = render_dashboard(&sample());
        assert!(svg.contains("B &amp; C"));
        assert!(!svg.contains("B & C"));
    }

    #[test]
    fn test_dashboard_single_reading_does_not_divide_by_zero() {
        let dataset = CanonicalDataset::new(vec![reading("2024-01-01T00:00", 0.0, "A")]).unwrap();
        let svg = render_dashboard(&dataset);
        assert!(!svg.contains("NaN"));
        assert!(!svg.contains("inf"));
    }

    #[test]
    fn test_dashboard_is_deterministic() {
        assert_eq!(render_dashboard(&sample()), render_dashboard(&sample()));
    }

    #[test]
    fn test_scale_maps_endpoints() {
        let s = Scale {
            lo: 0.0,
            hi: 10.0,
            start: 100.0,
            end: 0.0,
        };
        assert_eq!(s.map(0.0), 100.0);
        assert_eq!(s.map(10.0), 0.0);
        assert_eq!(s.map(5.0), 50.0);
    }
}
