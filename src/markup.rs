//! HTML5/CSS fragments for each hotspot.
//!
//! Every generator takes a polygon name and its pixel vertices in detector
//! order: `[0]` top-left, `[1]` top-right, `[2]` bottom-right, `[3]` bottom-left.
//! The functions are pure string formatting.

use serde::Serialize;

use crate::geometry::PixelVertex;
use crate::polygons::PolygonSet;

const CORNER_RADIUS: i32 = 10;
const OUTER_CIRCLE_RADIUS: i32 = 10;
const INNER_CIRCLE_RADIUS: i32 = 5;

/// CSS pseudo-class a cut layer reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionMode {
    Hover,
    Active,
}

impl InteractionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            InteractionMode::Hover => "hover",
            InteractionMode::Active => "active",
        }
    }
}

pub fn rounded_clip_path(name: &str, v: &[PixelVertex]) -> String {
    let width = v[1].x - v[0].x;
    let height = v[2].y - v[0].y;
    format!(
        "<clipPath id=\"{name}\"><rect x=\"{}\" y=\"{}\" rx=\"{r}\" ry=\"{r}\" width=\"{width}\" height=\"{height}\"/></clipPath>",
        v[0].x,
        v[0].y,
        r = CORNER_RADIUS,
    )
}

// Insets are (top, right, bottom, left) = (v0.y, v1.x, v2.y, v3.x).
fn inset(v: &[PixelVertex]) -> String {
    format!(
        "inset({}px {}px {}px {}px round {}px)",
        v[0].y, v[1].x, v[2].y, v[3].x, CORNER_RADIUS
    )
}

pub fn rounded_cut_layer(name: &str, v: &[PixelVertex], mode: InteractionMode) -> String {
    format!(
        "#figura #area-{name}:{} ~ #capaRecorte {{ -webkit-clip-path: {};clip-path: url(#{name});}}",
        mode.as_str(),
        inset(v),
    )
}

pub fn rounded_tap_area(name: &str, v: &[PixelVertex], mode: InteractionMode) -> String {
    format!(
        "#figura .taparea-{name}:{} ~ #capaRecorte {{ -webkit-clip-path: {};clip-path: url(#{name});}}",
        mode.as_str(),
        inset(v),
    )
}

pub fn exit_metric(name: &str) -> String {
    format!(
        "<event on=\"action\" data-event-name=\"Exit {name}\" data-exit-metric=\"{name}\" data-type=\"gwd-taparea.exit\" from=\"#taparea-{name}\"></event>"
    )
}

pub fn map_area(name: &str, v: &[PixelVertex]) -> String {
    let coords = v
        .iter()
        .map(|p| format!("{},{}", p.x, p.y))
        .collect::<Vec<_>>()
        .join(",");
    format!(
        "<gwd-taparea id=\"taparea-{name}\" class=\"taparea-{name}\"><area id=\"area-{name}\" shape=\"poly\" title=\"{name}\" coords=\"{coords}\"></gwd-taparea>"
    )
}

pub fn circles(name: &str, v: &[PixelVertex]) -> String {
    let cx = v[1].x - OUTER_CIRCLE_RADIUS;
    let cy = v[1].y + OUTER_CIRCLE_RADIUS;
    format!(
        "<circle id=\"outer-circle-{name}\" class=\"outer-circle\" cx=\"{cx}\" cy=\"{cy}\" r=\"{OUTER_CIRCLE_RADIUS}\" stroke=\"white\" stroke-width=\"1\" fill=\"none\" />\
         <circle id=\"inner-circle-{name}\" class=\"inner-circle\" cx=\"{cx}\" cy=\"{cy}\" r=\"{INNER_CIRCLE_RADIUS}\" stroke=\"white\" stroke-width=\"1\" fill=\"white\" />"
    )
}

/// Parallel fragment lists, one element per polygon in detection order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CreativeFragments {
    pub clip_paths: Vec<String>,
    pub map_areas: Vec<String>,
    pub tap_areas_hover: Vec<String>,
    pub tap_areas_active: Vec<String>,
    pub exit_metrics: Vec<String>,
    pub cut_layers_hover: Vec<String>,
    pub cut_layers_active: Vec<String>,
    pub object_names: Vec<String>,
    pub circles: Vec<String>,
}

/// Fragments joined for template rendering.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct JoinedFragments {
    pub clip_paths: String,
    pub map_areas: String,
    pub tap_areas_hover: String,
    pub tap_areas_active: String,
    pub exit_metrics: String,
    pub cut_layers_hover: String,
    pub cut_layers_active: String,
    pub object_names: String,
    pub circles: String,
}

impl CreativeFragments {
    pub fn len(&self) -> usize {
        self.object_names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.object_names.is_empty()
    }

    pub fn joined(&self) -> JoinedFragments {
        JoinedFragments {
            clip_paths: self.clip_paths.join("\n"),
            map_areas: self.map_areas.join("\n"),
            tap_areas_hover: self.tap_areas_hover.join("\n"),
            tap_areas_active: self.tap_areas_active.join("\n"),
            exit_metrics: self.exit_metrics.join("\n"),
            cut_layers_hover: self.cut_layers_hover.join("\n"),
            cut_layers_active: self.cut_layers_active.join("\n"),
            object_names: self.object_names.join(","),
            circles: self.circles.join("\n"),
        }
    }
}

pub fn generate_html5_parts(polygons: &PolygonSet) -> CreativeFragments {
    let mut parts = CreativeFragments::default();

    for polygon in polygons {
        let name = polygon.name.as_str();
        let v = polygon.printable_vertices.as_slice();

        parts.object_names.push(format!("\"{name}\""));
        parts.clip_paths.push(rounded_clip_path(name, v));
        parts.map_areas.push(map_area(name, v));
        parts.tap_areas_hover.push(rounded_tap_area(name, v, InteractionMode::Hover));
        parts.tap_areas_active.push(rounded_tap_area(name, v, InteractionMode::Active));
        parts.exit_metrics.push(exit_metric(name));
        parts.cut_layers_hover.push(rounded_cut_layer(name, v, InteractionMode::Hover));
        parts.cut_layers_active.push(rounded_cut_layer(name, v, InteractionMode::Active));
        parts.circles.push(circles(name, v));
    }

    parts
}

/// Standalone preview page: image, image map, SVG overlay and hotspot CSS.
pub fn render_html(image_url: &str, width: u32, height: u32, parts: &CreativeFragments) -> String {
    let j = parts.joined();
    format!(
        r##"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<style>
#figura {{ position: relative; width: {width}px; height: {height}px; }}
#figura img, #figura svg, #capaRecorte {{ position: absolute; top: 0; left: 0; }}
{cut_hover}
{cut_active}
{tap_hover}
{tap_active}
</style>
</head>
<body>
<div id="figura" data-objects='[{names}]'>
<map name="hotspots">
{map_areas}
</map>
<img src="{image_url}" usemap="#hotspots" width="{width}" height="{height}">
<div id="capaRecorte"></div>
<svg width="{width}" height="{height}">
<defs>
{clip_paths}
</defs>
{circles}
</svg>
{exit_metrics}
</div>
</body>
</html>
"##,
        cut_hover = j.cut_layers_hover,
        cut_active = j.cut_layers_active,
        tap_hover = j.tap_areas_hover,
        tap_active = j.tap_areas_active,
        names = j.object_names,
        map_areas = j.map_areas,
        clip_paths = j.clip_paths,
        circles = j.circles,
        exit_metrics = j.exit_metrics,
    )
}
