use geo_types::Coord;

use crate::vision::RawVertex;

/// Vertex in image pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
pub struct PixelVertex {
    pub x: i32,
    pub y: i32,
}

impl PixelVertex {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Missing coordinates become 0.0; order and count are kept.
pub fn normalize_vertices(raw: &[RawVertex]) -> Vec<Coord<f64>> {
    raw.iter()
        .map(|v| Coord {
            x: v.x.unwrap_or(0.0),
            y: v.y.unwrap_or(0.0),
        })
        .collect()
}

/// Scales normalized coordinates to pixels. The cast truncates toward zero.
pub fn to_pixel_vertices(vertices: &[Coord<f64>], width: u32, height: u32) -> Vec<PixelVertex> {
    vertices
        .iter()
        .map(|v| PixelVertex {
            x: (v.x * width as f64) as i32,
            y: (v.y * height as f64) as i32,
        })
        .collect()
}

/// True when a box cannot be drawn: fewer than four corners or every corner at the origin.
pub fn is_degenerate(vertices: &[Coord<f64>]) -> bool {
    vertices.len() < 4 || vertices.iter().all(|v| v.x == 0.0 && v.y == 0.0)
}
