use std::collections::HashMap;

use geo_types::Coord;
use log::debug;

use crate::geometry::{is_degenerate, normalize_vertices, to_pixel_vertices, PixelVertex};
use crate::types::FilterConfig;
use crate::vision::LocalizedObject;

/// One accepted detection, named `<Label>_<n>`.
#[derive(Debug, Clone, PartialEq)]
pub struct PolygonEntry {
    pub name: String,
    pub label: String,
    pub score: f64,
    pub vertices: Vec<Coord<f64>>,
    pub printable_vertices: Vec<PixelVertex>,
}

/// Accepted polygons in detection order. Names are unique.
#[derive(Debug, Clone, Default)]
pub struct PolygonSet {
    entries: Vec<PolygonEntry>,
}

impl PolygonSet {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PolygonEntry> {
        self.entries.iter()
    }

    pub fn get(&self, name: &str) -> Option<&PolygonEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.name.as_str()).collect()
    }
}

impl<'a> IntoIterator for &'a PolygonSet {
    type Item = &'a PolygonEntry;
    type IntoIter = std::slice::Iter<'a, PolygonEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Filters detections and converts them to pixel space for a `width` x `height` image.
///
/// Objects are visited in API order. A label suffix is only consumed by
/// objects that pass the exclusion list, the score threshold and the
/// degenerate-box check.
pub fn get_polygons(
    objects: &[LocalizedObject],
    width: u32,
    height: u32,
    threshold: f64,
    filter: &FilterConfig,
) -> PolygonSet {
    let mut counters: HashMap<&str, u32> = HashMap::new();
    let mut entries = Vec::new();

    for object in objects {
        if filter.is_excluded(&object.name) {
            debug!("Skipping excluded label {}", object.name);
            continue;
        }
        if object.score < threshold {
            debug!("Skipping {} with score {:.3} < {}", object.name, object.score, threshold);
            continue;
        }

        let vertices = normalize_vertices(&object.bounding_poly.normalized_vertices);
        if is_degenerate(&vertices) {
            debug!("Skipping {} with degenerate bounding box", object.name);
            continue;
        }

        let count = counters.entry(object.name.as_str()).or_insert(0);
        *count += 1;
        let name = format!("{}_{}", object.name, count);

        let printable_vertices = to_pixel_vertices(&vertices, width, height);
        entries.push(PolygonEntry {
            name,
            label: object.name.clone(),
            score: object.score,
            vertices,
            printable_vertices,
        });
    }

    PolygonSet { entries }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::vision::{BoundingPoly, RawVertex};

    pub(crate) fn object(name: &str, score: f64, corners: [(f64, f64); 4]) -> LocalizedObject {
        LocalizedObject {
            name: name.to_string(),
            score,
            bounding_poly: BoundingPoly {
                normalized_vertices: corners
                    .iter()
                    .map(|&(x, y)| RawVertex { x: Some(x), y: Some(y) })
                    .collect(),
            },
        }
    }

    pub(crate) const BOX: [(f64, f64); 4] = [(0.1, 0.2), (0.5, 0.2), (0.5, 0.8), (0.1, 0.8)];

    #[test]
    fn test_low_score_duplicate_does_not_take_suffix() {
        let objects = [object("Car", 0.9, BOX), object("Car", 0.6, BOX)];
        let set = get_polygons(&objects, 1000, 500, 0.85, &FilterConfig::default());
        assert_eq!(set.names(), vec!["Car_1"]);
        let car = set.get("Car_1").unwrap();
        assert_eq!(car.score, 0.9);
        assert_eq!(
            car.printable_vertices,
            vec![
                PixelVertex::new(100, 100),
                PixelVertex::new(500, 100),
                PixelVertex::new(500, 400),
                PixelVertex::new(100, 400),
            ]
        );
    }

    #[test]
    fn test_rejected_first_occurrence_keeps_suffix_one() {
        let objects = [object("Car", 0.2, BOX), object("Car", 0.95, BOX)];
        let set = get_polygons(&objects, 100, 100, 0.5, &FilterConfig::default());
        assert_eq!(set.names(), vec!["Car_1"]);
    }

    #[test]
    fn test_person_excluded_at_any_score() {
        let objects = [object("Person", 0.99, BOX), object("Shoe", 0.9, BOX)];
        let set = get_polygons(&objects, 100, 100, 0.0, &FilterConfig::default());
        assert_eq!(set.names(), vec!["Shoe_1"]);
    }

    #[test]
    fn test_suffixes_increase_per_label_in_order() {
        let objects = [
            object("Car", 0.9, BOX),
            object("Wheel", 0.9, BOX),
            object("Car", 0.1, BOX),
            object("Car", 0.9, BOX),
            object("Wheel", 0.9, BOX),
            object("Car", 0.9, BOX),
        ];
        let set = get_polygons(&objects, 100, 100, 0.5, &FilterConfig::default());
        assert_eq!(set.names(), vec!["Car_1", "Wheel_1", "Car_2", "Wheel_2", "Car_3"]);
    }

    #[test]
    fn test_degenerate_box_skipped_without_suffix() {
        let objects = [
            object("Car", 0.9, [(0.0, 0.0); 4]),
            object("Car", 0.9, BOX),
        ];
        let set = get_polygons(&objects, 100, 100, 0.5, &FilterConfig::default());
        assert_eq!(set.names(), vec!["Car_1"]);
    }

    #[test]
    fn test_custom_exclusions() {
        let filter = FilterConfig {
            excluded_labels: vec!["Car".to_string()],
        };
        let objects = [object("Car", 0.9, BOX), object("Person", 0.9, BOX)];
        let set = get_polygons(&objects, 100, 100, 0.5, &filter);
        assert_eq!(set.names(), vec!["Person_1"]);
    }

    #[test]
    fn test_json_decimals_scale_like_double_precision() {
        let raw = r#"[{"name":"Bag","score":0.9,"boundingPoly":{"normalizedVertices":[
            {"x":0.21,"y":0.39},{"x":0.42,"y":0.39},{"x":0.42,"y":0.78},{"x":0.21,"y":0.78}
        ]}}]"#;
        let objects: Vec<LocalizedObject> = serde_json::from_str(raw).unwrap();
        let set = get_polygons(&objects, 300, 300, 0.5, &FilterConfig::default());
        assert_eq!(
            set.get("Bag_1").unwrap().printable_vertices,
            vec![
                PixelVertex::new(63, 117),
                PixelVertex::new(126, 117),
                PixelVertex::new(126, 234),
                PixelVertex::new(63, 234),
            ]
        );
    }

    #[test]
    fn test_score_just_below_threshold_rejected() {
        let raw = r#"[{"name":"Car","score":0.84999999,"boundingPoly":{"normalizedVertices":[
            {"x":0.1,"y":0.1},{"x":0.5,"y":0.1},{"x":0.5,"y":0.5},{"x":0.1,"y":0.5}
        ]}}]"#;
        let objects: Vec<LocalizedObject> = serde_json::from_str(raw).unwrap();
        assert!(get_polygons(&objects, 100, 100, 0.85, &FilterConfig::default()).is_empty());
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let objects = [object("Car", 0.85, BOX)];
        let set = get_polygons(&objects, 100, 100, 0.85, &FilterConfig::default());
        assert_eq!(set.len(), 1);
    }
}
