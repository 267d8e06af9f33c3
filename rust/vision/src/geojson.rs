// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! GeoJSON interchange for labeled shapes
//!
//! One feature per shape, `properties.label` holding the label name and
//! coordinates in image pixels. Single polygons are written as `Polygon`,
//! everything else as `MultiPolygon`.

use crate::error::Result;
use crate::types::{ClassLabel, Prediction};
use geo::{Coord, LineString, MultiPolygon, Polygon};
use serde::{Deserialize, Serialize};

type Ring = Vec<[f64; 2]>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CollectionType {
    FeatureCollection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeatureType {
    Feature,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection {
    #[serde(rename = "type")]
    pub kind: CollectionType,
    pub features: Vec<Feature>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    #[serde(rename = "type")]
    pub kind: FeatureType,
    pub geometry: Geometry,
    pub properties: Properties,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Properties {
    pub label: ClassLabel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum Geometry {
    Polygon(Vec<Ring>),
    MultiPolygon(Vec<Vec<Ring>>),
}

impl Geometry {
    pub fn from_shape(shape: &MultiPolygon<f64>) -> Self {
        match shape.0.as_slice() {
            [single] => Geometry::Polygon(polygon_rings(single)),
            polygons => Geometry::MultiPolygon(polygons.iter().map(polygon_rings).collect()),
        }
    }

    pub fn to_shape(&self) -> MultiPolygon<f64> {
        match self {
            Geometry::Polygon(rings) => MultiPolygon::new(vec![rings_polygon(rings)]),
            Geometry::MultiPolygon(polygons) => MultiPolygon::new(polygons.iter().map(|rings| rings_polygon(rings)).collect()),
        }
    }
}

fn polygon_rings(polygon: &Polygon<f64>) -> Vec<Ring> {
    std::iter::once(polygon.exterior())
        .chain(polygon.interiors())
        .map(|ring| ring.coords().map(|c| [c.x, c.y]).collect())
        .collect()
}

fn rings_polygon(rings: &[Ring]) -> Polygon<f64> {
    let to_line = |ring: &Ring| LineString::new(ring.iter().map(|&[x, y]| Coord { x, y }).collect());
    match rings.split_first() {
        Some((exterior, interiors)) => Polygon::new(to_line(exterior), interiors.iter().map(to_line).collect()),
        None => Polygon::new(LineString::new(Vec::new()), Vec::new()),
    }
}

impl From<&Prediction> for FeatureCollection {
    fn from(prediction: &Prediction) -> Self {
        FeatureCollection {
            kind: CollectionType::FeatureCollection,
            features: prediction
                .iter()
                .map(|(label, shape)| Feature {
                    kind: FeatureType::Feature,
                    geometry: Geometry::from_shape(shape),
                    properties: Properties { label },
                })
                .collect(),
        }
    }
}

impl From<&FeatureCollection> for Prediction {
    fn from(collection: &FeatureCollection) -> Self {
        let mut prediction = Prediction::new();
        for feature in &collection.features {
            prediction.push(feature.properties.label, feature.geometry.to_shape());
        }
        prediction
    }
}

pub fn to_geojson(prediction: &Prediction) -> Result<String> {
    Ok(serde_json::to_string(&FeatureCollection::from(prediction))?)
}

pub fn from_geojson(text: &str) -> Result<Prediction> {
    let collection: FeatureCollection = serde_json::from_str(text)?;
    Ok(Prediction::from(&collection))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::VisionError;
    use floorplan_geometry::box_polygon;
    use serde_json::Value;

    #[test]
    fn test_writes_polygon_features() {
        let mut prediction = Prediction::new();
        prediction.push(ClassLabel::Door, MultiPolygon::new(vec![box_polygon(0.0, 0.0, 2.0, 1.0)]));

        let value: Value = serde_json::from_str(&to_geojson(&prediction).unwrap()).unwrap();
        assert_eq!(value["type"], "FeatureCollection");
        let feature = &value["features"][0];
        assert_eq!(feature["type"], "Feature");
        assert_eq!(feature["properties"]["label"], "DOOR");
        assert_eq!(feature["geometry"]["type"], "Polygon");

        let ring = feature["geometry"]["coordinates"][0].as_array().unwrap();
        assert_eq!(ring.len(), 5);
        assert_eq!(ring.first(), ring.last());
    }

    #[test]
    fn test_multipolygon_with_hole_survives() {
        let outer = box_polygon(0.0, 0.0, 10.0, 10.0);
        let with_hole = Polygon::new(
            outer.exterior().clone(),
            vec![box_polygon(2.0, 2.0, 4.0, 4.0).exterior().clone()],
        );
        let mut prediction = Prediction::new();
        prediction.push(
            ClassLabel::Space,
            MultiPolygon::new(vec![with_hole, box_polygon(20.0, 0.0, 30.0, 10.0)]),
        );

        let text = to_geojson(&prediction).unwrap();
        assert!(text.contains("\"MultiPolygon\""));
        assert_eq!(from_geojson(&text).unwrap(), prediction);
    }

    #[test]
    fn test_reads_external_geojson() {
        let text = r#"{
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "properties": {"label": "WALL"},
                "geometry": {"type": "Polygon", "coordinates": [[[0, 0], [4, 0], [4, 1], [0, 1], [0, 0]]]}
            }]
        }"#;
        let prediction = from_geojson(text).unwrap();
        assert_eq!(prediction.labels(), &[ClassLabel::Wall]);
        assert_eq!(prediction.shapes()[0].0[0].exterior().0.len(), 5);
    }

    #[test]
    fn test_rejects_unknown_label() {
        let text = r#"{"type": "FeatureCollection", "features": [{"type": "Feature",
            "properties": {"label": "STAIRS"},
            "geometry": {"type": "Polygon", "coordinates": [[[0, 0], [1, 0], [1, 1], [0, 0]]]}}]}"#;
        assert!(matches!(from_geojson(text), Err(VisionError::Serialization(_))));
    }
}
