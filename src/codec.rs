//! GeoJSON encoding of stored points.
//!
//! Each item keeps its location as GeoJSON text in a configurable attribute,
//! e.g. `{"type":"Point","coordinates":[-122.3,47.5]}`. Coordinates follow
//! GeoJSON order: longitude first.

use crate::error::{GeoError, Result};
use crate::types::{GeoPoint, Item};
use geojson::{GeoJson, Geometry, Value};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PointCodec {
    attribute: String,
}

impl PointCodec {
    pub fn new(attribute: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
        }
    }

    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    pub fn encode(point: &GeoPoint) -> String {
        Geometry::new(Value::Point(vec![point.longitude, point.latitude])).to_string()
    }

    /// Parse a GeoJSON point geometry, or a feature wrapping one.
    pub fn decode(text: &str) -> Result<GeoPoint> {
        let geojson: GeoJson = text
            .parse()
            .map_err(|e| GeoError::PointDecode(format!("invalid GeoJSON: {}", e)))?;

        let geometry = match geojson {
            GeoJson::Geometry(geometry) => geometry,
            GeoJson::Feature(feature) => feature.geometry.ok_or_else(|| {
                GeoError::PointDecode("GeoJSON feature has no geometry".into())
            })?,
            GeoJson::FeatureCollection(_) => {
                return Err(GeoError::PointDecode(
                    "expected a point, found a feature collection".into(),
                ));
            }
        };

        match geometry.value {
            Value::Point(coords) if coords.len() >= 2 => Ok(GeoPoint::new(coords[1], coords[0])),
            Value::Point(_) => Err(GeoError::PointDecode(
                "point needs longitude and latitude".into(),
            )),
            _ => Err(GeoError::PointDecode(
                "expected a point geometry".into(),
            )),
        }
    }

    pub fn encode_into(&self, item: &mut Item, point: &GeoPoint) {
        item.insert(self.attribute.clone(), Self::encode(point).into());
    }

    pub fn decode_item(&self, item: &Item) -> Result<GeoPoint> {
        let text = item
            .get(&self.attribute)
            .and_then(|value| value.as_str())
            .ok_or_else(|| {
                GeoError::PointDecode(format!("item has no '{}' string attribute", self.attribute))
            })?;
        Self::decode(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_uses_lng_lat_order() {
        let text = PointCodec::encode(&GeoPoint::new(47.5, -122.3));
        let json: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(json["type"], "Point");
        assert_eq!(json["coordinates"][0], -122.3);
        assert_eq!(json["coordinates"][1], 47.5);
    }

    #[test]
    fn test_decode_feature() {
        let text = r#"{"type":"Feature","properties":{},"geometry":{"type":"Point","coordinates":[2.35,48.85]}}"#;
        let point = PointCodec::decode(text).unwrap();
        assert_eq!(point, GeoPoint::new(48.85, 2.35));
    }

    #[test]
    fn test_decode_rejects_other_geometries() {
        let line = r#"{"type":"LineString","coordinates":[[0,0],[1,1]]}"#;
        assert!(matches!(
            PointCodec::decode(line),
            Err(GeoError::PointDecode(_))
        ));
        assert!(PointCodec::decode("not json").is_err());
    }

    #[test]
    fn test_item_attribute_roundtrip() {
        let codec = PointCodec::new("loc");
        let mut item = Item::new();
        let point = GeoPoint::new(-33.86, 151.21);
        codec.encode_into(&mut item, &point);
        assert!(item.contains_key("loc"));
        assert_eq!(codec.decode_item(&item).unwrap(), point);

        item.insert("loc".into(), 42.into());
        assert!(codec.decode_item(&item).is_err());
    }
}
