//! District boundaries from GeoJSON FeatureCollections.

use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use geo::{Coord, LineString, MultiPolygon, Polygon};
use serde_json::Value;

use crate::geom::District;

/// Read a GeoJSON file whose features are Polygon or MultiPolygon districts.
pub fn read_districts_geojson(path: &Path, id_property: &str) -> Result<Vec<District>> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("[io::geojson::read] Failed to read GeoJSON file: {}", path.display()))?;
    read_districts_geojson_bytes(&bytes, id_property)
        .with_context(|| format!("[io::geojson::read] Invalid district file {:?}", path))
}

/// Parse districts from GeoJSON bytes.
///
/// Each feature's id is read from `properties[id_property]`, which may be an
/// integer or a string of digits. Features without geometry are skipped.
pub fn read_districts_geojson_bytes(bytes: &[u8], id_property: &str) -> Result<Vec<District>> {
    let value: Value = serde_json::from_slice(bytes).context("Failed to parse GeoJSON bytes")?;
    let features = value["features"].as_array()
        .ok_or_else(|| anyhow!("GeoJSON has no `features` array"))?;

    let mut districts = Vec::with_capacity(features.len());
    for (idx, feature) in features.iter().enumerate() {
        let id = parse_id(&feature["properties"][id_property])
            .with_context(|| format!("Feature {idx}: bad or missing `{id_property}` property"))?;

        let Some(geometry) = feature["geometry"].as_object() else {
            log::warn!("[io::geojson] district {id} has no geometry; skipping");
            continue;
        };
        let coords = geometry.get("coordinates").and_then(Value::as_array)
            .ok_or_else(|| anyhow!("District {id}: missing coordinates"))?;

        let shape = match geometry.get("type").and_then(Value::as_str) {
            Some("Polygon") => MultiPolygon(vec![parse_polygon_coords(coords)?]),
            Some("MultiPolygon") => coords.iter()
                .map(|polygon| polygon.as_array()
                    .ok_or_else(|| anyhow!("District {id}: polygon is not an array"))
                    .and_then(|rings| parse_polygon_coords(rings)))
                .collect::<Result<Vec<_>>>()
                .map(MultiPolygon)?,
            other => bail!("District {id}: unsupported geometry type {other:?}"),
        };
        districts.push(District::new(id, shape));
    }
    Ok(districts)
}

fn parse_id(value: &Value) -> Result<i64> {
    match value {
        Value::Number(n) => n.as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
            .ok_or_else(|| anyhow!("id {n} is not an integer")),
        Value::String(s) => s.trim().parse().with_context(|| format!("id {s:?} is not an integer")),
        _ => bail!("id must be a number or string"),
    }
}

/// `[exterior, hole, hole, ...]`, each ring `[[x, y], ...]`.
fn parse_polygon_coords(rings: &[Value]) -> Result<Polygon<f64>> {
    let mut rings = rings.iter().map(|ring| {
        ring.as_array()
            .ok_or_else(|| anyhow!("Invalid polygon: ring is not an array"))
            .and_then(|coords| parse_ring_coords(coords))
    });
    let exterior = rings.next().ok_or_else(|| anyhow!("Invalid polygon: missing exterior ring"))??;
    let interiors = rings.collect::<Result<Vec<_>>>()?;
    Ok(Polygon::new(exterior, interiors))
}

fn parse_ring_coords(coords: &[Value]) -> Result<LineString<f64>> {
    let mut points = coords.iter().map(|pair| {
        let xy = pair.as_array().filter(|xy| xy.len() >= 2)
            .ok_or_else(|| anyhow!("Invalid coordinate: expected [x, y]"))?;
        let x = xy[0].as_f64().ok_or_else(|| anyhow!("Invalid coordinate: x must be a number"))?;
        let y = xy[1].as_f64().ok_or_else(|| anyhow!("Invalid coordinate: y must be a number"))?;
        Ok(Coord { x, y })
    }).collect::<Result<Vec<_>>>()?;

    // Close the ring.
    if let (Some(&first), Some(&last)) = (points.first(), points.last()) {
        if first != last { points.push(first); }
    }
    Ok(LineString(points))
}
