//! Region roster loading and choropleth styling of boundary datasets.
//!
//! Accepts a GeoJSON `FeatureCollection` or a TopoJSON `Topology` (first
//! object). Each feature's properties must carry `administration_id` and
//! `name`. Geometry is passed through untouched.

use std::path::Path;

use serde_json::{Map, Value};

use crate::error::CoreError;
use crate::model::{AdministrationId, AdministrativeRegion};
use crate::presentation::MapStyle;

#[derive(Debug, Clone)]
pub struct RegionDataset {
    raw: Value,
    regions: Vec<AdministrativeRegion>,
}

impl RegionDataset {
    pub fn from_path(path: &Path) -> Result<Self, CoreError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| CoreError::RegionDataset(format!("{}: {e}", path.display())))?;
        Self::from_json_str(&text)
    }

    pub fn from_json_str(text: &str) -> Result<Self, CoreError> {
        let raw: Value = serde_json::from_str(text)
            .map_err(|e| CoreError::RegionDataset(format!("invalid JSON: {e}")))?;
        Self::from_value(raw)
    }

    pub fn from_value(raw: Value) -> Result<Self, CoreError> {
        let mut regions = Vec::new();
        for props in property_objects(&raw)? {
            regions.push(region_from_properties(props)?);
        }
        log::debug!("loaded {} regions from boundary dataset", regions.len());
        Ok(Self { raw, regions })
    }

    pub fn regions(&self) -> &[AdministrativeRegion] {
        &self.regions
    }

    pub fn region(&self, id: AdministrationId) -> Result<&AdministrativeRegion, CoreError> {
        self.regions
            .iter()
            .find(|r| r.administration_id == id)
            .ok_or(CoreError::UnknownRegion(id))
    }

    pub fn raw(&self) -> &Value {
        &self.raw
    }

    /// Copy of the dataset with each feature's style written into its
    /// properties. Features without a style are left as they are.
    pub fn styled(&self, styles: &[MapStyle]) -> Value {
        let mut out = self.raw.clone();
        for props in property_objects_mut(&mut out) {
            let Some(id) = props.get("administration_id").and_then(as_id) else {
                continue;
            };
            let Some(style) = styles.iter().find(|s| s.administration_id == id) else {
                continue;
            };
            props.insert(
                "fillColor".into(),
                style.fill_color.map(Value::from).unwrap_or(Value::Null),
            );
            props.insert("color".into(), Value::from(style.stroke_color));
            props.insert("weight".into(), Value::from(style.weight));
            props.insert("opacity".into(), Value::from(style.opacity));
            props.insert("fillOpacity".into(), Value::from(style.fill_opacity));
            props.insert("category".into(), style.category.map(Value::from).unwrap_or(Value::Null));
            props.insert(
                "category_label".into(),
                style.label.map(Value::from).unwrap_or(Value::Null),
            );
        }
        out
    }
}

fn region_from_properties(props: &Map<String, Value>) -> Result<AdministrativeRegion, CoreError> {
    let administration_id = props
        .get("administration_id")
        .and_then(as_id)
        .ok_or_else(|| CoreError::RegionDataset("feature without administration_id".into()))?;
    let name = props
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| {
            CoreError::RegionDataset(format!("feature {administration_id} without name"))
        })?
        .to_string();
    Ok(AdministrativeRegion { administration_id, name })
}

fn as_id(v: &Value) -> Option<AdministrationId> {
    v.as_i64().or_else(|| v.as_str().and_then(|s| s.parse().ok()))
}

fn feature_list(raw: &Value) -> Result<&Vec<Value>, CoreError> {
    match raw.get("type").and_then(Value::as_str) {
        Some("FeatureCollection") => raw
            .get("features")
            .and_then(Value::as_array)
            .ok_or_else(|| CoreError::RegionDataset("FeatureCollection without features".into())),
        Some("Topology") => raw
            .get("objects")
            .and_then(Value::as_object)
            .and_then(|objects| objects.values().next())
            .and_then(|object| object.get("geometries"))
            .and_then(Value::as_array)
            .ok_or_else(|| CoreError::RegionDataset("Topology without geometries".into())),
        Some(other) => Err(CoreError::RegionDataset(format!("unsupported dataset type '{other}'"))),
        None => Err(CoreError::RegionDataset("missing dataset type".into())),
    }
}

fn property_objects(raw: &Value) -> Result<Vec<&Map<String, Value>>, CoreError> {
    feature_list(raw)?
        .iter()
        .map(|f| {
            f.get("properties")
                .and_then(Value::as_object)
                .ok_or_else(|| CoreError::RegionDataset("feature without properties".into()))
        })
        .collect()
}

fn property_objects_mut(raw: &mut Value) -> Vec<&mut Map<String, Value>> {
    let kind = raw.get("type").and_then(Value::as_str).map(str::to_owned);
    let features = match kind.as_deref() {
        Some("FeatureCollection") => raw.get_mut("features"),
        Some("Topology") => raw
            .get_mut("objects")
            .and_then(Value::as_object_mut)
            .and_then(|objects| objects.values_mut().next())
            .and_then(|object| object.get_mut("geometries")),
        _ => None,
    };
    features
        .and_then(Value::as_array_mut)
        .map(|list| {
            list.iter_mut()
                .filter_map(|f| f.get_mut("properties").and_then(Value::as_object_mut))
                .collect()
        })
        .unwrap_or_default()
}
