use crate::map::{Basemap, BasemapFeature, MarkerGroup, PointOfInterest};
use anyhow::{Context, Result};
use geojson::{GeoJson, Geometry, Value};
use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::Path;

/// Marker radius in screen dots for small, medium and large spots.
pub const MARKER_RADIUS_SMALL: f64 = 2.0;
pub const MARKER_RADIUS_MEDIUM: f64 = 3.0;
pub const MARKER_RADIUS_LARGE: f64 = 4.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Sakura100,
    Navitime,
    Weathernews,
    WeathernewsTop10,
}

impl Collection {
    pub const ALL: [Collection; 4] = [
        Collection::Sakura100,
        Collection::WeathernewsTop10,
        Collection::Weathernews,
        Collection::Navitime,
    ];
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Collection::Sakura100 => "sakura100",
            Collection::Navitime => "navitime",
            Collection::Weathernews => "weathernews",
            Collection::WeathernewsTop10 => "weathernews_top10",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Prefecture {
    pub id: u32,
    pub name_ja: String,
    #[serde(default)]
    pub name_en: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Spot {
    pub id: String,
    pub name_ja: String,
    #[serde(default)]
    pub name_en: Option<String>,
    pub geo: GeoPoint,
    #[serde(default)]
    pub trees: Option<u32>,
    #[serde(default)]
    pub collections: Vec<Collection>,
    pub prefecture: Prefecture,
}

impl Spot {
    pub fn in_collection(&self, collection: Collection) -> bool {
        self.collections.contains(&collection)
    }

    pub fn marker_group(&self) -> MarkerGroup {
        if self.in_collection(Collection::Sakura100) {
            MarkerGroup::Sakura100
        } else if self.in_collection(Collection::WeathernewsTop10) {
            MarkerGroup::WeathernewsTop10
        } else {
            MarkerGroup::Other
        }
    }

    pub fn marker_radius(&self) -> f64 {
        radius_for_trees(self.trees)
    }

    pub fn to_point(&self) -> PointOfInterest {
        PointOfInterest {
            id: self.id.clone(),
            name: self.name_ja.clone(),
            lon: self.geo.lng,
            lat: self.geo.lat,
            screen_radius: self.marker_radius(),
            group: self.marker_group(),
        }
    }
}

/// Contents of `spots.json`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SpotsData {
    pub prefectures: Vec<Prefecture>,
    pub spots: Vec<Spot>,
}

impl SpotsData {
    pub fn spot(&self, id: &str) -> Option<&Spot> {
        self.spots.iter().find(|s| s.id == id)
    }

    pub fn prefecture(&self, id: u32) -> Option<&Prefecture> {
        self.prefectures.iter().find(|p| p.id == id)
    }
}

pub fn radius_for_trees(trees: Option<u32>) -> f64 {
    match trees {
        Some(n) if n >= 2000 => MARKER_RADIUS_LARGE,
        Some(n) if n >= 500 => MARKER_RADIUS_MEDIUM,
        _ => MARKER_RADIUS_SMALL,
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpotFilters {
    pub prefecture_id: Option<u32>,
    pub collection: Option<Collection>,
}

impl SpotFilters {
    pub fn is_empty(&self) -> bool {
        self.prefecture_id.is_none() && self.collection.is_none()
    }

    pub fn matches(&self, spot: &Spot) -> bool {
        if self.prefecture_id.is_some_and(|id| spot.prefecture.id != id) {
            return false;
        }
        if self.collection.is_some_and(|c| !spot.in_collection(c)) {
            return false;
        }
        true
    }

    /// Step the collection filter: off, then each collection, then off again.
    pub fn cycle_collection(&mut self) {
        self.collection = match self.collection {
            None => Collection::ALL.first().copied(),
            Some(current) => Collection::ALL
                .iter()
                .skip_while(|c| **c != current)
                .nth(1)
                .copied(),
        };
    }

    /// Step the prefecture filter through `prefectures` in order.
    pub fn cycle_prefecture(&mut self, prefectures: &[Prefecture]) {
        self.prefecture_id = match self.prefecture_id {
            None => prefectures.first().map(|p| p.id),
            Some(current) => prefectures
                .iter()
                .skip_while(|p| p.id != current)
                .nth(1)
                .map(|p| p.id),
        };
    }
}

pub fn filter_spots<'a>(spots: &'a [Spot], filters: &SpotFilters) -> Vec<&'a Spot> {
    spots.iter().filter(|s| filters.matches(s)).collect()
}

/// Load `spots.json`
pub fn load_spots(path: &Path) -> Result<SpotsData> {
    let mut bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    parse_spots(&mut bytes).with_context(|| format!("parsing {}", path.display()))
}

pub fn parse_spots(bytes: &mut [u8]) -> Result<SpotsData> {
    let data: SpotsData = simd_json::serde::from_slice(bytes)?;
    Ok(data)
}

/// Load prefecture polygons from a GeoJSON file
pub fn load_basemap(path: &Path) -> Result<Basemap> {
    let content = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    parse_basemap(&content).with_context(|| format!("parsing {}", path.display()))
}

pub fn parse_basemap(content: &str) -> Result<Basemap> {
    let geojson: GeoJson = content.parse()?;
    let mut features = Vec::new();

    match geojson {
        GeoJson::FeatureCollection(fc) => {
            for (index, feature) in fc.features.iter().enumerate() {
                let props = feature.properties.as_ref();
                let prop_str = |key: &str| props.and_then(|p| p.get(key)).and_then(|v| v.as_str());

                let key = match props.and_then(|p| p.get("id")) {
                    Some(id) => id.as_str().map_or_else(|| id.to_string(), str::to_string),
                    None => format!("{}-{}", prop_str("nam").unwrap_or("pref"), index),
                };
                let label = prop_str("nam_ja").or_else(|| prop_str("nam")).map(str::to_string);

                let mut rings = Vec::new();
                if let Some(ref geometry) = feature.geometry {
                    collect_rings(geometry, &mut rings);
                }
                features.push(BasemapFeature { key, label, rings });
            }
        }
        GeoJson::Feature(f) => {
            let mut rings = Vec::new();
            if let Some(ref geometry) = f.geometry {
                collect_rings(geometry, &mut rings);
            }
            features.push(BasemapFeature {
                key: "0".to_string(),
                label: None,
                rings,
            });
        }
        GeoJson::Geometry(geometry) => {
            let mut rings = Vec::new();
            collect_rings(&geometry, &mut rings);
            features.push(BasemapFeature {
                key: "0".to_string(),
                label: None,
                rings,
            });
        }
    }

    Ok(Basemap { features })
}

fn collect_rings(geometry: &Geometry, rings: &mut Vec<Vec<(f64, f64)>>) {
    let to_ring = |coords: &Vec<Vec<f64>>| -> Vec<(f64, f64)> {
        coords
            .iter()
            .filter(|c| c.len() >= 2)
            .map(|c| (c[0], c[1]))
            .collect()
    };

    match &geometry.value {
        Value::Polygon(polygon) => rings.extend(polygon.iter().map(to_ring)),
        Value::MultiPolygon(polygons) => {
            for polygon in polygons {
                rings.extend(polygon.iter().map(to_ring));
            }
        }
        Value::LineString(coords) => rings.push(to_ring(coords)),
        Value::MultiLineString(lines) => rings.extend(lines.iter().map(to_ring)),
        Value::GeometryCollection(geometries) => {
            for g in geometries {
                collect_rings(g, rings);
            }
        }
        _ => {}
    }
}

/// Load spots and prefecture outlines from `dir`, falling back to the
/// built-in sample for whatever is missing or broken.
pub fn load_dir(dir: &Path) -> (SpotsData, Basemap) {
    let spots = match load_spots(&dir.join("spots.json")) {
        Ok(data) => {
            log::info!("loaded {} spots in {} prefectures", data.spots.len(), data.prefectures.len());
            data
        }
        Err(e) => {
            log::warn!("{e:#}; using built-in sample spots");
            sample_spots()
        }
    };

    let basemap = match load_basemap(&dir.join("prefectures.geojson")) {
        Ok(basemap) if !basemap.is_empty() => basemap,
        Ok(_) => {
            log::warn!("prefecture outlines are empty; using built-in sample outlines");
            sample_basemap()
        }
        Err(e) => {
            log::warn!("{e:#}; using built-in sample outlines");
            sample_basemap()
        }
    };

    (spots, basemap)
}

fn prefecture(id: u32, name_ja: &str, name_en: &str) -> Prefecture {
    Prefecture {
        id,
        name_ja: name_ja.to_string(),
        name_en: Some(name_en.to_string()),
    }
}

fn spot(id: &str, name_ja: &str, lat: f64, lng: f64, trees: u32, collections: &[Collection], prefecture: &Prefecture) -> Spot {
    Spot {
        id: id.to_string(),
        name_ja: name_ja.to_string(),
        name_en: None,
        geo: GeoPoint { lat, lng },
        trees: Some(trees),
        collections: collections.to_vec(),
        prefecture: prefecture.clone(),
    }
}

/// A handful of well-known spots for when no data directory is available
pub fn sample_spots() -> SpotsData {
    use Collection::*;

    let aomori = prefecture(2, "青森県", "Aomori");
    let tokyo = prefecture(13, "東京都", "Tokyo");
    let kyoto = prefecture(26, "京都府", "Kyoto");
    let nara = prefecture(29, "奈良県", "Nara");

    let spots = vec![
        spot("hirosaki-park", "弘前公園", 40.6077, 140.4637, 2600, &[Sakura100, WeathernewsTop10], &aomori),
        spot("ueno-park", "上野恩賜公園", 35.7156, 139.7714, 800, &[Sakura100, Navitime], &tokyo),
        spot("shinjuku-gyoen", "新宿御苑", 35.6852, 139.7100, 1000, &[Sakura100, WeathernewsTop10], &tokyo),
        spot("meguro-river", "目黒川", 35.6434, 139.6982, 800, &[WeathernewsTop10, Weathernews], &tokyo),
        spot("chidorigafuchi", "千鳥ヶ淵", 35.6897, 139.7460, 260, &[Weathernews], &tokyo),
        spot("daigoji", "醍醐寺", 34.9510, 135.8195, 1000, &[Sakura100], &kyoto),
        spot("philosophers-path", "哲学の道", 35.0230, 135.7946, 400, &[Navitime], &kyoto),
        spot("yoshinoyama", "吉野山", 34.3660, 135.8605, 30000, &[Sakura100, WeathernewsTop10], &nara),
    ];

    SpotsData {
        prefectures: vec![aomori, tokyo, kyoto, nara],
        spots,
    }
}

fn boxed(key: &str, label: &str, west: f64, south: f64, east: f64, north: f64) -> BasemapFeature {
    BasemapFeature {
        key: key.to_string(),
        label: Some(label.to_string()),
        rings: vec![vec![
            (west, south),
            (east, south),
            (east, north),
            (west, north),
            (west, south),
        ]],
    }
}

/// Coarse prefecture boxes matching `sample_spots`
pub fn sample_basemap() -> Basemap {
    Basemap {
        features: vec![
            boxed("2", "青森県", 139.9, 40.2, 141.7, 41.6),
            boxed("13", "東京都", 138.9, 35.5, 139.9, 35.9),
            boxed("26", "京都府", 134.9, 34.7, 136.1, 35.8),
            boxed("29", "奈良県", 135.5, 33.8, 136.2, 34.8),
        ],
    }
}
