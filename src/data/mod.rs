use crate::map::{Basemap, LineString, Lod};
use anyhow::{bail, Context, Result};
use geojson::{GeoJson, Geometry, Value};
use std::fs;
use std::path::Path;

/// Natural Earth coastline files and the detail level they serve
const COASTLINE_FILES: [(&str, Lod); 4] = [
    ("ne_110m_coastline.json", Lod::Low),
    ("natural-earth.json", Lod::Medium),
    ("ne_50m_coastline.json", Lod::Medium),
    ("ne_10m_coastline.json", Lod::High),
];

const BORDER_FILES: [&str; 2] = ["ne_50m_borders.json", "ne_10m_borders.json"];

/// Load every known GeoJSON layer present in `dir`.
///
/// Missing files are skipped; a file that exists but does not parse is an
/// error, as is a directory with no usable layers.
pub fn load_basemap(dir: &Path) -> Result<Basemap> {
    if !dir.is_dir() {
        bail!("not a directory");
    }

    let mut basemap = Basemap::new();

    for (filename, lod) in COASTLINE_FILES {
        let path = dir.join(filename);
        if path.exists() {
            let geojson = read_geojson(&path).with_context(|| format!("reading {filename}"))?;
            process_geojson_lines(&geojson, |line| basemap.add_coastline(line, lod));
            log::info!("Loaded coastlines from {}", path.display());
        }
    }

    for filename in BORDER_FILES {
        let path = dir.join(filename);
        if path.exists() {
            let geojson = read_geojson(&path).with_context(|| format!("reading {filename}"))?;
            process_geojson_lines(&geojson, |line| basemap.add_border(line));
            log::info!("Loaded borders from {}", path.display());
        }
    }

    if !basemap.has_data() {
        bail!("no GeoJSON layers found");
    }
    Ok(basemap)
}

/// Parse a GeoJSON file with simd-json
fn read_geojson(path: &Path) -> Result<GeoJson> {
    let mut bytes = fs::read(path)?;
    let geojson: GeoJson = simd_json::serde::from_slice(&mut bytes)?;
    Ok(geojson)
}

/// Walk GeoJSON and hand every line or ring to `add_line`
fn process_geojson_lines<F>(geojson: &GeoJson, mut add_line: F)
where
    F: FnMut(LineString),
{
    match geojson {
        GeoJson::FeatureCollection(fc) => {
            for geometry in fc.features.iter().filter_map(|f| f.geometry.as_ref()) {
                process_geometry_lines(geometry, &mut add_line);
            }
        }
        GeoJson::Feature(f) => {
            if let Some(geometry) = &f.geometry {
                process_geometry_lines(geometry, &mut add_line);
            }
        }
        GeoJson::Geometry(geometry) => process_geometry_lines(geometry, &mut add_line),
    }
}

fn process_geometry_lines<F>(geometry: &Geometry, add_line: &mut F)
where
    F: FnMut(LineString),
{
    let to_line = |coords: &[Vec<f64>]| -> LineString {
        coords
            .iter()
            .filter(|c| c.len() >= 2)
            .map(|c| (c[0], c[1]))
            .collect()
    };

    match &geometry.value {
        Value::LineString(coords) => add_line(to_line(coords)),
        Value::MultiLineString(lines) => lines.iter().for_each(|l| add_line(to_line(l))),
        Value::Polygon(rings) => rings.iter().for_each(|r| add_line(to_line(r))),
        Value::MultiPolygon(polygons) => polygons
            .iter()
            .flatten()
            .for_each(|r| add_line(to_line(r))),
        Value::GeometryCollection(geometries) => {
            for g in geometries {
                process_geometry_lines(g, add_line);
            }
        }
        _ => {}
    }
}

/// Built-in outline used when no basemap directory is configured
pub fn simple_world() -> Basemap {
    let mut basemap = Basemap::new();

    // Continents, coarse
    #[rustfmt::skip]
    let continents: [&[(f64, f64)]; 4] = [
        &[
            (-168.0, 65.0), (-141.0, 60.0), (-125.0, 48.0), (-124.0, 40.0),
            (-117.0, 32.0), (-110.0, 25.0), (-97.0, 25.0), (-82.0, 24.0),
            (-81.0, 31.0), (-70.0, 41.0), (-55.0, 47.0), (-64.0, 60.0),
            (-95.0, 62.0), (-130.0, 70.0), (-168.0, 65.0),
        ],
        &[
            (-80.0, 10.0), (-60.0, 5.0), (-35.0, -5.0), (-40.0, -22.0),
            (-55.0, -34.0), (-68.0, -50.0), (-75.0, -52.0), (-72.0, -30.0),
            (-80.0, -5.0), (-80.0, 10.0),
        ],
        &[
            (-10.0, 36.0), (10.0, 37.0), (35.0, 30.0), (50.0, 12.0),
            (35.0, -20.0), (20.0, -35.0), (10.0, -15.0), (10.0, 0.0),
            (-17.0, 15.0), (-10.0, 36.0),
        ],
        &[
            (115.0, -20.0), (130.0, -12.0), (145.0, -15.0), (153.0, -30.0),
            (145.0, -38.0), (130.0, -32.0), (115.0, -35.0), (115.0, -20.0),
        ],
    ];
    for outline in continents {
        basemap.add_coastline(outline.to_vec(), Lod::Low);
    }

    // San Francisco Bay shorelines, the default view
    #[rustfmt::skip]
    let bay: [&[(f64, f64)]; 3] = [
        // Peninsula: ocean side, Golden Gate, bay side
        &[
            (-122.40, 37.30), (-122.47, 37.50), (-122.50, 37.60), (-122.51, 37.71),
            (-122.51, 37.78), (-122.48, 37.81), (-122.42, 37.81), (-122.39, 37.79),
            (-122.38, 37.73), (-122.39, 37.66), (-122.36, 37.60), (-122.25, 37.52),
            (-122.11, 37.45), (-121.98, 37.45),
        ],
        // East Bay
        &[
            (-121.98, 37.45), (-122.11, 37.50), (-122.17, 37.65), (-122.23, 37.72),
            (-122.28, 37.79), (-122.30, 37.83), (-122.30, 37.90), (-122.39, 37.96),
            (-122.42, 38.03),
        ],
        // Marin
        &[
            (-122.48, 37.83), (-122.50, 37.87), (-122.47, 37.90), (-122.50, 37.96),
            (-122.57, 37.90), (-122.65, 37.91), (-122.80, 38.00),
        ],
    ];
    for shore in bay {
        basemap.add_coastline(shore.to_vec(), Lod::High);
    }

    basemap
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("area-calc-{name}-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).expect("create scratch dir");
        dir
    }

    #[test]
    fn test_load_coastlines_and_borders() {
        let dir = scratch_dir("load");
        fs::write(
            dir.join("ne_110m_coastline.json"),
            r#"{"type":"FeatureCollection","features":[
                {"type":"Feature","properties":{},"geometry":
                    {"type":"LineString","coordinates":[[0,0],[1,1],[2,0]]}},
                {"type":"Feature","properties":{},"geometry":
                    {"type":"MultiPolygon","coordinates":[[[[0,0],[1,0],[1,1],[0,0]]]]}}
            ]}"#,
        )
        .expect("write coastline");
        fs::write(
            dir.join("ne_50m_borders.json"),
            r#"{"type":"LineString","coordinates":[[5,5],[6,6]]}"#,
        )
        .expect("write borders");

        let basemap = load_basemap(&dir).expect("basemap loads");
        assert_eq!(basemap.line_count(), 3);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = scratch_dir("malformed");
        fs::write(dir.join("ne_10m_coastline.json"), "{ not json").expect("write");
        let err = load_basemap(&dir).expect_err("should fail");
        assert!(format!("{err:#}").contains("ne_10m_coastline.json"));
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_empty_dir_is_an_error() {
        let dir = scratch_dir("empty");
        assert!(load_basemap(&dir).is_err());
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_simple_world_has_default_view_detail() {
        let basemap = simple_world();
        assert!(basemap.has_data());
        assert_eq!(basemap.line_count(), 7);
    }
}
