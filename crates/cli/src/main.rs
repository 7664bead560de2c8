//! AgroZone CLI - management-zone delineation for precision agriculture

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::File;
use std::io::Write as IoWrite;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use agrozone_core::io::{read_index_raster, write_label_raster};
use agrozone_core::{Crs, GeoTransform, IndexStack, Raster};
use agrozone_zoning::polygonize::zone_polygons;
use agrozone_zoning::{ZoningConfig, ZoningInput, ZoningPipeline, ZoningResult};
use geo_types::{Coord, Geometry, LineString, MultiPolygon, Polygon};
use ndarray::Array2;

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "agrozone")]
#[command(author, version, about = "Management-zone delineation for precision agriculture", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show information about a raster file
    Info {
        /// Input raster file
        input: PathBuf,
    },
    /// Delineate management zones from spectral index rasters
    Zone {
        /// Index raster as NAME=FILE (repeatable), e.g. -i NDVI=ndvi.tif
        #[arg(short = 'i', long = "index", value_name = "NAME=FILE", required = true)]
        indices: Vec<String>,

        /// GeoJSON file with the field boundary polygon.
        /// Without it the boundary is derived from the finite-data footprint
        /// of the first index raster.
        #[arg(short, long)]
        boundary: Option<PathBuf>,

        /// CRS identifier forwarded to the outputs
        #[arg(long, value_name = "CRS")]
        crs: String,

        /// Output directory
        #[arg(short, long, default_value = "agrozone_output")]
        output: PathBuf,

        /// JSON configuration file; flags below override its values
        #[arg(long)]
        config: Option<PathBuf>,

        /// Force this cluster count instead of automatic selection
        #[arg(short = 'k', long)]
        force_k: Option<usize>,

        /// Minimum zone size in hectares
        #[arg(long)]
        min_zone_size: Option<f64>,

        /// Largest cluster count evaluated during automatic selection
        #[arg(long)]
        max_zones: Option<usize>,

        /// Minimum sampling points per zone
        #[arg(long)]
        points_per_zone: Option<usize>,

        /// Random seed
        #[arg(long)]
        seed: Option<u64>,

        /// Reduce feature dimensionality with PCA before clustering
        #[arg(long)]
        pca: bool,

        /// Also write the cluster-label raster as labels.tif
        #[arg(long)]
        write_labels: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    match cli.command {
        Commands::Info { input } => info_command(&input),
        Commands::Zone {
            indices,
            boundary,
            crs,
            output,
            config,
            force_k,
            min_zone_size,
            max_zones,
            points_per_zone,
            seed,
            pca,
            write_labels,
        } => zone_command(ZoneArgs {
            indices,
            boundary,
            crs,
            output,
            config,
            force_k,
            min_zone_size,
            max_zones,
            points_per_zone,
            seed,
            pca,
            write_labels,
        }),
    }
}

// ─── info ───────────────────────────────────────────────────────────────

fn info_command(input: &Path) -> Result<()> {
    let raster = read_index_raster(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;

    let (rows, cols) = raster.shape();
    let gt = raster.transform();
    let (min_x, min_y, max_x, max_y) = gt.bounds(cols, rows);

    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for &v in raster.data().iter() {
        if v.is_finite() {
            min = min.min(v);
            max = max.max(v);
        }
    }

    println!("File:       {}", input.display());
    println!("Size:       {cols} x {rows}");
    println!("Pixel size: {} x {}", gt.pixel_width, gt.pixel_height.abs());
    println!("Bounds:     ({min_x}, {min_y}) - ({max_x}, {max_y})");
    println!("Valid:      {} / {}", raster.valid_count(), raster.len());
    if min.is_finite() {
        println!("Range:      [{min}, {max}]");
    }
    Ok(())
}

// ─── zone ───────────────────────────────────────────────────────────────

struct ZoneArgs {
    indices: Vec<String>,
    boundary: Option<PathBuf>,
    crs: String,
    output: PathBuf,
    config: Option<PathBuf>,
    force_k: Option<usize>,
    min_zone_size: Option<f64>,
    max_zones: Option<usize>,
    points_per_zone: Option<usize>,
    seed: Option<u64>,
    pca: bool,
    write_labels: bool,
}

fn zone_command(args: ZoneArgs) -> Result<()> {
    let config = build_config(&args)?;
    let (stack, transform) = load_index_stack(&args.indices)?;
    let index_names: Vec<String> = stack.names().map(str::to_string).collect();

    let field = match &args.boundary {
        Some(path) => read_boundary_geojson(path)?,
        None => derive_footprint(&stack, &transform)?,
    };

    let input = ZoningInput {
        indices: stack,
        field,
        transform,
        crs: Crs::new(&args.crs),
    };

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner} {msg} [{elapsed}]")
            .expect("static template is valid"),
    );
    spinner.set_message("delineating zones");
    spinner.enable_steady_tick(Duration::from_millis(100));

    let start = Instant::now();
    let result = ZoningPipeline::new(config)
        .map_err(|e| anyhow::anyhow!(e.to_string()))?
        .run(input)
        .map_err(|e| anyhow::anyhow!(e.to_string()))?;
    spinner.finish_and_clear();

    info!(
        zones = result.zones.len(),
        samples = result.samples.len(),
        elapsed = ?start.elapsed(),
        "zoning finished"
    );

    std::fs::create_dir_all(&args.output)
        .with_context(|| format!("Cannot create {}", args.output.display()))?;

    write_zones_geojson(&result, &index_names, &args.output.join("zones.geojson"))?;
    write_samples_geojson(&result, &index_names, &args.output.join("samples.geojson"))?;
    write_stats_csv(&result, &index_names, &args.output.join("zone_stats.csv"))?;
    write_metrics_json(&result, &args.output.join("cluster_metrics.json"))?;

    if args.write_labels {
        let path = args.output.join("labels.tif");
        let mut raster = Raster::from_array(result.assignment.clone());
        raster.set_transform(transform);
        raster.set_crs(Some(result.crs.clone()));
        write_label_raster(&raster, &path)
            .map_err(|e| anyhow::anyhow!("Cannot write label raster: {e}"))?;
        info!(path = %path.display(), "label raster written");
    }

    println!("Zones:      {}", result.zones.len());
    println!("Samples:    {}", result.samples.len());
    println!("Silhouette: {:.4}", result.metrics.silhouette);
    println!("Output:     {}", args.output.display());
    Ok(())
}

fn build_config(args: &ZoneArgs) -> Result<ZoningConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("Cannot open config {}", path.display()))?;
            serde_json::from_reader(file)
                .with_context(|| format!("Invalid config {}", path.display()))?
        }
        None => ZoningConfig::default(),
    };

    if let Some(k) = args.force_k {
        config.force_k = Some(k);
    }
    if let Some(v) = args.min_zone_size {
        config.min_zone_size_ha = v;
    }
    if let Some(v) = args.max_zones {
        config.max_zones = v;
    }
    if let Some(v) = args.points_per_zone {
        config.points_per_zone = v;
    }
    if let Some(v) = args.seed {
        config.seed = v;
    }
    if args.pca {
        config.use_pca = true;
    }

    Ok(config)
}

/// Read every `NAME=FILE` raster; the first one supplies the geotransform.
fn load_index_stack(specs: &[String]) -> Result<(IndexStack, GeoTransform)> {
    let mut stack = IndexStack::new();
    let mut transform: Option<GeoTransform> = None;

    for spec in specs {
        let (name, path) = spec
            .split_once('=')
            .with_context(|| format!("Expected NAME=FILE, got '{spec}'"))?;

        let raster = read_index_raster(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;

        if transform.is_none() {
            transform = Some(*raster.transform());
        }

        stack
            .insert(name, raster.into_array())
            .map_err(|e| anyhow::anyhow!("Index {name}: {e}"))?;
        info!(index = name, file = path, "index raster loaded");
    }

    let transform = transform.context("At least one index raster is required")?;
    Ok((stack, transform))
}

/// Field boundary from the finite-data footprint of the first index.
fn derive_footprint(stack: &IndexStack, transform: &GeoTransform) -> Result<Geometry<f64>> {
    let (name, first) = stack.iter().next().context("Index stack is empty")?;
    let (rows, cols) = first.dim();

    let mut footprint = Array2::from_elem((rows, cols), -1i32);
    for r in 0..rows {
        for c in 0..cols {
            if first[[r, c]].is_finite() {
                footprint[[r, c]] = 0;
            }
        }
    }

    let mut zones = zone_polygons(&footprint, transform)
        .map_err(|e| anyhow::anyhow!("Cannot derive field boundary from {name}: {e}"))?;
    let (_, merged) = zones.remove(0);
    info!(index = name, parts = merged.0.len(), "field boundary derived from data footprint");
    Ok(Geometry::MultiPolygon(merged))
}

// ─── GeoJSON I/O ────────────────────────────────────────────────────────

/// Accepts a bare geometry, a Feature, or a FeatureCollection holding one
/// areal feature.
fn read_boundary_geojson(path: &Path) -> Result<Geometry<f64>> {
    let file = File::open(path)
        .with_context(|| format!("Cannot open boundary {}", path.display()))?;
    let value: serde_json::Value = serde_json::from_reader(file)
        .with_context(|| format!("Invalid JSON in {}", path.display()))?;

    let geometry = match value["type"].as_str() {
        Some("FeatureCollection") => value["features"]
            .as_array()
            .and_then(|f| f.first())
            .map(|f| f["geometry"].clone())
            .context("FeatureCollection has no features")?,
        Some("Feature") => value["geometry"].clone(),
        Some(_) => value.clone(),
        None => bail!("Boundary file has no GeoJSON type"),
    };

    parse_geojson_geometry(&geometry)
}

fn parse_geojson_geometry(value: &serde_json::Value) -> Result<Geometry<f64>> {
    match value["type"].as_str() {
        Some("Polygon") => Ok(Geometry::Polygon(parse_polygon(&value["coordinates"])?)),
        Some("MultiPolygon") => {
            let polys = value["coordinates"]
                .as_array()
                .context("MultiPolygon coordinates missing")?
                .iter()
                .map(parse_polygon)
                .collect::<Result<Vec<_>>>()?;
            Ok(Geometry::MultiPolygon(MultiPolygon::new(polys)))
        }
        other => bail!("Unsupported boundary geometry type: {other:?}"),
    }
}

fn parse_polygon(rings: &serde_json::Value) -> Result<Polygon<f64>> {
    let rings = rings.as_array().context("Polygon coordinates missing")?;
    let mut parsed: Vec<LineString<f64>> = rings
        .iter()
        .map(parse_ring)
        .collect::<Result<Vec<_>>>()?;
    if parsed.is_empty() {
        bail!("Polygon has no rings");
    }
    let exterior = parsed.remove(0);
    Ok(Polygon::new(exterior, parsed))
}

fn parse_ring(value: &serde_json::Value) -> Result<LineString<f64>> {
    let coords = value
        .as_array()
        .context("Ring is not an array")?
        .iter()
        .map(|pos| {
            let pair = pos.as_array().context("Position is not an array")?;
            let x = pair.first().and_then(|v| v.as_f64()).context("Bad x")?;
            let y = pair.get(1).and_then(|v| v.as_f64()).context("Bad y")?;
            Ok(Coord { x, y })
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(LineString::new(coords))
}

fn multipolygon_json(mp: &MultiPolygon<f64>) -> serde_json::Value {
    let polygons: Vec<serde_json::Value> = mp
        .0
        .iter()
        .map(|p| {
            let mut rings = vec![ring_json(p.exterior())];
            rings.extend(p.interiors().iter().map(ring_json));
            serde_json::Value::Array(rings)
        })
        .collect();
    serde_json::json!({ "type": "MultiPolygon", "coordinates": polygons })
}

fn ring_json(ring: &LineString<f64>) -> serde_json::Value {
    serde_json::Value::Array(
        ring.0
            .iter()
            .map(|c| serde_json::json!([c.x, c.y]))
            .collect(),
    )
}

// ─── result rendering ───────────────────────────────────────────────────

fn write_zones_geojson(result: &ZoningResult, names: &[String], path: &Path) -> Result<()> {
    let features: Vec<serde_json::Value> = result
        .zones
        .iter()
        .zip(&result.stats)
        .map(|(zone, stats)| {
            let mut properties = serde_json::Map::new();
            properties.insert("zone_id".into(), zone.zone_id.into());
            properties.insert("area_ha".into(), zone.area_ha.into());
            properties.insert("perimeter_m".into(), zone.perimeter_m.into());
            properties.insert("compactness".into(), zone.compactness.into());
            for (i, name) in names.iter().enumerate() {
                properties.insert(format!("{name}_mean"), json_number(stats.mean_values[i]));
                properties.insert(format!("{name}_std"), json_number(stats.std_values[i]));
            }
            serde_json::json!({
                "type": "Feature",
                "geometry": multipolygon_json(&zone.geometry),
                "properties": properties,
            })
        })
        .collect();

    write_feature_collection(result, features, path)
}

fn write_samples_geojson(result: &ZoningResult, names: &[String], path: &Path) -> Result<()> {
    let features: Vec<serde_json::Value> = result
        .samples
        .iter()
        .map(|sample| {
            let mut properties = serde_json::Map::new();
            properties.insert("zone_id".into(), sample.zone_id.into());
            for (i, name) in names.iter().enumerate() {
                properties.insert(name.clone(), json_number(sample.values[i]));
            }
            serde_json::json!({
                "type": "Feature",
                "geometry": {
                    "type": "Point",
                    "coordinates": [sample.point.x(), sample.point.y()],
                },
                "properties": properties,
            })
        })
        .collect();

    write_feature_collection(result, features, path)
}

fn write_feature_collection(
    result: &ZoningResult,
    features: Vec<serde_json::Value>,
    path: &Path,
) -> Result<()> {
    let collection = serde_json::json!({
        "type": "FeatureCollection",
        "crs": {
            "type": "name",
            "properties": { "name": result.crs.as_str() },
        },
        "features": features,
    });

    let file = File::create(path)
        .with_context(|| format!("Cannot create {}", path.display()))?;
    serde_json::to_writer_pretty(file, &collection)
        .with_context(|| format!("Cannot write {}", path.display()))?;
    info!(path = %path.display(), "layer written");
    Ok(())
}

fn write_stats_csv(result: &ZoningResult, names: &[String], path: &Path) -> Result<()> {
    let mut file = File::create(path)
        .with_context(|| format!("Cannot create {}", path.display()))?;

    let mut header = String::from("zone_id,area_ha,perimeter_m,compactness");
    for name in names {
        header.push_str(&format!(",{name}_mean,{name}_std"));
    }
    writeln!(file, "{header}")?;

    for (zone, stats) in result.zones.iter().zip(&result.stats) {
        let mut row = format!(
            "{},{},{},{}",
            zone.zone_id, zone.area_ha, zone.perimeter_m, zone.compactness
        );
        for i in 0..names.len() {
            row.push_str(&format!(",{},{}", stats.mean_values[i], stats.std_values[i]));
        }
        writeln!(file, "{row}")?;
    }

    info!(path = %path.display(), rows = result.zones.len(), "zone statistics written");
    Ok(())
}

fn write_metrics_json(result: &ZoningResult, path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Cannot create {}", path.display()))?;
    serde_json::to_writer_pretty(file, &result.metrics)
        .with_context(|| format!("Cannot write {}", path.display()))?;
    info!(path = %path.display(), "cluster metrics written");
    Ok(())
}

/// NaN is not representable in JSON; render it as null the way GDAL does.
fn json_number(v: f64) -> serde_json::Value {
    serde_json::Number::from_f64(v)
        .map(serde_json::Value::Number)
        .unwrap_or(serde_json::Value::Null)
}
