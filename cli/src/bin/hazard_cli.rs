use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use geo_types::{Geometry, Point, Polygon};
use geojson::JsonObject;
use hazard_cli::{
    HazardProfile, feature, feature_collection_string, geometry_from_geojson_file, parse_lon_lat, parse_unit,
};
use hazard_geometry::{
    AdvancedShape, LinearUnit, PolygonReducer, codec, from_shape, geodesy, simplify_to_count,
};
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{self, EnvFilter};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode a GeoJSON geometry as base64 text
    Encode {
        /// Path to the GeoJSON input
        #[arg(short, long)]
        input: PathBuf,
    },
    /// Decode base64 text and print the flattened geometry as GeoJSON
    Decode {
        /// Text produced by `encode`
        #[arg(short, long)]
        text: String,
        /// Optional .toml or .json profile supplying flattening parameters
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Reduce every polygon in a GeoJSON file to a vertex budget, repairing self-intersections
    Reduce {
        #[arg(short, long)]
        input: PathBuf,
        /// Optional .toml or .json profile
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Overrides the profile's vertex budget
        #[arg(short, long)]
        max_vertices: Option<usize>,
    },
    /// Fill holes and remove least significant vertices down to a vertex budget
    Simplify {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(short, long)]
        max_vertices: Option<usize>,
    },
    /// Great-circle distance between two lon,lat points
    Distance {
        #[arg(short, long, value_parser = parse_unit, default_value = "miles")]
        unit: LinearUnit,
        #[arg(long, value_parser = parse_lon_lat, allow_hyphen_values = true)]
        from: Point<f64>,
        #[arg(long, value_parser = parse_lon_lat, allow_hyphen_values = true)]
        to: Point<f64>,
    },
    /// Point reached by travelling a distance from a lon,lat origin
    Offset {
        #[arg(short, long, value_parser = parse_unit, default_value = "miles")]
        unit: LinearUnit,
        #[arg(long, value_parser = parse_lon_lat, allow_hyphen_values = true)]
        from: Point<f64>,
        #[arg(long)]
        magnitude: f64,
        /// Radians counterclockwise from east
        #[arg(long, allow_hyphen_values = true)]
        direction: f64,
    },
    /// Print the JSON schema of the profile file
    Schema,
}

fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Encode { input } => encode(input)?,
        Commands::Decode { text, config } => decode(text, config.as_deref())?,
        Commands::Reduce { input, config, max_vertices } => reduce(input, config.as_deref(), *max_vertices)?,
        Commands::Simplify { input, config, max_vertices } => {
            simplify(input, config.as_deref(), *max_vertices)?
        }
        Commands::Distance { unit, from, to } => {
            let distance = geodesy::distance(*unit, *from, *to);
            println!("{distance} {unit}");
        }
        Commands::Offset { unit, from, magnitude, direction } => {
            let point = geodesy::offset(*unit, *from, *magnitude, *direction);
            println!("{},{}", point.x(), point.y());
        }
        Commands::Schema => {
            let schema = schemars::schema_for!(HazardProfile);
            println!("{}", serde_json::to_string_pretty(&schema)?);
        }
    }

    Ok(())
}

fn load_profile(config: Option<&Path>, max_vertices: Option<usize>) -> Result<HazardProfile> {
    let mut profile = match config {
        Some(path) => {
            info!("Loading profile from {:?}", path);
            HazardProfile::from_file(path)?
        }
        None => HazardProfile::default(),
    };
    if let Some(max_vertices) = max_vertices {
        profile.reduction.max_vertices = max_vertices;
    }
    Ok(profile)
}

fn encode(input: &Path) -> Result<()> {
    let geometry = geometry_from_geojson_file(input)?;
    let shape = from_shape(geometry)?;
    let text = codec::encode_text(&shape)?;
    info!("Encoded {} geometry into {} characters", shape.kind(), text.len());
    println!("{text}");
    Ok(())
}

fn decode(text: &str, config: Option<&Path>) -> Result<()> {
    let profile = load_profile(config, None)?;
    let shape = codec::decode_text(text.trim())?;
    let flattening = profile.flattening;
    let flattened = shape.as_flattened_geometry(flattening.flatness, flattening.limit);
    let centroid = shape.approximate_centroid(flattening.flatness, flattening.limit);

    let mut properties = JsonObject::new();
    properties.insert("kind".to_string(), json!(shape.kind()));
    properties.insert("valid".to_string(), json!(shape.is_valid()));
    properties.insert("centroid".to_string(), json!([centroid.x(), centroid.y()]));
    if let Some(problem) = shape.validity_problem() {
        warn!("Decoded geometry is invalid: {}", problem);
        properties.insert("problem".to_string(), json!(problem));
    }

    println!("{}", feature_collection_string(vec![feature(&flattened, properties)])?);
    Ok(())
}

fn reduce(input: &Path, config: Option<&Path>, max_vertices: Option<usize>) -> Result<()> {
    let profile = load_profile(config, max_vertices)?;
    let reducer = PolygonReducer::new(profile.reduction)?;
    let polygons = polygons_in(geometry_from_geojson_file(input)?);
    if polygons.is_empty() {
        return Err(eyre!("No polygons found in {:?}", input));
    }

    let mut features = Vec::new();
    for (index, polygon) in polygons.iter().enumerate() {
        let outcome = reducer.reduce(polygon);
        if !outcome.valid {
            warn!("Polygon {} could not be repaired", index);
        }
        info!("Polygon {}: {} vertices kept", index, outcome.vertex_count());

        let mut properties = JsonObject::new();
        properties.insert("index".to_string(), json!(index));
        properties.insert("valid".to_string(), json!(outcome.valid));
        properties.insert("vertices".to_string(), json!(outcome.vertex_count()));
        features.push(feature(&Geometry::Polygon(outcome.polygon), properties));
    }

    println!("{}", feature_collection_string(features)?);
    Ok(())
}

fn simplify(input: &Path, config: Option<&Path>, max_vertices: Option<usize>) -> Result<()> {
    let profile = load_profile(config, max_vertices)?;
    let geometry = geometry_from_geojson_file(input)?;
    let simplified = simplify_to_count(&geometry, &profile.reduction);

    let mut properties = JsonObject::new();
    properties.insert("max_vertices".to_string(), json!(profile.reduction.max_vertices));
    println!("{}", feature_collection_string(vec![feature(&simplified, properties)])?);
    Ok(())
}

fn polygons_in(geometry: Geometry<f64>) -> Vec<Polygon<f64>> {
    match geometry {
        Geometry::Polygon(polygon) => vec![polygon],
        Geometry::MultiPolygon(members) => members.0,
        Geometry::GeometryCollection(collection) => collection.0.into_iter().flat_map(polygons_in).collect(),
        _ => Vec::new(),
    }
}
