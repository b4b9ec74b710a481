use clap::Parser;
use nutriscan::{
    ClassLabels, Detection, DetectionRecord, Detector, NutritionTable, RawOutput,
    DEFAULT_FOOD_LABELS, DEFAULT_NUM_BOXES,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const SCHEMA_JSON: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.schema.json"));
const EXAMPLE_JSON: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.example.json"));

#[derive(Parser, Debug)]
#[command(author, version, about = "NutriScan CLI (JSON config driven)")]
struct Cli {
    /// Path to the JSON configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "config.json")]
    config: PathBuf,
    /// Print the JSON schema and exit.
    #[arg(long)]
    print_schema: bool,
    /// Print an example config and exit.
    #[arg(long)]
    print_example: bool,
    /// Enable tracing output for performance profiling.
    #[arg(long)]
    trace: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum TensorFormat {
    /// Raw little-endian `f32` values.
    F32Le,
    /// A flat JSON array of numbers.
    Json,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct Config {
    tensor_path: String,
    tensor_format: TensorFormat,
    num_boxes: usize,
    labels: Vec<String>,
    nutrition_path: String,
    output_path: Option<String>,
    parallel: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tensor_path: String::new(),
            tensor_format: TensorFormat::F32Le,
            num_boxes: DEFAULT_NUM_BOXES,
            labels: DEFAULT_FOOD_LABELS.iter().map(|s| s.to_string()).collect(),
            nutrition_path: String::new(),
            output_path: None,
            parallel: false,
        }
    }
}

#[derive(Debug, Serialize)]
struct FoodRecord {
    text: String,
    label: String,
    score: f32,
    calories: u32,
    portion: String,
    bbox: [f32; 4],
}

impl From<DetectionRecord> for FoodRecord {
    fn from(value: DetectionRecord) -> Self {
        Self {
            text: value.text,
            label: value.label,
            score: value.score,
            calories: value.calories,
            portion: value.portion,
            bbox: [
                value.bbox.left,
                value.bbox.top,
                value.bbox.right,
                value.bbox.bottom,
            ],
        }
    }
}

#[derive(Debug, Serialize)]
struct Output {
    detections: Vec<FoodRecord>,
    total_calories: u64,
    elapsed_ms: u64,
}

impl From<Detection> for Output {
    fn from(value: Detection) -> Self {
        let total_calories = value.total_calories();
        Self {
            detections: value.records.into_iter().map(FoodRecord::from).collect(),
            total_calories,
            elapsed_ms: value.elapsed_ms,
        }
    }
}

fn read_tensor(path: &str, format: &TensorFormat) -> Result<Vec<f32>, Box<dyn std::error::Error>> {
    match format {
        TensorFormat::F32Le => {
            let bytes = fs::read(path)?;
            if bytes.len() % 4 != 0 {
                return Err(format!("{path}: length {} is not a multiple of 4", bytes.len()).into());
            }
            Ok(bytes
                .chunks_exact(4)
                .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
                .collect())
        }
        TensorFormat::Json => {
            let text = fs::read_to_string(path)?;
            Ok(serde_json::from_str(&text)?)
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.trace {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env().add_directive("nutriscan=info".parse()?))
            .with_target(false)
            .init();
    }

    if cli.print_schema {
        println!("{SCHEMA_JSON}");
        return Ok(());
    }
    if cli.print_example {
        println!("{EXAMPLE_JSON}");
        return Ok(());
    }

    let config_text = fs::read_to_string(&cli.config)?;
    let config: Config = serde_json::from_str(&config_text)?;
    if config.nutrition_path.is_empty() {
        return Err("nutrition_path must be set in the config".into());
    }
    if config.num_boxes == 0 {
        return Err("num_boxes must be at least 1".into());
    }

    let labels = ClassLabels::new(config.labels)?;
    let num_classes = labels.len();
    let table = NutritionTable::from_path(&config.nutrition_path)?;
    let detector = Detector::builder(labels, table)
        .parallel(config.parallel)
        .build()?;

    // An empty tensor path stands for a model that produced nothing.
    let raw = if config.tensor_path.is_empty() {
        None
    } else {
        let data = read_tensor(&config.tensor_path, &config.tensor_format)?;
        Some(RawOutput::detection(data, num_classes, config.num_boxes))
    };
    let detection = detector.detect_output(raw.as_ref())?;
    tracing::info!(
        detections = detection.len(),
        total_calories = detection.total_calories(),
        elapsed_ms = detection.elapsed_ms,
        "detection finished"
    );

    let output = Output::from(detection);
    let json = serde_json::to_string_pretty(&output)?;

    match config.output_path {
        Some(path) => fs::write(path, json)?,
        None => println!("{json}"),
    }

    Ok(())
}
