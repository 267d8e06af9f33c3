// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! CLI tool: run the classical floorplan pipeline on one image
//!
//! Usage:
//!   floorplan-predict <image_path> [options]

use floorplan_vision::{
    background_prediction, calculate_statistics, classical_registry, decode_image, to_geojson,
    to_svg, FloorplanPredictor, ModelKind, Prediction, Roi, DEFAULT_PIXELS_PER_METER,
};
use std::env;
use std::fs;
use std::process;

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        print_usage();
        return;
    }

    let image_path = &args[1];

    // Parse options
    let mut models: Vec<ModelKind> = Vec::new();
    let mut pixels_per_meter: Option<f64> = None;
    let mut rois: Vec<Roi> = Vec::new();
    let mut geojson_path: Option<String> = None;
    let mut svg_path: Option<String> = None;
    let mut with_stats = false;
    let mut with_background = false;

    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--model" => {
                i += 1;
                models.push(parse_or_exit(args.get(i), "model"));
            }
            "--ppm" => {
                i += 1;
                pixels_per_meter = Some(parse_or_exit(args.get(i), "pixels per meter"));
            }
            "--roi" => {
                i += 1;
                rois.push(parse_roi(args.get(i)));
            }
            "--geojson" => {
                i += 1;
                geojson_path = args.get(i).cloned();
            }
            "--svg" => {
                i += 1;
                svg_path = args.get(i).cloned();
            }
            "--stats" => {
                with_stats = true;
            }
            "--background" => {
                with_background = true;
            }
            other => {
                eprintln!("Unknown option: {}", other);
                print_usage();
                process::exit(1);
            }
        }
        i += 1;
    }

    if models.is_empty() {
        models = vec![ModelKind::Walls, ModelKind::Spaces];
    }

    println!("=== Floorplan Prediction ===");

    let bytes = fs::read(image_path).unwrap_or_else(|e| {
        eprintln!("Error: Cannot read image '{}': {}", image_path, e);
        process::exit(1);
    });
    let image = decode_image(&bytes).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        process::exit(1);
    });
    let (width, height) = image.dimensions();
    println!("  Image size: {}x{} pixels", width, height);

    let registry = classical_registry().unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        process::exit(1);
    });
    let predictor = FloorplanPredictor::default();

    let mut combined = Prediction::new();
    for kind in &models {
        match predictor.predict_with(&registry, *kind, &image, &rois, pixels_per_meter) {
            Ok(prediction) => {
                println!("  {:<8} {} shapes", kind, prediction.len());
                combined.extend(prediction);
            }
            Err(e) => {
                eprintln!("Error: {} prediction failed: {}", kind, e);
                process::exit(1);
            }
        }
    }

    if with_background {
        match background_prediction(&combined, width, height) {
            Ok(background) => {
                println!("  Background: {} regions", background.len());
                combined.extend(background);
            }
            Err(e) => eprintln!("Warning: background derivation failed: {}", e),
        }
    }

    if with_stats {
        let ppm = pixels_per_meter.unwrap_or(DEFAULT_PIXELS_PER_METER);
        match calculate_statistics(&combined, ppm).and_then(|s| Ok(serde_json::to_string_pretty(&s)?)) {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("Warning: statistics failed: {}", e),
        }
    }

    if let Some(path) = geojson_path {
        let written = to_geojson(&combined)
            .map_err(|e| e.to_string())
            .and_then(|text| fs::write(&path, text).map_err(|e| e.to_string()));
        match written {
            Ok(()) => println!("  GeoJSON written to {}", path),
            Err(e) => eprintln!("Error: Cannot write '{}': {}", path, e),
        }
    }

    if let Some(path) = svg_path {
        match fs::write(&path, to_svg(&combined, width, height)) {
            Ok(()) => println!("  SVG written to {}", path),
            Err(e) => eprintln!("Error: Cannot write '{}': {}", path, e),
        }
    }
}

fn parse_or_exit<T: std::str::FromStr>(value: Option<&String>, what: &str) -> T {
    value.and_then(|v| v.parse().ok()).unwrap_or_else(|| {
        eprintln!("Invalid {} value", what);
        process::exit(1);
    })
}

fn parse_roi(value: Option<&String>) -> Roi {
    let parts: Vec<u32> = value
        .map(|v| v.split(',').filter_map(|p| p.trim().parse().ok()).collect())
        .unwrap_or_default();
    match parts.as_slice() {
        [xmin, ymin, xmax, ymax] => Roi::new(*xmin, *ymin, *xmax, *ymax),
        _ => {
            eprintln!("Invalid roi, expected xmin,ymin,xmax,ymax");
            process::exit(1);
        }
    }
}

fn print_usage() {
    println!("Usage: floorplan-predict <image_path> [options]");
    println!();
    println!("Options:");
    println!("  --model <kind>       Model to run: roi, walls, spaces (repeatable, default walls + spaces)");
    println!("  --ppm <value>        Source pixels per meter; rescales to 40 px/m before inference");
    println!("  --roi <x0,y0,x1,y1>  Region of interest (repeatable, default: detected layout)");
    println!("  --geojson <path>     Write shapes as GeoJSON");
    println!("  --svg <path>         Write shapes as SVG");
    println!("  --stats              Print room and element statistics");
    println!("  --background         Add the derived background region");
}
