use super::ServiceArgs;
use anyhow::{bail, Context, Result};
use geoelev::geojson::elevate_geometry_lossy;
use geoelev::ElevationService;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

pub fn run(
    args: &ServiceArgs,
    input: PathBuf,
    output: Option<PathBuf>,
    lat_col: String,
    lon_col: String,
) -> Result<()> {
    let service = args.build()?;

    // Detect file format
    let extension = input
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    let start = Instant::now();
    let output_path = match extension.as_str() {
        "csv" => process_csv(&service, &input, output, &lat_col, &lon_col)?,
        "geojson" | "json" => process_geojson(&service, &input, output)?,
        _ => bail!(
            "Unsupported file format: {}. Use .csv or .geojson",
            extension
        ),
    };

    let stats = service.stats();
    tracing::info!(
        lookups = stats.lookups,
        nodata = stats.nodata,
        unresolved = stats.unresolved,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "batch complete"
    );
    println!("Output written to: {}", output_path.display());
    Ok(())
}

fn progress_bar(len: u64) -> Result<ProgressBar> {
    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})",
            )?
            .progress_chars("#>-"),
    );
    Ok(pb)
}

fn default_output(input: &Path, suffix: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    input.with_file_name(format!("{}_elevation.{}", stem, suffix))
}

fn process_csv(
    service: &ElevationService,
    input: &Path,
    output: Option<PathBuf>,
    lat_col: &str,
    lon_col: &str,
) -> Result<PathBuf> {
    let file = File::open(input).context("Failed to open input file")?;
    let mut reader = csv::Reader::from_reader(BufReader::new(file));

    // Find column indices
    let headers = reader.headers()?.clone();
    let lat_idx = headers
        .iter()
        .position(|h| h == lat_col)
        .with_context(|| format!("Column '{}' not found in CSV", lat_col))?;
    let lon_idx = headers
        .iter()
        .position(|h| h == lon_col)
        .with_context(|| format!("Column '{}' not found in CSV", lon_col))?;

    // Collect records for progress bar
    let records: Vec<_> = reader.records().collect::<Result<_, _>>()?;
    let pb = progress_bar(records.len() as u64)?;

    let output_path = output.unwrap_or_else(|| default_output(input, "csv"));
    let output_file = File::create(&output_path).context("Failed to create output file")?;
    let mut writer = csv::Writer::from_writer(BufWriter::new(output_file));

    let mut new_headers: Vec<&str> = headers.iter().collect();
    new_headers.push("elevation");
    writer.write_record(&new_headers)?;

    for (line, record) in records.iter().enumerate() {
        let lat: f64 = record
            .get(lat_idx)
            .context("Missing latitude")?
            .trim()
            .parse()
            .with_context(|| format!("Invalid latitude on record {}", line + 1))?;
        let lon: f64 = record
            .get(lon_idx)
            .context("Missing longitude")?
            .trim()
            .parse()
            .with_context(|| format!("Invalid longitude on record {}", line + 1))?;

        // Uncovered points read as sea level, like nodata
        let elevation = service.lookup(lat, lon).to_string();

        let mut new_record: Vec<&str> = record.iter().collect();
        new_record.push(&elevation);
        writer.write_record(&new_record)?;

        pb.inc(1);
    }

    pb.finish_with_message("done");
    writer.flush()?;
    Ok(output_path)
}

fn process_geojson(
    service: &ElevationService,
    input: &Path,
    output: Option<PathBuf>,
) -> Result<PathBuf> {
    let file = File::open(input).context("Failed to open input file")?;
    let reader = BufReader::new(file);

    let geojson: geojson::GeoJson =
        serde_json::from_reader(reader).context("Failed to parse GeoJSON")?;

    let mut unresolved = 0;
    let result = match geojson {
        geojson::GeoJson::Geometry(mut geometry) => {
            unresolved += elevate_geometry_lossy(service, &mut geometry);
            geojson::GeoJson::Geometry(geometry)
        }
        geojson::GeoJson::Feature(mut feature) => {
            if let Some(geometry) = feature.geometry.as_mut() {
                unresolved += elevate_geometry_lossy(service, geometry);
            }
            geojson::GeoJson::Feature(feature)
        }
        geojson::GeoJson::FeatureCollection(mut fc) => {
            let pb = progress_bar(fc.features.len() as u64)?;
            for feature in &mut fc.features {
                if let Some(geometry) = feature.geometry.as_mut() {
                    unresolved += elevate_geometry_lossy(service, geometry);
                }
                pb.inc(1);
            }
            pb.finish_with_message("done");
            geojson::GeoJson::FeatureCollection(fc)
        }
    };
    if unresolved > 0 {
        tracing::warn!(unresolved, "Positions without elevation written as sea level");
    }

    let output_path = output.unwrap_or_else(|| default_output(input, "geojson"));
    let output_file = File::create(&output_path).context("Failed to create output file")?;
    let mut writer = BufWriter::new(output_file);
    serde_json::to_writer_pretty(&mut writer, &result)?;
    writer.flush()?;
    Ok(output_path)
}
