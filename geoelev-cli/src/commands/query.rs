use super::ServiceArgs;
use anyhow::{Context, Result};
use serde::Serialize;
use std::time::Instant;

#[derive(Serialize)]
struct ElevationResponse {
    lat: f64,
    lon: f64,
    elevation: Option<i16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tile: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

pub fn run(args: &ServiceArgs, lat: f64, lon: f64, json: bool) -> Result<()> {
    let service = args.build()?;

    let start = Instant::now();
    let tile = service.resolve(lat, lon).ok().map(|t| t.id().to_string());
    let result = service.get_elevation(lat, lon);
    tracing::info!(
        lat,
        lon,
        elapsed_us = start.elapsed().as_micros() as u64,
        "lookup"
    );

    if json {
        let response = match &result {
            Ok(elevation) => ElevationResponse {
                lat,
                lon,
                elevation: *elevation,
                tile,
                error: None,
            },
            Err(e) => ElevationResponse {
                lat,
                lon,
                elevation: None,
                tile,
                error: Some(e.to_string()),
            },
        };
        println!("{}", serde_json::to_string(&response)?);
        return Ok(());
    }

    match result.context("Failed to get elevation")? {
        Some(elevation) => println!("{}", elevation),
        None => println!("void"),
    }

    Ok(())
}
