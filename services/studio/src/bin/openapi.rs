//! services/studio/src/bin/openapi.rs
//!
//! Writes the studio's OpenAPI document to `openapi.json`, or to the path
//! given as the first argument, so the browser UI can generate its client.

use std::path::PathBuf;
use studio_lib::{error::AppError, web::rest::ApiDoc};
use utoipa::OpenApi;

fn main() -> Result<(), AppError> {
    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("openapi.json"));

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let document = ApiDoc::openapi();
    let route_count = document.paths.paths.len();
    std::fs::write(&path, document.to_pretty_json()?)?;
    println!(
        "✅ OpenAPI document with {} paths written to {}",
        route_count,
        path.display()
    );
    Ok(())
}
