use anyhow::Result;
use utoipa::OpenApi;

use crate::cli::OpenApiFormat;
use crate::schemas::ApiDoc;

/// Render the OpenAPI document served at `/api-docs/openapi.json`.
pub fn export_openapi(format: OpenApiFormat) -> Result<String> {
    let doc = ApiDoc::openapi();
    Ok(match format {
        OpenApiFormat::Json => serde_json::to_string_pretty(&doc)?,
        OpenApiFormat::Yaml => serde_yaml::to_string(&doc)?,
    })
}
