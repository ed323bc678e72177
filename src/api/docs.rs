//! OpenAPI document and Swagger UI.

use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use super::{analysis, handlers, search};

pub const SWAGGER_UI_PATH: &str = "/swagger-ui";
pub const OPENAPI_JSON_PATH: &str = "/api-docs/openapi.json";

#[derive(OpenApi)]
#[openapi(
    info(
        title = "izza-back",
        description = "Land search and industrial site analysis API"
    ),
    paths(
        handlers::health,
        handlers::ready,
        handlers::metrics,
        search::land_area_range,
        search::official_land_price_range,
        search::use_zone_categories,
        search::electric_bill_range,
        search::substation_count_range,
        search::transmission_tower_count_range,
        search::transmission_line_count_range,
        search::disaster_count_range,
        search::regions,
        search::region_land_area_range,
        search::region_official_land_price_range,
        search::region_land_count,
        search::land_points,
        search::polygon,
        search::land_detail,
        search::area_detail,
        analysis::analyze,
    ),
    tags(
        (name = "ops", description = "Health and metrics"),
        (name = "base-info", description = "Filter ranges and region pickers"),
        (name = "land-search", description = "Map markers and land details"),
        (name = "land-analysis", description = "Land scoring and ranking")
    )
)]
pub struct ApiDoc;

/// The document with the analysis path moved under `base_path`.
pub fn openapi(base_path: &str) -> utoipa::openapi::OpenApi {
    let mut doc = ApiDoc::openapi();
    if !base_path.is_empty() {
        let paths = &mut doc.paths.paths;
        if let Some(item) = paths.remove(super::routes::ANALYZE_PATH) {
            paths.insert(format!("{}{}", base_path, super::routes::ANALYZE_PATH), item);
        }
    }
    doc
}

pub fn swagger_ui(base_path: &str) -> SwaggerUi {
    SwaggerUi::new(SWAGGER_UI_PATH).url(OPENAPI_JSON_PATH, openapi(base_path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_route() {
        let doc = openapi("");
        assert!(doc.paths.paths.contains_key("/api/v1/land-search/points"));
        assert!(doc.paths.paths.contains_key("/api/v1/land-analysis/analyze"));
        assert_eq!(doc.paths.paths.len(), 20);
    }

    #[test]
    fn analysis_path_follows_base_path() {
        let doc = openapi("/izza");
        assert!(doc.paths.paths.contains_key("/izza/api/v1/land-analysis/analyze"));
        assert!(!doc.paths.paths.contains_key("/api/v1/land-analysis/analyze"));
    }
}
