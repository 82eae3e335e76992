use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "commerce.txt API",
        version = "0.1.0",
        description = "Compress product catalogs (JSON, saved listing pages, JS bundles) into context-optimized Markdown for AI agents."
    ),
    paths(
        crate::routes::process,
        crate::routes::process_from_file,
        crate::routes::health,
    ),
    components(schemas(
        crate::dto::ProcessRequest,
        crate::dto::FileProcessRequest,
        crate::dto::ProcessedResponse,
        crate::dto::ProductResponse,
        crate::dto::SkippedItemResponse,
        crate::dto::HealthResponse,
        crate::dto::ErrorResponse,
    )),
    tags(
        (name = "process", description = "Render product sources into Markdown"),
        (name = "system", description = "Health and system status"),
    )
)]
pub struct ApiDoc;
