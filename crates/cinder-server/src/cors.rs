use cinder_config::{AnyOrArray, CorsConfig};
use http::Method;
use http::header::HeaderName;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};

/// Response headers browsers need to read download metadata
const DOWNLOAD_HEADERS: [&str; 4] = ["content-disposition", "x-expires-at", "x-voice", "x-speed"];

/// Build a Tower CORS layer from configuration
pub fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let mut layer = CorsLayer::new();

    layer = match &config.origins {
        AnyOrArray::Any => layer.allow_origin(AllowOrigin::any()),
        AnyOrArray::List(origins) => {
            let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
            layer.allow_origin(origins)
        }
    };

    layer = match &config.methods {
        AnyOrArray::Any => layer.allow_methods(AllowMethods::any()),
        AnyOrArray::List(methods) => {
            let methods: Vec<Method> = methods.iter().filter_map(|m| m.parse().ok()).collect();
            layer.allow_methods(methods)
        }
    };

    layer = match &config.headers {
        AnyOrArray::Any => layer.allow_headers(AllowHeaders::any()),
        AnyOrArray::List(headers) => {
            let headers: Vec<HeaderName> = headers.iter().filter_map(|h| h.parse().ok()).collect();
            layer.allow_headers(headers)
        }
    };

    let exposed: Vec<HeaderName> = DOWNLOAD_HEADERS
        .iter()
        .copied()
        .chain(config.expose_headers.iter().map(String::as_str))
        .filter_map(|h| h.parse().ok())
        .collect();
    layer = layer.expose_headers(exposed);

    if let Some(max_age) = config.max_age {
        layer = layer.max_age(max_age);
    }

    layer
}
