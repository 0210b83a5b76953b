//! Server construction and middleware wiring.

mod config;
#[cfg(feature = "metrics")]
mod metrics;
mod state_builders;

pub use config::ServerConfig;

#[cfg(feature = "metrics")]
use metrics::MetricsLayer;
use state_builders::{DiscoveryRuntime, build_runtime};

use std::sync::Arc;
use std::time::Duration;

use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};
use tracing::{debug, warn};

use discovery::Trace;
#[cfg(debug_assertions)]
use discovery::doc::ApiDoc;
use discovery::inbound::http::discovery::configure as configure_discovery;
use discovery::inbound::http::health::{HealthState, live, ready};
use discovery::inbound::http::state::HttpState;
use discovery::outbound::cache::InMemoryResultCache;
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

fn build_app(
    health_state: web::Data<HealthState>,
    http_state: web::Data<HttpState>,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let api = web::scope("/api/v1").configure(configure_discovery);

    let app = App::new()
        .app_data(health_state)
        .app_data(http_state)
        .wrap(Trace)
        .service(api)
        .service(ready)
        .service(live);

    #[cfg(debug_assertions)]
    let app = app.service(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));
    #[cfg(not(debug_assertions))]
    let app = app;

    app
}

/// Evict expired cache entries every `period` so idle keys do not pin memory.
fn spawn_cache_sweeper(cache: Arc<InMemoryResultCache>, period: Duration) {
    actix_web::rt::spawn(async move {
        let mut ticker = actix_web::rt::time::interval(period);
        loop {
            ticker.tick().await;
            match cache.sweep() {
                Ok(0) => {}
                Ok(removed) => debug!(removed, "swept expired cache entries"),
                Err(err) => warn!(error = %err, "cache sweep failed"),
            }
        }
    });
}

/// Construct an Actix HTTP server using the provided health state and configuration.
///
/// Seeds the in-memory stores, starts the search-event worker and the cache
/// sweeper on the current runtime, then binds the listener.
///
/// # Parameters
/// - `health_state`: shared readiness state updated once the server is initialised.
/// - `config`: pre-built [`ServerConfig`] containing binding, store and optional metrics settings.
///
/// # Returns
/// A spawned [`Server`] that must be awaited to drive the listener.
///
/// # Errors
/// Propagates [`std::io::Error`] when fixtures cannot be loaded, metrics cannot
/// be registered, or binding the socket fails.
pub fn create_server(
    health_state: web::Data<HealthState>,
    config: ServerConfig,
) -> std::io::Result<Server> {
    let server_health_state = health_state.clone();
    let DiscoveryRuntime {
        http_state,
        cache,
        worker,
    } = build_runtime(&config)?;
    actix_web::rt::spawn(worker.run());
    spawn_cache_sweeper(cache, config.sweep_interval);

    let ServerConfig {
        bind_addr,
        #[cfg(feature = "metrics")]
        prometheus,
        ..
    } = config;

    #[cfg(feature = "metrics")]
    let metrics_layer = MetricsLayer::from_option(prometheus);

    let server = HttpServer::new(move || {
        let app = build_app(server_health_state.clone(), http_state.clone());

        #[cfg(feature = "metrics")]
        let app = app.wrap(metrics_layer.clone());

        app
    })
    .bind(bind_addr)?
    .run();

    health_state.mark_ready();
    Ok(server)
}
