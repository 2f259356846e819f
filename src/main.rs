#[cfg(feature = "ssr")]
#[tokio::main]
async fn main() {
    use axum::Router;
    use leptos::prelude::*;
    use leptos_axum::{generate_route_list, LeptosRoutes};
    use tower_http::services::ServeDir;
    use tower_http::trace::TraceLayer;
    use tracing_subscriber::EnvFilter;
    use wedding_rsvp::app::*;
    use wedding_rsvp::config::AppConfig;
    use wedding_rsvp::ticket::TICKETS_ROUTE;
    use wedding_rsvp::{build_pool, functions};

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,wedding_rsvp=debug,tower_http=info")),
        )
        .init();

    let config = AppConfig::from_env().expect("Invalid configuration");
    let pool = build_pool(&config.database_url, 8).expect("Failed to create pool.");
    std::fs::create_dir_all(&config.ticket_dir).expect("Failed to create ticket directory.");

    let conf = get_configuration(None).unwrap();
    let addr = conf.leptos_options.site_addr;
    let leptos_options = conf.leptos_options;
    // Generate the list of routes in your Leptos App
    let routes = generate_route_list(App);

    let context_pool = pool.clone();
    let context_config = config.clone();
    let leptos_options_clone = leptos_options.clone();
    let app = Router::new()
        .leptos_routes_with_context(
            &leptos_options,
            routes,
            // Provide pool and settings for server functions.
            move || {
                provide_context(context_pool.clone());
                provide_context(context_config.clone());
            },
            // Use App for main routes.
            move || shell(leptos_options_clone.clone()),
        )
        .nest("/functions/v1", functions::router(pool))
        .nest_service(TICKETS_ROUTE, ServeDir::new(&config.ticket_dir))
        // Use shell for fallback.
        .fallback(leptos_axum::file_and_error_handler(shell))
        .layer(TraceLayer::new_for_http())
        .with_state(leptos_options.clone());

    tracing::info!(event = %config.event_name, "listening on http://{}", &addr);
    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();
    axum::serve(listener, app.into_make_service())
        .await
        .unwrap();
}

#[cfg(not(feature = "ssr"))]
pub fn main() {
    // no client-side main function
    // see lib.rs for hydration function instead
}
