use std::{env, process::exit, sync::Arc};

use actix_web::{App, HttpServer, middleware::Logger, web};
use alphavantage_api::api::AlphaVantageAPI;
use log::{error, info};
use ticker_cache::StockTickerCache;

use config::Config;

mod config;
mod routes;
mod utils;

fn init_logger() {
    let default_filter = match env::var("ENV").as_deref() {
        Ok("dev") => "debug",
        _ => "info",
    };
    env_logger::init_from_env(env_logger::Env::new().default_filter_or(default_filter));
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    init_logger();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Could not create config: {}", e);
            exit(1);
        }
    };

    let mut api = AlphaVantageAPI::new(config.api_key.clone(), config.cache.upstream_timeout);
    if let Some(base_url) = &config.alphavantage_base_url {
        api = api.with_base_url(base_url.as_str());
    }

    info!(
        "Serving {} day average for {} on {}:{}",
        config.cache.window_size, config.cache.symbol, config.host, config.port
    );

    let cache = web::Data::new(StockTickerCache::new(config.cache.clone(), Arc::new(api)));

    let mut server = HttpServer::new(move || {
        App::new()
            .app_data(cache.clone())
            .configure(routes::configure)
            .default_service(web::to(routes::not_found))
            .wrap(Logger::default())
    })
    .bind((config.host.as_str(), config.port))?;

    if let Some(workers) = config.workers {
        server = server.workers(workers);
    }

    server.run().await
}
