use std::io;
use std::sync::Arc;

use dotenvy::dotenv;
use orders_service::application::order_service::OrderService;
use orders_service::config::Config;
use orders_service::infrastructure::{
    DieselOrderRepository, HttpPaymentGateway, HttpProductCatalog,
};
use orders_service::{build_server, create_pool, run_migrations};

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = Config::from_env().map_err(io::Error::other)?;

    let pool = create_pool(&config.database_url).map_err(io::Error::other)?;
    run_migrations(&pool).map_err(io::Error::other)?;
    log::info!("Order store ready");

    let catalog = HttpProductCatalog::new(&config.products_service_url, config.remote_timeout)
        .map_err(io::Error::other)?;
    let payments = HttpPaymentGateway::new(&config.payments_service_url, config.remote_timeout)
        .map_err(io::Error::other)?;

    let service = OrderService::new(
        Arc::new(DieselOrderRepository::new(pool)),
        Arc::new(catalog),
        Arc::new(payments),
        config.service_settings(),
    );

    log::info!("Starting server at http://{}:{}", config.host, config.port);

    build_server(service, &config.host, config.port)?.await
}
