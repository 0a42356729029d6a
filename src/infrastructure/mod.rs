pub mod json;
pub mod memory_repo;
pub mod models;
pub mod order_repo;
pub mod payment_client;
pub mod product_client;

pub use memory_repo::InMemoryOrderRepository;
pub use order_repo::DieselOrderRepository;
pub use payment_client::HttpPaymentGateway;
pub use product_client::HttpProductCatalog;
