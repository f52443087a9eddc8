pub mod availability;
pub mod candidates;
pub mod error;
pub mod handlers;
pub mod load_balancer;
pub mod memory;
pub mod metrics;
pub mod models;
pub mod occupancy;
pub mod repository;
pub mod service;
pub mod status_machine;
pub mod store;
pub mod transaction;

pub use error::*;
pub use handlers::*;
pub use memory::InMemoryBookingStore;
pub use models::*;
pub use repository::*;
pub use service::*;
pub use status_machine::*;
pub use store::*;
pub use transaction::*;
