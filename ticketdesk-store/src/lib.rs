pub mod app_config;
pub mod database;
pub mod route_repo;
pub mod booking_repo;
pub mod user_repo;
pub mod memory;
pub mod seed;

pub use database::DbClient;
pub use route_repo::PgRouteRepository;
pub use booking_repo::PgBookingRepository;
pub use user_repo::PgUserRepository;
pub use memory::MemoryStore;
