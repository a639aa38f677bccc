pub mod initdb;
pub mod migrate_and_serve;
pub mod openapi;
pub mod seed_user;
pub mod serve;

pub use initdb::init_database;
pub use migrate_and_serve::migrate_and_serve;
pub use openapi::export_openapi;
pub use seed_user::seed_user;
pub use serve::serve;
