//! SeaORM entities for the dashboard backend.
//!
//! Only two tables exist: `users` and `companies`. Questionnaire answers are
//! embedded in the company row rather than living in a table of their own.

pub mod company;
pub mod user;

pub mod prelude {
    //! A prelude module for easy importing of all entities.
    pub use super::company::Entity as Company;
    pub use super::user::Entity as User;
}
