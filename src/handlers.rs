pub mod auth;
pub mod companies;
pub mod fallback;
pub mod health;
pub mod questionnaire;
pub mod users;
