pub mod converters;
pub mod retry;
