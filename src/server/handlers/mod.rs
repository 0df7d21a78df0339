pub mod frontend;
pub mod health;
pub mod query;
