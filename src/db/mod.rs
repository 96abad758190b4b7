pub mod error;
pub mod favorites;
pub mod ingredients;
pub mod recipes;
pub mod shopping_list;
pub mod subscriptions;
pub mod tags;
pub mod user;

pub type PostgresTransaction = sqlx::Transaction<'static, sqlx::Postgres>;
