mod database;
mod seed;

pub use database::Database;
pub use seed::seed_chart_from_csv;
