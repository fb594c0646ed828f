pub mod config;
pub mod executor;
pub mod query;
pub mod unit_of_work;
pub mod utils;

pub use config::PostgresConfig;
pub use executor::{Executor, SqlParam};
pub use query::PgQuery;
pub use unit_of_work::PgUnitOfWork;

#[cfg(test)]
pub mod test_helper;
