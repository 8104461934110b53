//! HTTP and GraphQL execution over `reqwest`.

mod executor;
mod graphql;
pub(crate) mod tls;

pub use executor::HttpExecutor;
