//! Rate My Next Repository - Repository analysis stages
//!
//! Locates a repository from a URL, fetches its tree through the hosting API, finds the
//! Next.js application root and turns the files below it into a score.

pub mod api;
pub mod classifier;
pub mod features;
pub mod locator;
pub mod resolver;
pub mod scorer;

pub use api::{ApiClientConfig, GitHubApiClient};
pub use classifier::*;
pub use features::*;
pub use locator::*;
pub use resolver::*;
pub use scorer::*;
