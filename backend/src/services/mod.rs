pub mod aggregator;
pub mod cache;
pub mod credentials;
pub mod paginator;
pub mod rotation;
pub mod youtube_service;

#[cfg(test)]
pub(crate) mod testing;
