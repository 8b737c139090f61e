pub mod aggregator;
pub mod fetcher;
pub mod scorer;

#[cfg(test)]
pub(crate) mod testing;
