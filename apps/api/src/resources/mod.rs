pub mod enrichment;
pub mod provider;
pub mod ranking;
pub mod serper;
pub mod youtube;
