pub mod enrichment;
pub mod export;
pub mod intake;
