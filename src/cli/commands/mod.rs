pub mod instances;
pub mod query;
pub mod serve;
