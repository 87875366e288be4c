pub mod error;
pub mod fetch;
pub mod output;
pub mod parser;
pub mod pipeline;
pub mod publish;
pub mod scrape;
pub mod series;
pub mod stats;
