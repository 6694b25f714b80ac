mod analyzer;
mod analyzer_error;
mod page;

pub use analyzer::{HttpSiteAnalyzer, SiteAnalyzer};
pub use analyzer_error::AnalyzerError;
