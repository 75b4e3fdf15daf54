//! Services for fetching, aggregating, rendering and sending reports

pub mod aggregator;
pub mod api_client;
pub mod date_normalizer;
pub mod dispatcher;
pub mod duration;
pub mod email_config;
pub mod renderer;
pub mod templating;

pub use aggregator::Aggregator;
pub use api_client::ZaptecClient;
pub use date_normalizer::normalize;
pub use dispatcher::Dispatcher;
pub use email_config::EmailConfig;
pub use renderer::ReportRenderer;
pub use templating::ReportTemplates;
