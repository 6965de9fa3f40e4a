//! Data connectors: the Exa Websets provider API and knowledge-base
//! collectors feeding signal detection.

pub mod collector;
pub mod manager;
pub mod types;
pub mod websets;

pub use collector::{DataSourceCollector, JsonFileCollector};
pub use manager::{CollectionReport, CollectorManager};
pub use types::*;
pub use websets::{ExaWebsetsClient, ProviderApi};
