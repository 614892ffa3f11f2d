pub mod config;
pub mod error;
pub mod llm;
pub mod models;
pub mod router;
pub mod server;
pub mod telemetry;

/**
 * \brief Commonly used items, re-exported for the binaries.
 */
pub mod prelude {
    pub use crate::config::ProviderConfig;
    pub use crate::error::AnalyzeError;
    pub use crate::llm::{Provider, ProviderKind};
    pub use crate::models::{ImagePayload, Message, Part, Role};
    pub use crate::router::RequestRouter;
    pub use crate::server;
    pub use crate::telemetry;
}
