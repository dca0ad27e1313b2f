pub mod config;
pub mod error;
pub mod helpers;
pub mod hooks;
pub mod http;
pub mod integrations;
pub mod query;

pub use config::ClientConfig;
pub use error::{ClientError, ErrorKind, Result};
pub use hooks::CrmHooks;
pub use http::ApiClient;
pub use query::{QueryClient, QueryKey, QueryOptions};
