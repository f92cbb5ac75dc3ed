pub mod handlers;
pub mod server;

pub use handlers::{AppState, HealthResponse, RootResponse};
pub use server::ApiServer;
