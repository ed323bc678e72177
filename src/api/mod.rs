//! HTTP API: base info, land search, land analysis and the operational
//! endpoints.

pub mod analysis;
pub mod docs;
pub mod handlers;
pub mod response;
pub mod routes;
pub mod search;

pub use handlers::AppState;
pub use response::BaseApiResponse;
pub use routes::create_router;
