//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → logging.rs (request log, stats completion)
//!     → request.rs (request ID, InboundRequest extraction)
//!     → [routing decides the service]
//!     → [dispatcher performs the bus request]
//!     → response.rs (bus reply or failure → HTTP)
//!     → Send to client
//! ```

pub mod logging;
pub mod request;
pub mod response;
pub mod server;

pub use request::{MakeHexRequestId, RawAuth, X_REQUEST_ID};
pub use response::MatchedRoute;
pub use server::{AppState, HttpServer};
