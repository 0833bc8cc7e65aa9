//! HTTP API: router, bearer-token authentication, JSON mapping and the
//! realtime notification stream.

pub mod app;
pub mod context;
pub mod middleware;
