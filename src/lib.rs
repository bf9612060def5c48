//! Bearer-token authentication for a two-service deployment: an auth service that
//! owns user records and signs tokens, and a gateway that gates public routes on
//! those tokens.

pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod gateway;
pub mod rpc;
pub mod telemetry;
pub mod users;
