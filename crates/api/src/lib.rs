//! `cantina-api` — HTTP surface for the order service.

pub mod app;
