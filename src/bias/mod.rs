// src/bias/mod.rs
pub mod anonymize;
pub mod diversity;
pub mod selection_events;
