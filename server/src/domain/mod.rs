//! Domain logic

pub mod short_id;
