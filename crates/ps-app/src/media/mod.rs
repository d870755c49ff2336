//! Ephemeral media classification and promotion to durable storage.

mod file_name;
mod resolver;

pub use file_name::{extension_for, media_file_name};
pub use resolver::{MediaHandleResolver, PromotionFailure, PromotionReport};
