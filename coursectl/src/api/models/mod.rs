//! API request/response models.

pub mod groups;
