//! Data access over the row store collaborator

pub mod repository;
