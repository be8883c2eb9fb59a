//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Validate caller input before it reaches the repositories.

pub mod auth_service;
pub mod catalog_service;
pub mod task_service;
