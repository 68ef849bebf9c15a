//! Shared utilities and common types for the back-office service.
//!
//! This crate provides functionality used across all other crates:
//! - Token fingerprinting (SHA-256)
//! - Admin access tokens (JWT)
//! - Password hashing with Argon2id
//! - Offset pagination arithmetic
//! - Reusable validation rules

pub mod crypto;
pub mod jwt;
pub mod pagination;
pub mod password;
pub mod validation;
