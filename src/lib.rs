//! Jeevika - classifieds and real-estate marketplace backend
//!
//! This library provides listings across every marketplace category, keyword
//! search, categories, sliders, blog content, accounts and wishlists, served
//! as a JSON API.

pub mod api;
pub mod cache;
pub mod config;
pub mod db;
pub mod models;
pub mod services;
