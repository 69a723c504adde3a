//! Companion Service - counseling chat sessions and emotion diary keywords.

pub mod config;
pub mod dtos;
pub mod handlers;
pub mod models;
pub mod services;
pub mod startup;
pub mod workers;
