// Application layer - Use cases and source boundaries
pub mod cache;
pub mod dashboard_service;
pub mod reading_repository;
