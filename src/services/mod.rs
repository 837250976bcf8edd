pub mod object_store;
pub mod photo_repository;
pub mod photo_service;
