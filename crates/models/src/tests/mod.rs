/// CRUD and validation tests for all entities
pub mod crud_tests;
