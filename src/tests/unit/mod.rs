//! Unit tests across module boundaries

mod augmentation_tests;
mod orchestrator_tests;
mod providers;
