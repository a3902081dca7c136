pub mod catalog;
pub mod config;
pub mod filter;
pub mod genres;
pub mod intent;
pub mod onboarding;
pub mod profile;
pub mod recommend;
pub mod steps;
pub mod watched;
