//! tagrelease - chat bot that cuts the next release tag for services on GitLab

pub mod bot;
pub mod chat;
pub mod commands;
pub mod config;
pub mod domain;
pub mod error;
pub mod hosting;
pub mod routing;
pub mod telemetry;
