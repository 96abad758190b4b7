pub mod auth;
pub mod commands;
pub mod config;
pub mod controllers;
pub mod db;
pub mod error;
pub mod media;
pub mod middlewares;
pub mod model;
pub mod pagination;
pub mod routes;
pub mod shopping_list;
pub mod startup;
pub mod state;
pub mod telemetry;
