pub mod config;
pub mod error;
pub mod form;
pub mod gateway;
pub mod hris;
pub mod model;
pub mod payment;
