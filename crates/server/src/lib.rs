pub mod broker;
pub mod config;
pub mod consumer;
pub mod metrics;
pub mod rest;
pub mod storage;
