pub mod config;
pub mod provider;
pub mod relay;
pub mod shuffle;
pub mod sync;
pub mod tumblr;
pub mod web;
