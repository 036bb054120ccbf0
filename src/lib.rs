pub mod config;
pub mod error;
pub mod handler;
pub mod heartbeat;
pub mod leaderboard;
pub mod model;
pub mod persistence;
pub mod question_bank;
pub mod quiz_timer;
pub mod scoring;
pub mod server;
