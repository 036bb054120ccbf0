pub mod http;
pub mod participant;
