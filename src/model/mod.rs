pub mod client_message;
pub mod countdown;
pub mod server_message;
pub mod session;
pub mod types;
