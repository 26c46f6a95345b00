pub mod server;

pub use server::bind_feed;
