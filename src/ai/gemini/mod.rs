pub mod cartoon;
pub mod client;
pub mod types;

pub use cartoon::GeminiCartoonClient;
pub use client::GeminiHttpClient;
