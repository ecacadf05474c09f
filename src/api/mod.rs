pub mod client;
pub mod models;
pub mod streaming;

pub use client::{ByteStream, ChatTransport, HttpTransport};
pub use models::{ChatRequest, ContextMessage, HealthReport, HealthStatus};
pub use streaming::{decode_events, with_chunk_timeout, FrameDecoder};
