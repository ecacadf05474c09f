use crate::history::{DEFAULT_CONTEXT_WINDOW, DEFAULT_HISTORY_CAPACITY};

pub fn default_base_url() -> String {
    "http://127.0.0.1:41465".to_string()
}

pub fn default_stream_timeout() -> u64 {
    60 // seconds without any event, pings included
}

pub fn default_history_capacity() -> usize {
    DEFAULT_HISTORY_CAPACITY
}

pub fn default_context_window() -> usize {
    DEFAULT_CONTEXT_WINDOW
}
