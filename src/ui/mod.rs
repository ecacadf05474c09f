pub mod highlight;
pub mod output;

pub use highlight::CodeBuffer;
pub use output::{format_status, format_tool, format_turn, print_now, TerminalRenderer};
