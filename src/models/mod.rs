mod event;
mod tool;
mod turn;

pub use event::ProtocolEvent;
pub use tool::ToolInvocation;
pub use turn::{ChatTurn, Role};
