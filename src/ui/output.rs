use crate::models::{ChatTurn, Role, ToolInvocation};
use crate::session::{Notification, Status, StatusLevel};
use crate::ui::highlight::CodeBuffer;
use colored::*;
use std::io::{self, Write};

/// Turns session notifications into terminal output.
///
/// Content notifications carry the whole text so far; only the part not yet
/// shown is printed.
pub struct TerminalRenderer {
    code_buffer: CodeBuffer,
    shown_bytes: usize,
    shown_tools: usize,
    placeholder: bool,
    at_line_start: bool,
}

impl TerminalRenderer {
    pub fn new() -> Self {
        Self {
            code_buffer: CodeBuffer::new(),
            shown_bytes: 0,
            shown_tools: 0,
            placeholder: false,
            at_line_start: true,
        }
    }

    pub fn render(&mut self, notification: &Notification) -> String {
        let mut output = String::new();

        match notification {
            Notification::StatusChanged(Status::Thinking) => {
                self.reset();
                self.break_line(&mut output);
                output.push_str(&format_status(&Status::Thinking));
                self.placeholder = true;
                self.at_line_start = false;
            }
            // A reply with no text commits nothing; clear the placeholder here.
            Notification::StatusChanged(Status::Ready) => {
                if self.placeholder {
                    self.finish_text(&mut output);
                }
            }
            // An abort is already visible from its own notification.
            Notification::StatusChanged(Status::Aborted) => {}
            Notification::StatusChanged(status) => {
                self.clear_placeholder(&mut output);
                self.break_line(&mut output);
                self.emit(&mut output, &format!("{}\n", format_status(status)));
            }
            Notification::PlaceholderCleared => self.clear_placeholder(&mut output),
            Notification::ContentUpdated { text } => {
                self.clear_placeholder(&mut output);
                if let Some(delta) = text.get(self.shown_bytes..) {
                    let formatted = self.code_buffer.append(delta);
                    self.emit(&mut output, &formatted);
                }
                self.shown_bytes = text.len();
            }
            Notification::ToolsUpdated { tools } => {
                self.clear_placeholder(&mut output);
                for tool in tools.iter().skip(self.shown_tools) {
                    self.break_line(&mut output);
                    self.emit(&mut output, &format_tool(tool));
                }
                self.shown_tools = tools.len();
            }
            Notification::TurnCommitted(_) => {
                self.finish_text(&mut output);
            }
            Notification::Error { message } => {
                self.finish_text(&mut output);
                self.emit(&mut output, &format!("{} {}\n", "Error:".red(), message));
            }
            Notification::Aborted => {
                self.finish_text(&mut output);
                self.emit(&mut output, &format!("{}\n", "[aborted]".yellow()));
            }
        }

        output
    }

    fn reset(&mut self) {
        self.code_buffer = CodeBuffer::new();
        self.shown_bytes = 0;
        self.shown_tools = 0;
    }

    fn finish_text(&mut self, output: &mut String) {
        self.clear_placeholder(output);
        let remaining = self.code_buffer.flush();
        self.emit(output, &remaining);
        self.break_line(output);
    }

    fn emit(&mut self, output: &mut String, text: &str) {
        if !text.is_empty() {
            output.push_str(text);
            self.at_line_start = text.ends_with('\n');
        }
    }

    fn clear_placeholder(&mut self, output: &mut String) {
        if self.placeholder {
            output.push_str("\r\x1b[2K");
            self.placeholder = false;
            self.at_line_start = true;
        }
    }

    fn break_line(&mut self, output: &mut String) {
        if !self.at_line_start {
            output.push('\n');
            self.at_line_start = true;
        }
    }
}

impl Default for TerminalRenderer {
    fn default() -> Self {
        Self::new()
    }
}

pub fn format_status(status: &Status) -> String {
    let dot = match status.level() {
        StatusLevel::Success => "●".green(),
        StatusLevel::Warning => "●".yellow(),
        StatusLevel::Error => "●".red(),
    };
    format!("{} {}", dot, status.to_string().dimmed())
}

pub fn format_tool(tool: &ToolInvocation) -> String {
    let header = format!("┌─ TOOL: {} ", tool.name).cyan();
    let mut output = format!("{}{}\n", header, format!("({})", tool.call_id).dimmed());
    for line in tool.args_pretty().lines() {
        output.push_str(&format!("{} {}\n", "│".cyan(), line));
    }
    output.push_str(&format!("{}\n", "└─".cyan()));
    output
}

pub fn format_turn(turn: &ChatTurn) -> String {
    let role = match turn.role {
        Role::User => "you".green().bold(),
        Role::Assistant => "agent".cyan().bold(),
        Role::System => "system".dimmed(),
    };
    format!(
        "{} {} {}",
        turn.created_at.format("%H:%M:%S").to_string().dimmed(),
        role,
        turn.content
    )
}

/// Print and flush immediately so streamed text shows up as it arrives.
pub fn print_now(output: &str) -> io::Result<()> {
    if output.is_empty() {
        return Ok(());
    }
    let mut stdout = io::stdout().lock();
    stdout.write_all(output.as_bytes())?;
    stdout.flush()
}
