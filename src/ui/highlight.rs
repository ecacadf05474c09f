use colored::*;
use syntect::easy::HighlightLines;
use syntect::highlighting::ThemeSet;
use syntect::parsing::SyntaxSet;
use syntect::util::{as_24_bit_terminal_escaped, LinesWithEndings};

const THEME: &str = "Solarized (dark)";

struct CodeBlock {
    lang: Option<String>,
    body: String,
}

/// Streaming markdown-ish formatter for the terminal.
///
/// Prose passes through as soon as it arrives. Fenced code blocks are held
/// until the closing fence and then printed syntax-highlighted in a box.
pub struct CodeBuffer {
    line: String,
    // Bytes of `line` already written out as prose.
    emitted: usize,
    block: Option<CodeBlock>,
    syntax_set: SyntaxSet,
    theme_set: ThemeSet,
}

impl CodeBuffer {
    pub fn new() -> Self {
        Self {
            line: String::new(),
            emitted: 0,
            block: None,
            syntax_set: SyntaxSet::load_defaults_newlines(),
            theme_set: ThemeSet::load_defaults(),
        }
    }

    /// Feed more text, returning whatever can be displayed now.
    pub fn append(&mut self, content: &str) -> String {
        self.line.push_str(content);
        let mut output = String::new();

        while let Some(newline) = self.line.find('\n') {
            let line: String = self.line.drain(..=newline).collect();
            let emitted = std::mem::take(&mut self.emitted);
            self.complete_line(&line, emitted, &mut output);
        }

        // A fence only counts at the start of a line, so a partial line can be
        // shown early once it clearly is not one.
        if self.block.is_none() && self.could_be_prose() {
            output.push_str(&self.line[self.emitted..]);
            self.emitted = self.line.len();
        }

        output
    }

    /// Emit everything still buffered, closing an unterminated code block.
    pub fn flush(&mut self) -> String {
        let rest = std::mem::take(&mut self.line);
        let emitted = std::mem::take(&mut self.emitted);

        match self.block.take() {
            Some(mut block) => {
                block.body.push_str(&rest);
                self.render_block(&block)
            }
            None => rest[emitted..].to_string(),
        }
    }

    pub fn in_code_block(&self) -> bool {
        self.block.is_some()
    }

    fn could_be_prose(&self) -> bool {
        let start = self.line.trim_start();
        self.emitted > 0 || !(start.is_empty() || "```".starts_with(start) || start.starts_with("```"))
    }

    fn complete_line(&mut self, line: &str, emitted: usize, output: &mut String) {
        let fence = line.trim();

        if self.block.is_some() {
            if fence.starts_with("```") {
                if let Some(block) = self.block.take() {
                    output.push_str(&self.render_block(&block));
                }
            } else if let Some(block) = self.block.as_mut() {
                block.body.push_str(line);
            }
            return;
        }

        if emitted == 0 && fence.starts_with("```") {
            let lang = fence.trim_start_matches('`').trim();
            self.block = Some(CodeBlock {
                lang: (!lang.is_empty()).then(|| lang.to_string()),
                body: String::new(),
            });
        } else {
            output.push_str(&line[emitted..]);
        }
    }

    fn render_block(&self, block: &CodeBlock) -> String {
        let label = block.lang.as_deref().unwrap_or("code");
        let mut output = format!("{}\n", format!("┌─ {} ", label).dimmed());

        for line in self.highlight(&block.body, block.lang.as_deref()).lines() {
            output.push_str(&format!("{} {}\x1b[0m\n", "│".dimmed(), line));
        }

        output.push_str(&format!("{}\n", "└─".dimmed()));
        output
    }

    fn highlight(&self, code: &str, lang: Option<&str>) -> String {
        let Some(theme) = self.theme_set.themes.get(THEME) else {
            return code.to_string();
        };

        let syntax = lang
            .and_then(|lang| {
                self.syntax_set
                    .find_syntax_by_token(lang)
                    .or_else(|| self.syntax_set.find_syntax_by_extension(lang))
            })
            .unwrap_or_else(|| self.syntax_set.find_syntax_plain_text());

        let mut highlighter = HighlightLines::new(syntax, theme);
        let mut output = String::new();

        for line in LinesWithEndings::from(code) {
            match highlighter.highlight_line(line, &self.syntax_set) {
                Ok(ranges) => output.push_str(&as_24_bit_terminal_escaped(&ranges[..], false)),
                Err(_) => output.push_str(line),
            }
        }

        output
    }
}

impl Default for CodeBuffer {
    fn default() -> Self {
        Self::new()
    }
}
