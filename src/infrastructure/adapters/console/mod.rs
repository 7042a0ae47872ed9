//! Console adapter - terminal rendering of the login and chat views

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use crate::application::rendering::{RenderedMessage, Side};
use crate::domain::traits::ChatView;

const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";
const DEFAULT_WIDTH: usize = 72;

/// Terminal implementation of `ChatView`
pub struct ConsoleView {
    width: usize,
    redraw: bool,
    in_chat: AtomicBool,
    out: Mutex<Box<dyn Write + Send>>,
}

impl ConsoleView {
    pub fn new() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            redraw: true,
            in_chat: AtomicBool::new(false),
            out: Mutex::new(Box::new(std::io::stdout())),
        }
    }

    /// Send output somewhere other than stdout
    pub fn with_writer(mut self, out: impl Write + Send + 'static) -> Self {
        self.out = Mutex::new(Box::new(out));
        self
    }

    pub fn with_width(mut self, width: usize) -> Self {
        self.width = width;
        self
    }

    /// Clear the screen on every snapshot (default) or append a separator instead
    pub fn with_redraw(mut self, redraw: bool) -> Self {
        self.redraw = redraw;
        self
    }

    /// One feed line: own messages are right-aligned
    pub fn format_row(&self, row: &RenderedMessage) -> String {
        let username = sanitize(&row.username);
        let text = sanitize(&row.text);
        let line = if row.time.is_empty() {
            format!("{}: {}", username, text)
        } else {
            format!("[{}] {}: {}", row.time, username, text)
        };

        match row.side {
            Side::Own => format!("{:>width$}", line, width = self.width),
            Side::Other => line,
        }
    }

    /// Print a line of command output followed by the prompt
    pub fn notice(&self, text: &str) {
        let lines: Vec<String> = text.lines().map(sanitize).collect();
        self.write(&format!("{}\n{}", lines.join("\n"), self.prompt()));
    }

    fn write(&self, text: &str) {
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        let _ = out.write_all(text.as_bytes());
        let _ = out.flush();
    }

    fn begin_frame(&self) -> String {
        if self.redraw {
            CLEAR_SCREEN.to_string()
        } else {
            format!("{}\n", "-".repeat(self.width))
        }
    }

    fn prompt(&self) -> &'static str {
        if self.in_chat.load(Ordering::SeqCst) {
            "> "
        } else {
            ""
        }
    }
}

impl Default for ConsoleView {
    fn default() -> Self {
        Self::new()
    }
}

/// Drop control characters so peer text cannot drive the terminal
pub fn sanitize(s: &str) -> String {
    s.chars().filter(|c| !c.is_control()).collect()
}

impl ChatView for ConsoleView {
    fn show_accounts(&self, accounts: &[&str], selected: Option<&str>) {
        let mut text = String::from("Select an account:\n");
        for (i, name) in accounts.iter().enumerate() {
            let marker = if Some(*name) == selected { "*" } else { " " };
            text.push_str(&format!(" {} {}) {}\n", marker, i + 1, name));
        }
        self.write(&text);
    }

    fn show_login_error(&self, message: &str) {
        self.write(&format!("! {}\n", message));
    }

    // Errors scroll away in a terminal; nothing to hide.
    fn clear_login_error(&self) {}

    // The password line was consumed by the reader.
    fn clear_password(&self) {}

    fn show_chat(&self, username: &str) {
        self.in_chat.store(true, Ordering::SeqCst);
        self.write(&format!(
            "{}Signed in as {}. Type /help for commands.\n",
            self.begin_frame(),
            sanitize(username)
        ));
    }

    fn render_feed(&self, messages: &[RenderedMessage]) {
        let mut frame = self.begin_frame();
        if messages.is_empty() {
            frame.push_str("(no messages yet)\n");
        }
        for row in messages {
            frame.push_str(&self.format_row(row));
            frame.push('\n');
        }
        frame.push_str(self.prompt());
        self.write(&frame);
    }

    fn show_feed_error(&self, notice: &str) {
        self.write(&format!("{}{}\n{}", self.begin_frame(), notice, self.prompt()));
    }

    fn scroll_to_bottom(&self) {
        let _ = self.out.lock().unwrap_or_else(PoisonError::into_inner).flush();
    }

    // The input line was consumed by the reader.
    fn clear_input(&self) {}
}

/// Line reader over stdin
pub struct ConsoleInput {
    lines: Lines<BufReader<Stdin>>,
}

impl ConsoleInput {
    pub fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }

    /// Print `prompt` and read one line. `None` on EOF or a read error.
    pub async fn read_line(&mut self, prompt: &str) -> Option<String> {
        print!("{}", prompt);
        let _ = std::io::stdout().flush();
        match self.lines.next_line().await {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!("Failed to read input: {}", e);
                None
            }
        }
    }
}

impl Default for ConsoleInput {
    fn default() -> Self {
        Self::new()
    }
}
