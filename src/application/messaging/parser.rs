//! Input parser - Turns a line typed into the chat prompt into structured input

/// One line of user input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Empty,
    Text(String),
    Command { name: String, args: Vec<String> },
}

impl Input {
    pub fn is_command(&self) -> bool {
        matches!(self, Input::Command { .. })
    }
}

/// Splits prefixed commands from chat text
pub struct InputParser {
    command_prefix: String,
}

impl InputParser {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            command_prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.command_prefix
    }

    /// Parse a raw line
    pub fn parse(&self, line: &str) -> Input {
        let line = line.trim();
        if line.is_empty() {
            return Input::Empty;
        }

        if !self.command_prefix.is_empty() {
            if let Some(cmd_text) = line.strip_prefix(self.command_prefix.as_str()) {
                return Self::parse_command(line, cmd_text);
            }
        }

        Input::Text(line.to_string())
    }

    fn parse_command(line: &str, cmd_text: &str) -> Input {
        let mut parts = cmd_text.split_whitespace();
        // A bare prefix is just text
        let Some(name) = parts.next() else {
            return Input::Text(line.to_string());
        };

        Input::Command {
            name: name.to_lowercase(),
            args: parts.map(|s| s.to_string()).collect(),
        }
    }
}

impl Default for InputParser {
    fn default() -> Self {
        Self::new("/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text() {
        let parser = InputParser::default();
        assert_eq!(parser.parse("  hello there "), Input::Text("hello there".to_string()));
        assert_eq!(parser.parse("   "), Input::Empty);
    }

    #[test]
    fn test_command_with_args() {
        let parser = InputParser::default();
        assert_eq!(
            parser.parse("/Help  send"),
            Input::Command {
                name: "help".to_string(),
                args: vec!["send".to_string()],
            }
        );
        assert!(parser.parse("/quit").is_command());
        assert_eq!(parser.parse("/"), Input::Text("/".to_string()));
    }

    #[test]
    fn test_custom_prefix() {
        let parser = InputParser::new("!");
        assert!(parser.parse("!whoami").is_command());
        assert_eq!(parser.parse("/whoami"), Input::Text("/whoami".to_string()));
    }
}
