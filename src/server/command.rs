/// One parsed command line.
///
/// Immutable once constructed; the session builds a fresh one for every
/// line it reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    /// Upper-cased, whitespace-trimmed verb. Empty for an empty line.
    pub verb: String,
    /// Trimmed remainder of the line after the verb; may be empty.
    pub arguments: String,
}

impl Command {
    /// Parse a command line as it came off the wire (delimiter already
    /// stripped).
    ///
    /// The line splits at the first run of whitespace: the first token is
    /// the verb, case-folded to uppercase; everything after it, trimmed, is
    /// the argument string. An empty line yields an empty verb; whether
    /// that is acceptable is the dispatch collaborator's concern.
    pub fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        let mut parts = trimmed.splitn(2, char::is_whitespace);
        let verb = parts.next().unwrap_or("").to_uppercase();
        let arguments = parts.next().unwrap_or("").trim().to_string();

        Self { verb, arguments }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_verb_and_argument() {
        let command = Command::parse("RETR 5");
        assert_eq!(command.verb, "RETR");
        assert_eq!(command.arguments, "5");
    }

    #[test]
    fn test_parse_case_folds_and_trims() {
        let command = Command::parse("  retr 5");
        assert_eq!(command.verb, "RETR");
        assert_eq!(command.arguments, "5");
    }

    #[test]
    fn test_parse_bare_verb() {
        let command = Command::parse("QUIT");
        assert_eq!(command.verb, "QUIT");
        assert_eq!(command.arguments, "");
    }

    #[test]
    fn test_parse_argument_whitespace_run() {
        let command = Command::parse("USER   bob  ");
        assert_eq!(command.verb, "USER");
        assert_eq!(command.arguments, "bob");
    }

    #[test]
    fn test_parse_multi_word_arguments() {
        let command = Command::parse("APOP mrose c4c9334bac560ecc979e58001b3e22fb");
        assert_eq!(command.verb, "APOP");
        assert_eq!(
            command.arguments,
            "mrose c4c9334bac560ecc979e58001b3e22fb"
        );
    }

    #[test]
    fn test_parse_empty_line() {
        let command = Command::parse("");
        assert_eq!(command.verb, "");
        assert_eq!(command.arguments, "");
    }

    #[test]
    fn test_parse_whitespace_only_line() {
        let command = Command::parse("   ");
        assert_eq!(command.verb, "");
        assert_eq!(command.arguments, "");
    }
}
