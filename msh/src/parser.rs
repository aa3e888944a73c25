use anyhow::{Result, bail};

/// A tokenized command line: commands chained by pipes, redirection
/// targets for the pipeline's ends, and the background flag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedLine {
    pub commands: Vec<Vec<String>>,
    pub redirect_in: Option<String>,
    pub redirect_out: Option<String>,
    pub redirect_err: Option<String>,
    pub background: bool,
}

/// Whitespace tokenizer for `cmd args.. [| cmd args..] [< f] [> f] [2> f] [&]`.
/// Returns `Ok(None)` for a blank line. Quoting and expansion are out of
/// scope; the execution core consumes the structured result as-is.
pub fn tokenize(input: &str) -> Result<Option<ParsedLine>> {
    let mut tokens = input.split_whitespace().peekable();
    if tokens.peek().is_none() {
        return Ok(None);
    }

    let mut line = ParsedLine::default();
    let mut current: Vec<String> = Vec::new();

    while let Some(token) = tokens.next() {
        match token {
            "|" => {
                if current.is_empty() {
                    bail!("syntax error near `|`");
                }
                line.commands.push(std::mem::take(&mut current));
            }
            "<" | ">" | "2>" => {
                let target = match tokens.next() {
                    Some(t) if !matches!(t, "|" | "<" | ">" | "2>" | "&") => t,
                    _ => bail!("syntax error: missing file name after `{token}`"),
                };
                let slot = match token {
                    "<" => &mut line.redirect_in,
                    ">" => &mut line.redirect_out,
                    _ => &mut line.redirect_err,
                };
                *slot = Some(target.to_string());
            }
            "&" => {
                if tokens.peek().is_some() {
                    bail!("syntax error: `&` must end the line");
                }
                line.background = true;
            }
            word => current.push(word.to_string()),
        }
    }

    if current.is_empty() {
        bail!("syntax error: missing command");
    }
    line.commands.push(current);
    Ok(Some(line))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn blank_lines_parse_to_nothing() {
        assert_eq!(tokenize("").unwrap(), None);
        assert_eq!(tokenize("   \t ").unwrap(), None);
    }

    #[test]
    fn single_command_with_arguments() {
        let line = tokenize("ls -la /tmp").unwrap().unwrap();
        assert_eq!(line.commands, vec![argv(&["ls", "-la", "/tmp"])]);
        assert!(!line.background);
        assert!(line.redirect_in.is_none());
    }

    #[test]
    fn three_stage_pipeline() {
        let line = tokenize("cat f | sort | wc -l").unwrap().unwrap();
        assert_eq!(
            line.commands,
            vec![argv(&["cat", "f"]), argv(&["sort"]), argv(&["wc", "-l"])]
        );
    }

    #[test]
    fn redirections_attach_to_the_line() {
        let line = tokenize("sort < in.txt > out.txt 2> err.txt").unwrap().unwrap();
        assert_eq!(line.commands, vec![argv(&["sort"])]);
        assert_eq!(line.redirect_in.as_deref(), Some("in.txt"));
        assert_eq!(line.redirect_out.as_deref(), Some("out.txt"));
        assert_eq!(line.redirect_err.as_deref(), Some("err.txt"));
    }

    #[test]
    fn trailing_ampersand_sets_background() {
        let line = tokenize("sleep 10 &").unwrap().unwrap();
        assert!(line.background);
        assert_eq!(line.commands, vec![argv(&["sleep", "10"])]);
    }

    #[test]
    fn pipeline_with_redirection_and_background() {
        let line = tokenize("grep foo < in | wc -l > out &").unwrap().unwrap();
        assert_eq!(line.commands.len(), 2);
        assert_eq!(line.redirect_in.as_deref(), Some("in"));
        assert_eq!(line.redirect_out.as_deref(), Some("out"));
        assert!(line.background);
    }

    #[test]
    fn syntax_errors() {
        assert!(tokenize("| wc").is_err());
        assert!(tokenize("ls |").is_err());
        assert!(tokenize("ls >").is_err());
        assert!(tokenize("ls > | wc").is_err());
        assert!(tokenize("sleep 1 & echo hi").is_err());
        assert!(tokenize("< in").is_err());
        assert!(tokenize("&").is_err());
    }
}
