//! Splits one inbound control line into a `(verb, argument)` pair and
//! classifies the verb.
//!
//! Verb matching is exact-byte, case sensitive as received — including
//! the original's lowercase `opts` and `noop` entries, which real clients
//! sending `OPTS`/`NOOP` in uppercase will miss and fall through to
//! `Verb::Unknown` (see SPEC_FULL.md §9, Open Question 2).

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verb {
    User,
    Pass,
    Opts,
    Pwd,
    Type,
    Cwd,
    Pasv,
    List,
    Syst,
    Feat,
    Help,
    Noop,
    Dele,
    Cdup,
    Retr,
    Size,
    Mkd,
    Rnfr,
    Rnto,
    Rmd,
    Stor,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub verb: Verb,
    pub argument: String,
}

/// Parses a single command line already stripped of its CRLF/LF
/// terminator by the transport layer. Splits on the first space; if none
/// is present, the whole line is the verb and the argument is empty.
pub fn parse_command(line: &[u8]) -> Command {
    let space_pos = line.iter().position(|&b| b == b' ');
    let (verb_bytes, argument_bytes) = match space_pos {
        Some(pos) => (&line[..pos], &line[pos + 1..]),
        None => (line, &line[..0]),
    };

    let verb_str = String::from_utf8_lossy(verb_bytes);
    let verb = classify(&verb_str);
    let argument = String::from_utf8_lossy(argument_bytes).into_owned();

    Command { verb, argument }
}

fn classify(verb: &str) -> Verb {
    match verb {
        "USER" => Verb::User,
        "PASS" => Verb::Pass,
        "opts" => Verb::Opts,
        "PWD" => Verb::Pwd,
        "TYPE" => Verb::Type,
        "CWD" => Verb::Cwd,
        "PASV" => Verb::Pasv,
        "LIST" => Verb::List,
        "SYST" => Verb::Syst,
        "FEAT" => Verb::Feat,
        "HELP" => Verb::Help,
        "noop" => Verb::Noop,
        "DELE" => Verb::Dele,
        "CDUP" => Verb::Cdup,
        "RETR" => Verb::Retr,
        "SIZE" => Verb::Size,
        "MKD" => Verb::Mkd,
        "RNFR" => Verb::Rnfr,
        "RNTO" => Verb::Rnto,
        "RMD" => Verb::Rmd,
        "STOR" => Verb::Stor,
        _ => Verb::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_verb_and_argument_on_first_space() {
        let cmd = parse_command(b"USER anonymous");
        assert_eq!(cmd.verb, Verb::User);
        assert_eq!(cmd.argument, "anonymous");
    }

    #[test]
    fn no_space_means_empty_argument() {
        let cmd = parse_command(b"PWD");
        assert_eq!(cmd.verb, Verb::Pwd);
        assert_eq!(cmd.argument, "");
    }

    #[test]
    fn unmatched_verb_is_unknown() {
        let cmd = parse_command(b"QUIT");
        assert_eq!(cmd.verb, Verb::Unknown);
    }

    #[test]
    fn opts_is_case_sensitive_lowercase() {
        assert_eq!(parse_command(b"opts utf8 on").verb, Verb::Opts);
        assert_eq!(parse_command(b"OPTS utf8 on").verb, Verb::Unknown);
    }

    #[test]
    fn noop_is_case_sensitive_lowercase() {
        assert_eq!(parse_command(b"noop").verb, Verb::Noop);
        assert_eq!(parse_command(b"NOOP").verb, Verb::Unknown);
    }

    #[test]
    fn argument_with_embedded_spaces_is_kept_whole() {
        let cmd = parse_command(b"MKD my folder");
        assert_eq!(cmd.argument, "my folder");
    }
}
