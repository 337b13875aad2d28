//! Flag specs in `-p, --port <port>` notation, translated to clap args

use clap::parser::ValueSource;
use clap::{Arg, ArgAction, ArgMatches};
use inventor_plugin_api::{ActionOption, OptionValue};
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum FlagError {
    #[error("empty flag spec")]
    Empty,

    #[error("unexpected token '{0}'")]
    UnexpectedToken(String),

    #[error("flag spec names neither a short nor a long flag")]
    NoName,

    #[error("'{0}' is reserved")]
    Reserved(String),

    #[error("option '{0}' is declared more than once")]
    Duplicate(String),
}

/// What follows the flag name
#[derive(Debug, Clone, PartialEq)]
pub enum ValueKind {
    /// Boolean switch
    Switch,
    /// `<name>`: a value must follow
    Required(String),
    /// `[name]`: a value may follow; bare flag means `true`
    Optional(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FlagSpec {
    pub short: Option<char>,
    pub long: Option<String>,
    pub value: ValueKind,
}

impl FlagSpec {
    pub fn parse(spec: &str) -> Result<Self, FlagError> {
        let tokens: Vec<&str> = spec
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|t| !t.is_empty())
            .collect();
        if tokens.is_empty() {
            return Err(FlagError::Empty);
        }

        let mut flag = FlagSpec {
            short: None,
            long: None,
            value: ValueKind::Switch,
        };
        for token in tokens {
            if let Some(long) = token.strip_prefix("--") {
                if long.is_empty() || flag.long.is_some() {
                    return Err(FlagError::UnexpectedToken(token.to_string()));
                }
                flag.long = Some(long.to_string());
            } else if let Some(short) = token.strip_prefix('-') {
                let mut chars = short.chars();
                match (chars.next(), chars.next(), flag.short) {
                    (Some(c), None, None) if c.is_ascii_alphanumeric() => flag.short = Some(c),
                    _ => return Err(FlagError::UnexpectedToken(token.to_string())),
                }
            } else if let Some(name) = placeholder(token, '<', '>') {
                flag.value = ValueKind::Required(name.to_string());
            } else if let Some(name) = placeholder(token, '[', ']') {
                flag.value = ValueKind::Optional(name.to_string());
            } else {
                return Err(FlagError::UnexpectedToken(token.to_string()));
            }
        }

        if flag.short.is_none() && flag.long.is_none() {
            return Err(FlagError::NoName);
        }
        // clap owns -h/--help and the `help` arg id on every command
        if flag.short == Some('h') || flag.long.as_deref() == Some("help") || flag.key() == "help"
        {
            return Err(FlagError::Reserved(spec.to_string()));
        }
        Ok(flag)
    }

    /// `--no-<name>` switch, which defaults to on
    pub fn is_negated(&self) -> bool {
        self.value == ValueKind::Switch
            && self
                .long
                .as_deref()
                .is_some_and(|l| l.starts_with("no-") && l.len() > 3)
    }

    /// Key the parsed value is stored under: the long name (without `no-`
    /// for negated switches), else the short letter
    pub fn key(&self) -> String {
        match (&self.long, self.short) {
            (Some(long), _) if self.is_negated() => long["no-".len()..].to_string(),
            (Some(long), _) => long.clone(),
            (None, Some(short)) => short.to_string(),
            (None, None) => String::new(),
        }
    }

    pub fn to_arg(&self, option: &ActionOption) -> Arg {
        let mut arg = Arg::new(self.key()).help(option.description.clone());
        if let Some(short) = self.short {
            arg = arg.short(short);
        }
        if let Some(long) = &self.long {
            arg = arg.long(long.clone());
        }
        match &self.value {
            ValueKind::Switch if self.is_negated() => arg.action(ArgAction::SetFalse),
            ValueKind::Switch => arg.action(ArgAction::SetTrue),
            ValueKind::Required(name) => arg.value_name(name.clone()).action(ArgAction::Set),
            ValueKind::Optional(name) => arg
                .value_name(name.clone())
                .num_args(0..=1)
                .action(ArgAction::Set),
        }
    }

    /// Value for this option after parsing.
    ///
    /// Flags given on the command line win; otherwise the declared default
    /// applies, and negated switches default to `true`.
    pub fn value_from(&self, matches: &ArgMatches, option: &ActionOption) -> Option<OptionValue> {
        let key = self.key();
        let given = matches.value_source(&key) == Some(ValueSource::CommandLine);
        if !given {
            return option
                .default
                .clone()
                .or_else(|| self.is_negated().then_some(OptionValue::Bool(true)));
        }
        match self.value {
            ValueKind::Switch => Some(OptionValue::Bool(!self.is_negated())),
            ValueKind::Required(_) | ValueKind::Optional(_) => Some(
                matches
                    .get_one::<String>(&key)
                    .map(|v| OptionValue::String(v.clone()))
                    .unwrap_or(OptionValue::Bool(true)),
            ),
        }
    }
}

fn placeholder(token: &str, open: char, close: char) -> Option<&str> {
    token
        .strip_prefix(open)?
        .strip_suffix(close)
        .filter(|name| !name.is_empty())
}

/// An option that can be bound to a command
#[derive(Debug)]
pub struct BoundOption<'a> {
    pub spec: FlagSpec,
    pub option: &'a ActionOption,
}

/// Split declared options into those that can be bound and those that
/// cannot, in declaration order.
pub fn plan_options(
    options: &[ActionOption],
) -> (Vec<BoundOption<'_>>, Vec<(&ActionOption, FlagError)>) {
    let mut bound: Vec<BoundOption<'_>> = Vec::new();
    let mut rejected = Vec::new();

    for option in options {
        let spec = match FlagSpec::parse(&option.flag) {
            Ok(spec) => spec,
            Err(e) => {
                rejected.push((option, e));
                continue;
            }
        };
        let clashes = bound.iter().any(|b| {
            b.spec.key() == spec.key()
                || (spec.short.is_some() && b.spec.short == spec.short)
                || (spec.long.is_some() && b.spec.long == spec.long)
        });
        if clashes {
            rejected.push((option, FlagError::Duplicate(option.flag.clone())));
            continue;
        }
        bound.push(BoundOption { spec, option });
    }
    (bound, rejected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Command;

    fn parse(spec: &str) -> FlagSpec {
        FlagSpec::parse(spec).unwrap()
    }

    fn matches_for(options: &[ActionOption], argv: &[&str]) -> ArgMatches {
        let (bound, _) = plan_options(options);
        let cmd = bound
            .iter()
            .fold(Command::new("dev"), |cmd, b| cmd.arg(b.spec.to_arg(b.option)));
        cmd.try_get_matches_from(argv).unwrap()
    }

    #[test]
    fn test_parse_short_and_long_with_value() {
        let flag = parse("-p, --port <port>");
        assert_eq!(flag.short, Some('p'));
        assert_eq!(flag.long.as_deref(), Some("port"));
        assert_eq!(flag.value, ValueKind::Required("port".into()));
        assert_eq!(flag.key(), "port");
    }

    #[test]
    fn test_parse_optional_value() {
        let flag = parse("--open [browser]");
        assert_eq!(flag.value, ValueKind::Optional("browser".into()));
        assert_eq!(flag.short, None);
    }

    #[test]
    fn test_parse_space_separated_short_long() {
        let flag = parse("-V --verbose");
        assert_eq!(flag.short, Some('V'));
        assert_eq!(flag.long.as_deref(), Some("verbose"));
        assert_eq!(flag.value, ValueKind::Switch);
    }

    #[test]
    fn test_short_only_key_is_letter() {
        assert_eq!(parse("-f").key(), "f");
    }

    #[test]
    fn test_negated_switch() {
        let flag = parse("--no-git");
        assert!(flag.is_negated());
        assert_eq!(flag.key(), "git");
        assert!(!parse("--no-").is_negated());
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(FlagSpec::parse("  "), Err(FlagError::Empty));
        assert_eq!(FlagSpec::parse("<port>"), Err(FlagError::NoName));
        assert!(matches!(
            FlagSpec::parse("port"),
            Err(FlagError::UnexpectedToken(_))
        ));
        assert!(matches!(
            FlagSpec::parse("-pq"),
            Err(FlagError::UnexpectedToken(_))
        ));
        assert!(matches!(
            FlagSpec::parse("-h, --host <host>"),
            Err(FlagError::Reserved(_))
        ));
    }

    #[test]
    fn test_negated_help_is_reserved() {
        assert!(matches!(
            FlagSpec::parse("--no-help"),
            Err(FlagError::Reserved(_))
        ));

        let options = vec![
            ActionOption::new("--no-help", "Shadows help"),
            ActionOption::new("--watch", "Watch"),
        ];
        let (bound, rejected) = plan_options(&options);
        assert_eq!(bound.len(), 1);
        assert_eq!(rejected.len(), 1);

        // the remaining options still bind next to clap's own --help
        let matches = matches_for(&options, &["dev", "--watch"]);
        assert_eq!(
            bound[0].spec.value_from(&matches, bound[0].option),
            Some(OptionValue::Bool(true))
        );
    }

    #[test]
    fn test_plan_rejects_duplicates_and_bad_specs() {
        let options = vec![
            ActionOption::new("-p, --port <port>", "Port"),
            ActionOption::new("--port <n>", "Port again"),
            ActionOption::new("-p", "Short clash"),
            ActionOption::new("what", "Nonsense"),
            ActionOption::new("--open [browser]", "Open"),
        ];
        let (bound, rejected) = plan_options(&options);
        let keys: Vec<_> = bound.iter().map(|b| b.spec.key()).collect();
        assert_eq!(keys, vec!["port", "open"]);
        assert_eq!(rejected.len(), 3);
    }

    #[test]
    fn test_values_from_command_line() {
        let options = vec![
            ActionOption::new("-p, --port <port>", "Port"),
            ActionOption::new("--open [browser]", "Open"),
            ActionOption::new("--watch", "Watch"),
        ];
        let matches = matches_for(&options, &["dev", "-p", "8080", "--open", "--watch"]);
        let (bound, _) = plan_options(&options);

        let values: Vec<_> = bound
            .iter()
            .map(|b| b.spec.value_from(&matches, b.option))
            .collect();
        assert_eq!(values[0], Some(OptionValue::String("8080".into())));
        assert_eq!(values[1], Some(OptionValue::Bool(true)));
        assert_eq!(values[2], Some(OptionValue::Bool(true)));
    }

    #[test]
    fn test_defaults_when_absent() {
        let options = vec![
            ActionOption::new("-p, --port <port>", "Port").with_default("3000"),
            ActionOption::new("--watch", "Watch"),
            ActionOption::new("--no-git", "Skip git"),
        ];
        let matches = matches_for(&options, &["dev"]);
        let (bound, _) = plan_options(&options);

        assert_eq!(
            bound[0].spec.value_from(&matches, bound[0].option),
            Some(OptionValue::String("3000".into()))
        );
        assert_eq!(bound[1].spec.value_from(&matches, bound[1].option), None);
        assert_eq!(
            bound[2].spec.value_from(&matches, bound[2].option),
            Some(OptionValue::Bool(true))
        );
    }

    #[test]
    fn test_negated_switch_given() {
        let options = vec![ActionOption::new("--no-git", "Skip git")];
        let matches = matches_for(&options, &["dev", "--no-git"]);
        let (bound, _) = plan_options(&options);
        assert_eq!(
            bound[0].spec.value_from(&matches, bound[0].option),
            Some(OptionValue::Bool(false))
        );
    }
}
