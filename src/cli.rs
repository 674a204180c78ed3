use clap::{Args, Parser, Subcommand};
use std::net::SocketAddr;
use std::time::Duration;
use stockhub_push::config::{AppConfig, DEFAULT_BROADCAST_CONCURRENCY, DEFAULT_DELIVERY_TIMEOUT};

pub(crate) enum RunOutcome {
    Serve(AppConfig),
    Exit(i32),
}

pub(crate) fn run() -> RunOutcome {
    let cli = Cli::parse();
    if let Some(Command::Init(args)) = cli.command {
        let code = run_init(args);
        return RunOutcome::Exit(code);
    }

    match resolve_config(cli) {
        Ok(config) => RunOutcome::Serve(config),
        Err(err) => {
            eprintln!("error: {err}");
            RunOutcome::Exit(2)
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "stockhub-push",
    version,
    about = "Web Push relay for StockHub notifications"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
    #[arg(long, env = "STOCKHUB_BIND", default_value = "127.0.0.1:3000")]
    bind: SocketAddr,
    #[arg(long, env = "STOCKHUB_VAPID_PRIVATE_KEY")]
    vapid_private_key: Option<String>,
    #[arg(long, env = "STOCKHUB_VAPID_PUBLIC_KEY")]
    vapid_public_key: Option<String>,
    #[arg(long, env = "STOCKHUB_VAPID_SUBJECT")]
    vapid_subject: Option<String>,
    #[arg(long, env = "STOCKHUB_DELIVERY_TIMEOUT")]
    delivery_timeout: Option<String>,
    #[arg(long, env = "STOCKHUB_BROADCAST_CONCURRENCY")]
    broadcast_concurrency: Option<usize>,
    #[arg(long = "cors-origin", env = "STOCKHUB_CORS_ORIGIN", value_delimiter = ',')]
    cors_origins: Vec<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a VAPID key pair and print it as environment variables.
    Init(InitArgs),
}

#[derive(Args, Debug)]
struct InitArgs {
    #[arg(long)]
    subject: Option<String>,
}

fn run_init(args: InitArgs) -> i32 {
    let credentials = match stockhub_push::generate_vapid_credentials() {
        Ok(credentials) => credentials,
        Err(err) => {
            eprintln!("failed to generate VAPID credentials: {err}");
            return 1;
        }
    };
    let (subject, show_subject_note) = match args.subject {
        Some(subject) => (subject, false),
        None => ("mailto:alerts@example.com".to_string(), true),
    };

    println!("VAPID credentials generated.");
    println!();
    println!("STOCKHUB_VAPID_PRIVATE_KEY=\"{}\"", credentials.private_key);
    println!("STOCKHUB_VAPID_PUBLIC_KEY=\"{}\"", credentials.public_key);
    println!("STOCKHUB_VAPID_SUBJECT=\"{subject}\"");
    if show_subject_note {
        println!();
        println!("Note: replace STOCKHUB_VAPID_SUBJECT with a contact URI you control.");
    }
    0
}

fn resolve_config(cli: Cli) -> Result<AppConfig, String> {
    let delivery_timeout = match cli.delivery_timeout.as_deref() {
        Some(raw) => parse_duration(raw)?,
        None => DEFAULT_DELIVERY_TIMEOUT,
    };
    let broadcast_concurrency = match cli.broadcast_concurrency {
        Some(0) => return Err("broadcast concurrency must be greater than 0".to_string()),
        Some(value) => value,
        None => DEFAULT_BROADCAST_CONCURRENCY,
    };
    let cors_origins = cli
        .cors_origins
        .iter()
        .map(|origin| origin.trim())
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect();

    Ok(AppConfig {
        bind: cli.bind,
        vapid_private_key: cli.vapid_private_key,
        vapid_public_key: cli.vapid_public_key,
        vapid_subject: cli.vapid_subject,
        delivery_timeout,
        broadcast_concurrency,
        cors_origins,
    })
}

fn parse_duration(raw: &str) -> Result<Duration, String> {
    let value = raw.trim();
    if value.is_empty() {
        return Err("delivery timeout cannot be empty".to_string());
    }

    let (amount, unit) = match value.chars().last() {
        Some(ch) if ch.is_ascii_alphabetic() => {
            (&value[..value.len() - 1], ch.to_ascii_lowercase())
        }
        _ => (value, 's'),
    };

    let amount: u64 = amount
        .parse()
        .map_err(|_| format!("invalid delivery timeout '{value}'; expected <number>[s|m|h]"))?;

    if amount == 0 {
        return Err("delivery timeout must be greater than 0".to_string());
    }

    let seconds = match unit {
        's' => Some(amount),
        'm' => amount.checked_mul(60),
        'h' => amount.checked_mul(60 * 60),
        _ => None,
    };
    seconds
        .map(Duration::from_secs)
        .ok_or_else(|| format!("invalid delivery timeout '{value}'; expected <number>[s|m|h]"))
}

#[cfg(test)]
#[allow(non_snake_case)]
mod tests {
    use super::*;

    fn base_cli() -> Cli {
        Cli {
            command: None,
            bind: SocketAddr::from(([127, 0, 0, 1], 3000)),
            vapid_private_key: None,
            vapid_public_key: None,
            vapid_subject: None,
            delivery_timeout: None,
            broadcast_concurrency: None,
            cors_origins: Vec::new(),
        }
    }

    #[test]
    fn parse_duration__should_parse_seconds_when_unit_missing() {
        // When
        let duration = parse_duration("30").expect("parse duration");

        // Then
        assert_eq!(duration, Duration::from_secs(30));
    }

    #[test]
    fn parse_duration__should_parse_units() {
        // Then
        assert_eq!(parse_duration("2m").expect("minutes"), Duration::from_secs(120));
        assert_eq!(parse_duration("1H").expect("hours"), Duration::from_secs(3600));
    }

    #[test]
    fn parse_duration__should_reject_invalid_values() {
        // Then
        assert!(parse_duration("").is_err());
        assert!(parse_duration("0").is_err());
        assert!(parse_duration("abc").is_err());
        assert!(parse_duration("5d").is_err());
    }

    #[test]
    fn parse_duration__should_reject_amounts_that_overflow() {
        // Given
        let huge = format!("{}h", u64::MAX / 60);

        // When
        let result = parse_duration(&huge);

        // Then
        assert_eq!(
            result,
            Err(format!(
                "invalid delivery timeout '{huge}'; expected <number>[s|m|h]"
            ))
        );
        assert!(parse_duration(&format!("{}m", u64::MAX)).is_err());
    }

    #[test]
    fn resolve_config__should_apply_defaults() {
        // When
        let config = resolve_config(base_cli()).expect("resolve config");

        // Then
        assert_eq!(config.delivery_timeout, DEFAULT_DELIVERY_TIMEOUT);
        assert_eq!(config.broadcast_concurrency, DEFAULT_BROADCAST_CONCURRENCY);
        assert!(config.cors_origins.is_empty());
        assert_eq!(config.bind, SocketAddr::from(([127, 0, 0, 1], 3000)));
    }

    #[test]
    fn resolve_config__should_reject_zero_concurrency() {
        // Given
        let mut cli = base_cli();
        cli.broadcast_concurrency = Some(0);

        // When
        let result = resolve_config(cli);

        // Then
        assert!(result.is_err());
    }

    #[test]
    fn resolve_config__should_drop_blank_cors_origins() {
        // Given
        let mut cli = base_cli();
        cli.cors_origins = vec![" https://stockhub.example ".to_string(), " ".to_string()];
        cli.delivery_timeout = Some("15s".to_string());

        // When
        let config = resolve_config(cli).expect("resolve config");

        // Then
        assert_eq!(config.cors_origins, vec!["https://stockhub.example".to_string()]);
        assert_eq!(config.delivery_timeout, Duration::from_secs(15));
    }

    #[test]
    fn cli__should_parse_init_subcommand() {
        // When
        let args = ["stockhub-push", "init", "--subject", "mailto:ops@stockhub.example"];
        let cli = Cli::try_parse_from(args).expect("parse cli");

        // Then
        match cli.command {
            Some(Command::Init(args)) => {
                assert_eq!(args.subject.as_deref(), Some("mailto:ops@stockhub.example"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
