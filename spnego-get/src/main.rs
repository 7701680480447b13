use clap::Parser;
use spnego_http::{
    config::{ClientConfig, ClientMode},
    AuthenticatedHttpExecutor, ServiceNameType,
};
use std::{io::IsTerminal, path::PathBuf, process::ExitCode};
use tracing::{error, level_filters::LevelFilter};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// GET a url, authenticating with SPNEGO as a keytab principal or as
/// whoever holds the ticket cache.
#[derive(Parser, Debug)]
#[command(version)]
struct Args {
    /// Path to a TOML configuration file. Flags override its values.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// The url to fetch.
    #[arg(short, long)]
    url: Option<String>,

    /// Principal to log in as, e.g. HTTP/host@REALM.
    #[arg(short, long)]
    principal: Option<String>,

    /// Keytab holding the principal's keys. Without it the ticket
    /// cache is used.
    #[arg(short, long)]
    keytab: Option<String>,

    /// Target name for user-based naming.
    #[arg(short, long)]
    service_principal: Option<String>,

    /// host-based or user-based.
    #[arg(short, long)]
    name_type: Option<ServiceNameType>,

    /// custom or standard.
    #[arg(short, long)]
    mode: Option<ClientMode>,

    /// Extra login option, key=value. May be repeated.
    #[arg(short = 'o', long = "login-option", value_parser = parse_option)]
    login_options: Vec<(String, String)>,
}

fn parse_option(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((k, v)) if !k.is_empty() => Ok((k.to_string(), v.to_string())),
        _ => Err(format!("expected key=value, got `{}`", s)),
    }
}

impl Args {
    fn into_config(self) -> spnego_http::Result<ClientConfig> {
        let mut config = match &self.config {
            Some(path) => ClientConfig::load(path)?,
            None => ClientConfig::default(),
        };
        if let Some(url) = self.url {
            config.access_url = Some(url);
        }
        if let Some(principal) = self.principal {
            config.user_principal = Some(principal);
        }
        if let Some(keytab) = self.keytab {
            config.keytab_location = Some(keytab);
        }
        if let Some(service_principal) = self.service_principal {
            config.service_principal = Some(service_principal);
        }
        if let Some(name_type) = self.name_type {
            config.service_name_type = Some(name_type);
        }
        if let Some(mode) = self.mode {
            config.mode = mode;
        }
        config.login_options.extend(self.login_options);
        Ok(config)
    }
}

fn logging() {
    let format = fmt::layer()
        .with_ansi(std::io::stderr().is_terminal())
        .with_writer(std::io::stderr)
        .with_file(false);

    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(format)
        .with(filter)
        .init();
}

fn run(args: Args) -> spnego_http::Result<()> {
    let config = args.into_config()?;
    let url = config.access_url()?;
    let executor = AuthenticatedHttpExecutor::from_config(&config)?;

    println!("Running Kerberos call to url: {} ({} mode)", url, config.mode);
    let body = executor.execute_get(url)?;
    println!("The response obtained is {}", body);
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    logging();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            let mut source = std::error::Error::source(&e);
            while let Some(cause) = source {
                error!("  caused by: {}", cause);
                source = cause.source();
            }
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_build_config() {
        let args = Args::try_parse_from([
            "spnego-get",
            "--url",
            "http://h.example.com/",
            "--principal",
            "svc/alice@EXAMPLE.COM",
            "--name-type",
            "user_based",
            "--mode",
            "standard",
            "-o",
            "ticketCache=FILE:/tmp/krb5cc_1000",
        ])
        .unwrap();
        let config = args.into_config().unwrap();
        assert_eq!(config.access_url().unwrap(), "http://h.example.com/");
        assert_eq!(config.user_principal.as_deref(), Some("svc/alice@EXAMPLE.COM"));
        assert_eq!(config.service_name_type, Some(ServiceNameType::UserBased));
        assert_eq!(config.mode, ClientMode::Standard);
        assert_eq!(
            config.login_options.get("ticketCache").map(String::as_str),
            Some("FILE:/tmp/krb5cc_1000")
        );
    }

    #[test]
    fn test_bad_login_option() {
        assert!(Args::try_parse_from(["spnego-get", "-o", "novalue"]).is_err());
        assert!(Args::try_parse_from(["spnego-get", "-o", "=x"]).is_err());
    }
}
