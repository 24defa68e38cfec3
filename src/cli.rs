//! Minimal CLI parsing for config overrides.

use std::env;

use anyhow::{Context, Result};

use crate::config::{Config, LogFormat};

#[derive(Debug, Default, PartialEq)]
pub struct CliOptions {
    pub port: Option<u16>,
    pub database_url: Option<String>,
    pub log_format: Option<LogFormat>,
    /// Print the GraphQL SDL and exit
    pub print_schema: bool,
}

impl CliOptions {
    pub fn from_args() -> Result<Self> {
        Self::parse(env::args().skip(1))
    }

    /// Parse flags in `--flag value` or `--flag=value` form. Unknown flags are ignored.
    pub fn parse<I>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = String>,
    {
        let mut options = CliOptions::default();
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            let (flag, inline) = match arg.split_once('=') {
                Some((flag, value)) => (flag.to_string(), Some(value.to_string())),
                None => (arg, None),
            };
            match flag.as_str() {
                "--print-schema" => options.print_schema = true,
                "--port" => {
                    let value = inline.or_else(|| args.next()).context("--port needs a value")?;
                    options.port = Some(value.parse().context("Invalid --port")?);
                }
                "--database-url" => {
                    let value = inline
                        .or_else(|| args.next())
                        .context("--database-url needs a value")?;
                    options.database_url = Some(value);
                }
                "--log-format" => {
                    let value = inline
                        .or_else(|| args.next())
                        .context("--log-format needs a value")?;
                    options.log_format = Some(value.parse()?);
                }
                _ => {}
            }
        }
        Ok(options)
    }

    /// Flags take precedence over the environment
    pub fn apply(&self, config: &mut Config) {
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(url) = &self.database_url {
            config.database_url = url.clone();
        }
        if let Some(format) = self.log_format {
            config.log_format = format;
        }
    }
}
