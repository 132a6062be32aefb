//! Minimal CLI parsing for startup overrides.

use std::env;

#[derive(Debug, Default, PartialEq, Eq)]
pub struct CliOptions {
    /// Insert the sample catalog before serving
    pub seed: bool,
    pub port_override: Option<u16>,
}

impl CliOptions {
    pub fn from_args() -> Self {
        Self::parse(env::args().skip(1))
    }

    fn parse(args: impl IntoIterator<Item = String>) -> Self {
        let mut options = CliOptions::default();
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--seed" => options.seed = true,
                "--port" => {
                    if let Some(value) = args.next() {
                        options.port_override = value.parse().ok();
                    }
                }
                _ if arg.starts_with("--port=") => {
                    if let Some(value) = arg.split_once('=').map(|(_, v)| v) {
                        options.port_override = value.parse().ok();
                    }
                }
                _ => {}
            }
        }
        options
    }
}
