use clap::{Parser, builder::BoolishValueParser};
use ia_core::control::OperationTimeouts;
use ia_core::invoker::DEFAULT_MAX_OUTPUT_BYTES;
use ia_core::resolver::ResolverConfig;
use ia_core::runner::CliLimits;
use ia_mcp::server::{DEFAULT_HTTP_ADDR, Transports};
use std::error::Error;
use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 60;
const DEFAULT_DOWNLOAD_TIMEOUT_SECS: u64 = 600;
const DEFAULT_VERSION_TIMEOUT_SECS: u64 = 15;

#[derive(Parser, Debug)]
#[command(name = "ia-mcpd", version, about = "Internet Archive MCP daemon.")]
struct CliArgs {
    /// Path to a known-good `ia` executable; skips executable probing.
    #[arg(long, env = "IA_MCP_IA_PATH")]
    ia_path: Option<PathBuf>,

    #[arg(long, env = "IA_MCP_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout_secs: u64,

    #[arg(
        long,
        env = "IA_MCP_DOWNLOAD_TIMEOUT_SECS",
        default_value_t = DEFAULT_DOWNLOAD_TIMEOUT_SECS
    )]
    download_timeout_secs: u64,

    #[arg(
        long,
        env = "IA_MCP_VERSION_TIMEOUT_SECS",
        default_value_t = DEFAULT_VERSION_TIMEOUT_SECS
    )]
    version_timeout_secs: u64,

    #[arg(
        long,
        env = "IA_MCP_MAX_OUTPUT_BYTES",
        default_value_t = DEFAULT_MAX_OUTPUT_BYTES
    )]
    max_output_bytes: usize,

    #[arg(
        long = "stdio",
        env = "IA_MCP_STDIO",
        default_value_t = true,
        value_parser = BoolishValueParser::new()
    )]
    enable_stdio: bool,

    #[arg(
        long = "http",
        env = "IA_MCP_HTTP_SERVE",
        default_value_t = false,
        value_parser = BoolishValueParser::new()
    )]
    http_serve: bool,

    #[arg(long, env = "IA_MCP_HTTP_ADDR", default_value = DEFAULT_HTTP_ADDR)]
    http_addr: SocketAddr,
}

/// Runtime configuration loaded from CLI arguments and environment variables.
#[derive(Debug, Clone)]
pub struct IaConfig {
    pub ia_path: Option<PathBuf>,
    pub timeouts: OperationTimeouts,
    pub limits: CliLimits,
    pub enable_stdio: bool,
    pub http_serve: bool,
    pub http_addr: SocketAddr,
}

#[derive(Debug)]
pub enum ConfigError {
    MissingSetting(&'static str),
    InvalidSetting { name: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingSetting(name) => write!(f, "missing required setting: {name}"),
            Self::InvalidSetting { name, value } => {
                write!(f, "invalid {name} value: {value}")
            }
        }
    }
}

impl Error for ConfigError {}

impl IaConfig {
    pub fn from_args() -> Result<Self, ConfigError> {
        let args = CliArgs::parse();
        Self::try_from(args)
    }

    #[must_use]
    pub fn resolver_config(&self) -> ResolverConfig {
        ResolverConfig::from_env().with_explicit_path(self.ia_path.clone())
    }

    #[must_use]
    pub fn transports(&self) -> Transports {
        Transports {
            stdio: self.enable_stdio,
            http: self.http_serve.then_some(self.http_addr),
        }
    }
}

impl TryFrom<CliArgs> for IaConfig {
    type Error = ConfigError;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        let ia_path = args
            .ia_path
            .filter(|path| !path.as_os_str().is_empty());

        let timeout = positive_secs("IA_MCP_TIMEOUT_SECS", args.timeout_secs)?;
        let download = positive_secs("IA_MCP_DOWNLOAD_TIMEOUT_SECS", args.download_timeout_secs)?;
        let version_timeout = positive_secs("IA_MCP_VERSION_TIMEOUT_SECS", args.version_timeout_secs)?;

        if args.max_output_bytes == 0 {
            return Err(ConfigError::InvalidSetting {
                name: "IA_MCP_MAX_OUTPUT_BYTES",
                value: args.max_output_bytes.to_string(),
            });
        }

        if !args.enable_stdio && !args.http_serve {
            return Err(ConfigError::MissingSetting("IA_MCP_STDIO or IA_MCP_HTTP_SERVE"));
        }

        Ok(Self {
            ia_path,
            timeouts: OperationTimeouts {
                default: timeout,
                download,
            },
            limits: CliLimits {
                max_output_bytes: args.max_output_bytes,
                version_timeout,
            },
            enable_stdio: args.enable_stdio,
            http_serve: args.http_serve,
            http_addr: args.http_addr,
        })
    }
}

fn positive_secs(name: &'static str, secs: u64) -> Result<Duration, ConfigError> {
    if secs == 0 {
        return Err(ConfigError::InvalidSetting {
            name,
            value: secs.to_string(),
        });
    }
    Ok(Duration::from_secs(secs))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_args() -> CliArgs {
        CliArgs {
            ia_path: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            download_timeout_secs: DEFAULT_DOWNLOAD_TIMEOUT_SECS,
            version_timeout_secs: DEFAULT_VERSION_TIMEOUT_SECS,
            max_output_bytes: DEFAULT_MAX_OUTPUT_BYTES,
            enable_stdio: true,
            http_serve: false,
            http_addr: DEFAULT_HTTP_ADDR.parse().expect("valid HTTP addr"),
        }
    }

    #[test]
    fn defaults_parse() {
        let config = IaConfig::try_from(base_args()).expect("config should parse");

        assert_eq!(config.timeouts.default, Duration::from_secs(60));
        assert_eq!(config.timeouts.download, Duration::from_secs(600));
        assert_eq!(config.limits.max_output_bytes, DEFAULT_MAX_OUTPUT_BYTES);
        assert!(config.ia_path.is_none());
    }

    #[test]
    fn empty_ia_path_is_ignored() {
        let mut args = base_args();
        args.ia_path = Some(PathBuf::new());

        let config = IaConfig::try_from(args).expect("config should parse");

        assert!(config.ia_path.is_none());
        assert!(config.resolver_config().explicit_path.is_none());
    }

    #[test]
    fn explicit_ia_path_reaches_resolver() {
        let mut args = base_args();
        args.ia_path = Some(PathBuf::from("/opt/ia/bin/ia"));

        let config = IaConfig::try_from(args).expect("config should parse");

        assert_eq!(
            config.resolver_config().explicit_path,
            Some(PathBuf::from("/opt/ia/bin/ia"))
        );
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let mut args = base_args();
        args.download_timeout_secs = 0;

        let err = IaConfig::try_from(args).expect_err("zero timeout should fail");

        assert!(err.to_string().contains("IA_MCP_DOWNLOAD_TIMEOUT_SECS"));
    }

    #[test]
    fn requires_a_transport() {
        let mut args = base_args();
        args.enable_stdio = false;

        assert!(matches!(
            IaConfig::try_from(args),
            Err(ConfigError::MissingSetting(_))
        ));
    }

    #[test]
    fn cli_flags_parse() {
        let args = CliArgs::try_parse_from([
            "ia-mcpd",
            "--ia-path",
            "/usr/local/bin/ia",
            "--timeout-secs",
            "5",
            "--http",
        ])
        .expect("flags should parse");

        let config = IaConfig::try_from(args).expect("config should parse");

        assert_eq!(config.timeouts.default, Duration::from_secs(5));
        assert_eq!(
            config.transports(),
            Transports {
                stdio: true,
                http: Some(DEFAULT_HTTP_ADDR.parse().expect("valid HTTP addr")),
            }
        );
    }

    #[test]
    fn http_addr_is_ignored_unless_http_is_enabled() {
        let mut args = base_args();
        args.http_addr = "0.0.0.0:9000".parse().expect("valid HTTP addr");

        let config = IaConfig::try_from(args).expect("config should parse");

        assert_eq!(config.transports().http, None);
        assert!(config.transports().stdio);
    }
}
