use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

#[derive(Clone, Debug, Parser)]
#[command(version, about = "Minimal concurrent HTTP/1.1 server")]
pub struct Config {
    /// Address to listen on
    #[arg(long = "listen", env = "LISTEN", default_value = "0.0.0.0:4221")]
    pub listen_addr: String,

    /// Directory served by the /files/ routes
    #[arg(long)]
    pub directory: Option<PathBuf>,

    /// Seconds to wait for more request bytes before closing (0 = never)
    #[arg(long = "read-timeout", default_value_t = 30)]
    pub read_timeout_secs: u64,
}

impl Config {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn try_from_args<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Self::try_parse_from(args)
    }

    pub fn read_timeout(&self) -> Option<Duration> {
        (self.read_timeout_secs > 0).then(|| Duration::from_secs(self.read_timeout_secs))
    }
}
