use std::{io, net::SocketAddr, time::Duration};

use clap::Parser;
use log::LevelFilter;
use namefetch::{session::Session, Config, Mode};

/// Resolves domain names with a DNS server and fetches content from the resolved address
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Address of the DNS server to query
    #[arg(long, default_value_t = Config::DEFAULT_RESOLVER)]
    resolver: SocketAddr,
    /// TCP port to fetch content from on the resolved address
    #[arg(long, default_value_t = Config::DEFAULT_FETCH_PORT)]
    fetch_port: u16,
    /// Size of the receive buffers, in bytes
    #[arg(long, default_value_t = namefetch::DEFAULT_BUFFER_SIZE)]
    buffer_size: usize,
    /// Timeout for connecting and for each reply, in milliseconds
    #[arg(long, default_value_t = 5000)]
    timeout_ms: u64,
    /// Only resolve names, do not fetch any content
    #[arg(long)]
    resolve_only: bool,
}

impl Args {
    fn config(&self) -> Config {
        let mode = if self.resolve_only {
            Mode::ResolveOnly
        } else {
            Mode::ResolveAndFetch
        };
        Config::default()
            .resolver(self.resolver)
            .fetch_port(self.fetch_port)
            .buffer_size(self.buffer_size.max(1))
            .timeout(Duration::from_millis(self.timeout_ms.max(1)))
            .mode(mode)
    }
}

fn main() -> io::Result<()> {
    env_logger::Builder::new()
        .filter_module(env!("CARGO_CRATE_NAME"), LevelFilter::Warn)
        .parse_default_env()
        .init();

    let args = Args::parse();
    let config = args.config();
    log::debug!("{:?}", config);

    let stdin = io::stdin();
    let mut session = Session::new(config, stdin.lock(), io::stdout())?;
    session.run()?;
    Ok(())
}
