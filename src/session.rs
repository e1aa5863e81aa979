//! The interactive resolve (and fetch) loop.
//!
//! A [`Session`] reads domain names from any [`BufRead`] and writes its prompts and results to any
//! [`Write`], so the same loop serves a terminal, a script piped to stdin, or a test.

use std::{
    fmt,
    io::{BufRead, Write},
    net::IpAddr,
};

use crate::{
    fetch::{FetchClient, Payload},
    message::ResolutionOutcome,
    resolver::ResolverClient,
    Config, Error, Mode,
};

/// State of the prompt loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum State {
    /// Waiting for the user to enter a domain name.
    Prompting,
    /// Resolving (and fetching) the contained name.
    Processing(String),
    /// The user declined to continue, or input ended.
    Done,
}

/// What one iteration of the loop produced for a name.
#[derive(Debug)]
pub enum Outcome {
    /// The name was resolved; no fetch was attempted.
    Resolved(IpAddr),
    /// The name was resolved and content fetched from the address.
    Fetched { address: IpAddr, payload: Payload },
    /// The resolver has no address for the name.
    NotFound,
    /// Resolution or fetching failed.
    Failed(Error),
}

/// Drives repeated resolve (+ fetch) cycles, one name at a time.
pub struct Session<R, W> {
    mode: Mode,
    resolver: ResolverClient,
    fetcher: FetchClient,
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Session<R, W> {
    /// Creates a session, opening the resolver socket that all iterations share.
    pub fn new(config: Config, input: R, output: W) -> Result<Self, Error> {
        Ok(Self {
            mode: config.session_mode(),
            resolver: ResolverClient::new(&config)?,
            fetcher: FetchClient::new(&config),
            input,
            output,
        })
    }

    /// Runs the loop until the user stops it or input ends.
    ///
    /// Lookup failures are reported on the output and do not end the loop; only console I/O
    /// errors are returned.
    pub fn run(&mut self) -> Result<(), Error> {
        let mut state = State::Prompting;
        while state != State::Done {
            state = self.step(state)?;
        }
        Ok(())
    }

    /// Performs one state transition.
    pub fn step(&mut self, state: State) -> Result<State, Error> {
        log::debug!("state: {:?}", state);
        match state {
            State::Prompting => self.prompt(),
            State::Processing(name) => {
                let outcome = self.process(&name);
                self.present(&name, &outcome)?;
                self.ask_continue()
            }
            State::Done => Ok(State::Done),
        }
    }

    /// Resolves `name` and, in [`Mode::ResolveAndFetch`], fetches content from the result.
    pub fn process(&mut self, name: &str) -> Outcome {
        let address = match self.resolver.resolve(name) {
            Ok(ResolutionOutcome::Resolved(address)) => address,
            Ok(ResolutionOutcome::NotFound) => return Outcome::NotFound,
            Err(e) => return Outcome::Failed(e),
        };

        match self.mode {
            Mode::ResolveOnly => Outcome::Resolved(address),
            Mode::ResolveAndFetch => match self.fetcher.fetch(name, address) {
                Ok(payload) => Outcome::Fetched { address, payload },
                Err(e) => Outcome::Failed(e),
            },
        }
    }

    /// Consumes the session, returning its output sink.
    pub fn into_output(self) -> W {
        self.output
    }

    fn prompt(&mut self) -> Result<State, Error> {
        let prompt = match self.mode {
            Mode::ResolveOnly => "Enter domain name for which you need IP address: ",
            Mode::ResolveAndFetch => {
                "Enter domain name for which you need IP address and content: "
            }
        };
        match self.read_answer(prompt)? {
            None => Ok(State::Done),
            Some(line) if line.is_empty() => Ok(State::Prompting),
            Some(line) => Ok(State::Processing(line)),
        }
    }

    fn ask_continue(&mut self) -> Result<State, Error> {
        match self.read_answer("Continue? (y/n): ")? {
            Some(answer) if is_accept(&answer) => Ok(State::Prompting),
            _ => Ok(State::Done),
        }
    }

    /// Prints `prompt` and reads one line, trimmed. Returns `None` at end of input.
    fn read_answer(&mut self, prompt: &str) -> Result<Option<String>, Error> {
        self.output.write_all(prompt.as_bytes()).map_err(Error::Io)?;
        self.output.flush().map_err(Error::Io)?;

        let mut line = String::new();
        if self.input.read_line(&mut line).map_err(Error::Io)? == 0 {
            // Keep the transcript tidy when input ends mid-prompt.
            writeln!(self.output).map_err(Error::Io)?;
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    fn present(&mut self, name: &str, outcome: &Outcome) -> Result<(), Error> {
        if let Outcome::Failed(e) = outcome {
            log::warn!("lookup of '{}' failed: {}", name, e);
        }
        writeln!(self.output, "{}", Report { name, outcome }).map_err(Error::Io)
    }
}

/// Console text for one [`Outcome`].
struct Report<'a> {
    name: &'a str,
    outcome: &'a Outcome,
}

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.name;
        match self.outcome {
            Outcome::Resolved(address) => {
                write!(f, "The IP for the domain name {} is: {}", name, address)
            }
            Outcome::Fetched { address, payload } => {
                writeln!(f, "The IP for the domain name {} is: {}", name, address)?;
                write!(
                    f,
                    "Content received from HTTP server at {}:\n{}",
                    address, payload
                )
            }
            Outcome::NotFound => write!(f, "no address found for the domain name {}", name),
            Outcome::Failed(e) => write!(f, "Lookup of {} failed: {}", name, e),
        }
    }
}

/// Whether a reply to the continue prompt means "yes".
fn is_accept(answer: &str) -> bool {
    answer.eq_ignore_ascii_case("y") || answer.eq_ignore_ascii_case("yes")
}

#[cfg(test)]
mod tests {
    use std::{io::Cursor, time::Duration};

    use crate::testing::{closed_port, EchoServer, StubResolver};

    use super::*;

    fn run(config: Config, input: &str) -> String {
        let mut session = Session::new(config, Cursor::new(input.to_string()), Vec::new()).unwrap();
        session.run().unwrap();
        String::from_utf8(session.into_output()).unwrap()
    }

    fn config(resolver: &StubResolver) -> Config {
        Config::default()
            .resolver(resolver.addr())
            .timeout(Duration::from_secs(2))
    }

    #[test]
    fn accept_tokens() {
        assert!(is_accept("y"));
        assert!(is_accept("Y"));
        assert!(is_accept("YES"));
        assert!(!is_accept("n"));
        assert!(!is_accept(""));
        assert!(!is_accept("yep"));
    }

    #[test]
    fn resolve_and_fetch() {
        let resolver = StubResolver::start(&[("example.test", "127.0.0.1")]);
        let content = EchoServer::start();
        let out = run(
            config(&resolver).fetch_port(content.port()),
            "example.test\nn\n",
        );

        assert!(out.starts_with("Enter domain name for which you need IP address and content: "));
        assert!(out.contains("The IP for the domain name example.test is: 127.0.0.1\n"));
        assert!(out.contains("Content received from HTTP server at 127.0.0.1:\nHTTP/1.1 200 OK"));
        assert!(out.contains("content for example.test"));
        assert!(out.ends_with("Continue? (y/n): "));
        assert_eq!(content.requests().len(), 1);
    }

    #[test]
    fn not_found_skips_fetch() {
        let resolver = StubResolver::start(&[("example.test", "127.0.0.1")]);
        let content = EchoServer::start();
        let out = run(
            config(&resolver).fetch_port(content.port()),
            "missing.test\nn\n",
        );

        assert!(out.contains("no address found for the domain name missing.test\n"));
        assert!(!out.contains("Content received"));
        assert!(content.requests().is_empty());
    }

    #[test]
    fn resolve_only() {
        let resolver = StubResolver::start(&[("example.test", "203.0.113.5")]);
        let out = run(config(&resolver).mode(Mode::ResolveOnly), "example.test\nno\n");
        assert_eq!(
            out,
            "Enter domain name for which you need IP address: \
             The IP for the domain name example.test is: 203.0.113.5\n\
             Continue? (y/n): "
        );
    }

    #[test]
    fn loops_until_declined() {
        let resolver = StubResolver::start(&[("example.test", "203.0.113.5")]);
        let out = run(
            config(&resolver).mode(Mode::ResolveOnly),
            "example.test\nY\n\nmissing.test\nyes\nexample.test\nq\nexample.test\n",
        );
        assert_eq!(out.matches("is: 203.0.113.5").count(), 2);
        assert_eq!(out.matches("no address found").count(), 1);
        // the empty line re-prompts without a lookup
        assert_eq!(out.matches("Enter domain name").count(), 4);
        assert_eq!(resolver.queries_seen(), 3);
    }

    #[test]
    fn failures_do_not_end_the_loop() {
        let resolver = StubResolver::start(&[("example.test", "127.0.0.1")]);
        let out = run(
            config(&resolver).fetch_port(closed_port()),
            "example.test\ny\nbad..name\nn\n",
        );
        assert!(out.contains("Lookup of example.test failed: connection error"));
        assert!(out.contains("Lookup of bad..name failed: invalid domain name"));
        assert_eq!(out.matches("Continue? (y/n): ").count(), 2);

        let garbage = StubResolver::start_raw(|_| vec![0xde, 0xad, 0xbe, 0xef, 0x00]);
        let out = run(config(&garbage), "example.test
y
example.test
n
");
        assert_eq!(
            out.matches("Lookup of example.test failed: malformed resolver reply")
                .count(),
            2
        );
        assert_eq!(out.matches("Continue? (y/n): ").count(), 2);
        assert_eq!(garbage.queries_seen(), 2);
    }

    #[test]
    fn end_of_input() {
        let resolver = StubResolver::start(&[]);
        let out = run(config(&resolver), "");
        assert_eq!(
            out,
            "Enter domain name for which you need IP address and content: \n"
        );

        let mut session =
            Session::new(config(&resolver), Cursor::new(String::new()), Vec::new()).unwrap();
        assert_eq!(session.step(State::Prompting).unwrap(), State::Done);
        assert_eq!(session.step(State::Done).unwrap(), State::Done);
    }
}
