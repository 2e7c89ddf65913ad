use chrono::{NaiveDate, NaiveTime};
use failure::{bail, Fallible};
use log::warn;
use slotswap::{
    dal::DB,
    router::serve_on,
    schema::{NewMatch, DEFAULT_SLOTS_PER_MATCH},
    util::log_err,
};
use std::{
    net::{SocketAddr, ToSocketAddrs},
    process::exit,
};
use structopt::StructOpt;
use tokio::runtime::Builder;

fn main() {
    dotenv::dotenv().ok();

    let options = Options::from_args();
    if let Err(err) = options.start_logger() {
        warn!("Logging couldn't start: {}", err);
    }

    if let Err(err) = run(options) {
        log_err(&err);
        exit(1);
    }
}

fn run(options: Options) -> Fallible<()> {
    let mut runtime = Builder::new().build()?;
    let db = DB::connect(&options.database_url)?;
    match options.command {
        Command::Serve { host, port } => {
            let serve_addr = serve_addr(&host, port)?;
            runtime.block_on(serve_on(serve_addr, db))
        }
        Command::AddTeam { name } => {
            let team = runtime.block_on(db.create_team(name))?;
            println!("Added team #{}: {}", team.id, team.name);
            Ok(())
        }
        Command::AddMatch {
            home_team,
            guest_team,
            date,
            start_time,
            location,
            slots,
        } => {
            let new = NewMatch {
                date,
                start_time,
                home_team,
                guest_team,
                location,
            };
            let slots = slots.unwrap_or(DEFAULT_SLOTS_PER_MATCH);
            let roster = runtime.block_on(db.create_match(new, slots))?;
            let slot_ids = roster
                .slots
                .iter()
                .map(|entry| entry.slot.id.to_string())
                .collect::<Vec<_>>();
            println!(
                "Added match #{} with slots {}",
                roster.game.id,
                slot_ids.join(", ")
            );
            Ok(())
        }
        Command::RemoveMatch { id } => runtime.block_on(db.delete_match(id)),
        Command::RemoveUser { username } => runtime.block_on(db.delete_user(username)),
        Command::IssueToken { username } => {
            let token = runtime.block_on(slotswap::logic::auth::issue_token(db, username))?;
            println!("{}", token);
            Ok(())
        }
    }
}

/// Gets the address to serve on.
fn serve_addr(host: &str, port: u16) -> Fallible<SocketAddr> {
    let addrs = (host, port).to_socket_addrs()?.collect::<Vec<_>>();
    if addrs.is_empty() {
        bail!("No matching address exists")
    } else {
        Ok(addrs[0])
    }
}

/// Parses a time of day, with or without seconds.
fn parse_time(s: &str) -> Result<NaiveTime, chrono::ParseError> {
    NaiveTime::parse_from_str(s, "%H:%M").or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
}

#[derive(Debug, StructOpt)]
#[structopt(raw(setting = "::structopt::clap::AppSettings::ColoredHelp"))]
pub struct Options {
    /// Turns off message output. Passing once prevents logging to syslog. Passing twice or more
    /// disables all logging.
    #[structopt(short = "q", long = "quiet", parse(from_occurrences))]
    quiet: usize,

    /// Increases the verbosity. Default verbosity is warnings and higher to syslog, info and
    /// higher to the console.
    #[structopt(short = "v", long = "verbose", parse(from_occurrences))]
    verbose: usize,

    /// The URL of the Postgres database.
    #[structopt(long = "db", env = "DATABASE_URL")]
    pub database_url: String,

    /// The syslog server to send logs to.
    #[structopt(short = "s", long = "syslog-server", env = "SYSLOG_SERVER")]
    syslog_server: Option<String>,

    /// What to do.
    #[structopt(subcommand)]
    command: Command,
}

#[derive(Debug, StructOpt)]
enum Command {
    /// Serves the web interface.
    #[structopt(name = "serve")]
    Serve {
        /// The host to serve on.
        #[structopt(short = "H", long = "host", env = "HOST", default_value = "::")]
        host: String,

        /// The port to serve on.
        #[structopt(short = "P", long = "port", env = "PORT", default_value = "8080")]
        port: u16,
    },

    /// Adds a home team.
    #[structopt(name = "add-team")]
    AddTeam {
        /// The team's name.
        name: String,
    },

    /// Schedules a match.
    #[structopt(name = "add-match")]
    AddMatch {
        /// The name of the hosting team, which must already exist.
        #[structopt(long = "home")]
        home_team: String,

        /// The name of the visiting team.
        #[structopt(long = "guest")]
        guest_team: String,

        /// The day of the match, as YYYY-MM-DD.
        #[structopt(long = "date")]
        date: NaiveDate,

        /// The starting time of the match, as HH:MM.
        #[structopt(long = "time", parse(try_from_str = "parse_time"))]
        start_time: NaiveTime,

        /// Where the match is played.
        #[structopt(long = "location", default_value = "")]
        location: String,

        /// How many volunteer slots the match gets. Defaults to 3.
        #[structopt(long = "slots")]
        slots: Option<u32>,
    },

    /// Removes a match, along with its slots and offers.
    #[structopt(name = "remove-match")]
    RemoveMatch {
        /// The match's ID.
        id: i32,
    },

    /// Removes a user. Slots they held become open again.
    #[structopt(name = "remove-user")]
    RemoveUser {
        /// The user's name.
        username: String,
    },

    /// Prints a new login token for a user, for setting as the `auth` cookie.
    #[structopt(name = "issue-token")]
    IssueToken {
        /// The user's name.
        username: String,
    },
}

impl Options {
    /// Sets up logging as specified by the `-q`, `-s`, and `-v` flags.
    pub fn start_logger(&self) -> Fallible<()> {
        use fern::Dispatch;
        use log::LevelFilter;

        if self.quiet >= 2 {
            return Ok(());
        }

        let (console_ll, syslog_ll) = match self.verbose {
            0 => (LevelFilter::Info, LevelFilter::Warn),
            1 => (LevelFilter::Debug, LevelFilter::Info),
            2 => (LevelFilter::Trace, LevelFilter::Debug),
            _ => (LevelFilter::Trace, LevelFilter::Trace),
        };

        let fern = Dispatch::new().chain(
            Dispatch::new()
                .level(console_ll)
                .format(move |out, message, record| {
                    out.finish(format_args!("[{}] {}", record.level(), message))
                })
                .chain(std::io::stderr()),
        );

        let fern = if self.quiet == 0 {
            let formatter = syslog::Formatter3164 {
                facility: syslog::Facility::LOG_DAEMON,
                hostname: hostname::get_hostname(),
                process: "slotswap".to_owned(),
                pid: ::std::process::id() as i32,
            };

            let syslog = if let Some(ref server) = self.syslog_server {
                syslog::tcp(formatter, server).map_err(failure::SyncFailure::new)?
            } else {
                syslog::unix(formatter.clone())
                    .or_else(|_| syslog::tcp(formatter.clone(), ("127.0.0.1", 601)))
                    .or_else(|_| {
                        syslog::udp(formatter.clone(), ("127.0.0.1", 0), ("127.0.0.1", 514))
                    })
                    .map_err(failure::SyncFailure::new)?
            };

            fern.chain(Dispatch::new().level(syslog_ll).chain(syslog))
        } else {
            fern
        };

        fern.apply()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_time, serve_addr, Command, Options};
    use chrono::{NaiveDate, NaiveTime};
    use structopt::StructOpt;

    #[test]
    fn add_match_takes_its_fields() {
        let options = Options::from_iter(vec![
            "slotswap",
            "--db",
            "postgres://localhost/slotswap",
            "add-match",
            "--home",
            "Team A",
            "--guest",
            "Team C",
            "--date",
            "2026-11-07",
            "--time",
            "14:30",
        ]);
        match options.command {
            Command::AddMatch {
                home_team,
                date,
                start_time,
                location,
                slots,
                ..
            } => {
                assert_eq!(home_team, "Team A");
                assert_eq!(date, NaiveDate::from_ymd(2026, 11, 7));
                assert_eq!(start_time, NaiveTime::from_hms(14, 30, 0));
                assert_eq!(location, "");
                assert_eq!(slots, None);
            }
            other => panic!("parsed as {:?}", other),
        }
    }

    #[test]
    fn verbosity_counts() {
        let options = Options::from_iter(vec![
            "slotswap",
            "-vv",
            "-q",
            "--db",
            "postgres://localhost/slotswap",
            "remove-match",
            "7",
        ]);
        assert_eq!(options.verbose, 2);
        assert_eq!(options.quiet, 1);
    }

    #[test]
    fn times_with_and_without_seconds() {
        assert_eq!(parse_time("09:05").unwrap(), NaiveTime::from_hms(9, 5, 0));
        assert_eq!(parse_time("09:05:30").unwrap(), NaiveTime::from_hms(9, 5, 30));
        assert!(parse_time("nine").is_err());
    }

    #[test]
    fn serves_on_localhost() {
        let addr = serve_addr("127.0.0.1", 8080).unwrap();
        assert_eq!(addr.port(), 8080);
        assert!(addr.ip().is_loopback());
    }
}
