use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::process;

use getopts::Options;
use tokio::time::Duration;

const DEFAULT_UPSTREAM: &str =
    "https://gist.githubusercontent.com/Thomas-Marchand/427d44e917d26d6073378d81db84d5b2/raw/calendar_events.json";

pub struct Args {
    pub address: SocketAddr,
    pub upstream: String,
    pub refresh: Duration,
    pub stale_hours: f64,
    pub preferences: Option<PathBuf>,
    pub utc_offset: i32,
}

fn opts() -> Options {
    let mut opts = Options::new();
    opts.optflag(
        "h",
        "help",
        concat!("Print the help output of ", env!("CARGO_PKG_NAME")),
    );
    opts.optopt(
        "a",
        "address",
        "Socket address (IP and port) to listen on [Default: 127.0.0.1:8080]",
        "SOCKET_ADDRESS",
    );
    opts.optopt(
        "u",
        "upstream",
        "URL of the compact schedule dataset [Default: the published gist]",
        "URL",
    );
    opts.optopt(
        "r",
        "refresh",
        "Seconds between dataset refetches [Default: 900]",
        "SECONDS",
    );
    opts.optopt(
        "s",
        "stale-hours",
        "Age after which the dataset is reported stale [Default: 24]",
        "HOURS",
    );
    opts.optopt(
        "p",
        "preferences",
        "JSON file holding the selected groups and view [Default: in memory only]",
        "PATH",
    );
    opts.optopt(
        "o",
        "utc-offset",
        "Viewer's offset from UTC, used to decide what \"today\" is [Default: 0]",
        "MINUTES",
    );
    opts
}

pub fn parse(args: Vec<String>) -> Args {
    let opts = opts();

    let matches = match opts.parse(args) {
        Ok(matches) => matches,
        Err(fail) => {
            eprintln!("{fail}");
            process::exit(1);
        }
    };

    if matches.opt_present("help") {
        println!("{}", opts.usage(&opts.short_usage(env!("CARGO_PKG_NAME"))));
        process::exit(0);
    }

    let address = match matches.opt_get_default("address", SocketAddr::from(([127, 0, 0, 1], 8080)))
    {
        Ok(address) => address,
        Err(err) => {
            eprintln!("Provided value for option 'address' is invalid: {err}");
            process::exit(1);
        }
    };

    let upstream = matches
        .opt_str("upstream")
        .unwrap_or_else(|| DEFAULT_UPSTREAM.to_string());

    let refresh = match matches.opt_get_default("refresh", 900) {
        Ok(secs) if secs > 0 => Duration::from_secs(secs),
        Ok(_) => {
            eprintln!("Provided value for option 'refresh' must be positive");
            process::exit(1);
        }
        Err(err) => {
            eprintln!("Provided value for option 'refresh' is invalid: {err}");
            process::exit(1);
        }
    };

    let stale_hours = match matches.opt_get_default("stale-hours", 24.0) {
        Ok(hours) => hours,
        Err(err) => {
            eprintln!("Provided value for option 'stale-hours' is invalid: {err}");
            process::exit(1);
        }
    };

    let utc_offset = match matches.opt_get_default("utc-offset", 0) {
        Ok(minutes) => minutes,
        Err(err) => {
            eprintln!("Provided value for option 'utc-offset' is invalid: {err}");
            process::exit(1);
        }
    };

    Args {
        address,
        upstream,
        refresh,
        stale_hours,
        preferences: matches.opt_str("preferences").map(PathBuf::from),
        utc_offset,
    }
}
