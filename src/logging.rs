use std::{env, fmt};

use colored::{ColoredString, Colorize};
use log::{Level, LevelFilter};

/// Setting this to `debug` also shows debug logs of the vitrola crates
const VERBOSITY_VAR: &str = "VITROLA_LOG";

pub fn init_logger() {
    let local_level = match env::var(VERBOSITY_VAR).as_deref() {
        Ok("debug") => LevelFilter::Debug,
        _ => LevelFilter::Info,
    };

    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{:^5} {} {:^9} {}",
                badge(record.level()),
                chrono::Local::now().format("%H:%M:%S").to_string().bright_black(),
                Target::from_module(record.target()),
                message
            ))
        })
        .filter(move |meta| match Target::from_module(meta.target()) {
            // External crates only need to log warnings and errors
            Target::External(_) => meta.level() <= Level::Warn,
            _ => meta.level() <= local_level,
        })
        .chain(std::io::stdout())
        .apply()
        .expect("logging is initialized")
}

enum Target<'a> {
    External(&'a str),
    Vitrola,
    Server,
    Core,
}

impl<'a> Target<'a> {
    fn from_module(target: &'a str) -> Self {
        let krate = target.split("::").next().unwrap_or_default();

        match krate {
            "vitrola_core" => Self::Core,
            "vitrola_server" => Self::Server,
            "vitrola" => Self::Vitrola,
            other => Self::External(other),
        }
    }
}

impl fmt::Display for Target<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label: ColoredString = match self {
            Target::External(krate) => krate.clear(),
            Target::Vitrola => "VITROLA".bright_purple(),
            Target::Server => "SERVER".bright_green(),
            Target::Core => "CORE".blue(),
        };

        fmt::Display::fmt(&label, f)
    }
}

fn badge(level: Level) -> ColoredString {
    match level {
        Level::Error => " ERR ".black().on_red().bold(),
        Level::Warn => " WRN ".black().on_yellow().bold(),
        Level::Info => " INF ".black().on_blue().bold(),
        Level::Debug => " DBG ".white().on_black(),
        Level::Trace => " TRC ".normal(),
    }
}
