use std::{env, str::FromStr, sync::Arc};

use colored::Colorize;
use log::{error, info};
use thiserror::Error;
use tokio::runtime::{self, Runtime};
use vitrola_core::{
    implementors::{AllowAll, WordListModeration},
    Config, Jukebox, Moderation,
};
use vitrola_server::{run_server, ConnectionManager, ServerContext, DEFAULT_PORT};

mod logging;

/// Words at or above this severity block a request
const BLOCKED_WORD_THRESHOLD: u8 = 1;

pub struct Vitrola {
    jukebox: Arc<Jukebox>,
    connections: Arc<ConnectionManager>,
    admin_token: Option<String>,
    port: u16,
    runtime: Runtime,
}

#[derive(Debug, Error)]
enum VitrolaError {
    #[error("Invalid value for {name}: {value}")]
    Config { name: &'static str, value: String },

    #[error("Fatal error: {0}")]
    Fatal(String),
}

impl Vitrola {
    fn new() -> Result<Self, VitrolaError> {
        info!("Building async runtime...");
        let runtime = runtime::Builder::new_multi_thread()
            .enable_all()
            .thread_name("vitrola-async")
            .build()
            .map_err(|e| VitrolaError::Fatal(e.to_string()))?;

        let config = config_from_env()?;
        let port = env_var("VITROLA_SERVER_PORT")?.unwrap_or(DEFAULT_PORT);

        info!(
            "Free mode is {}, queue holds {}",
            if config.free_mode { "on" } else { "off" },
            config
                .max_queue_size
                .map(|x| format!("{} requests", x))
                .unwrap_or_else(|| "any number of requests".to_string())
        );

        let connections = ConnectionManager::new();
        let jukebox = Jukebox::new(config, connections.clone(), moderation_from_env());

        Ok(Self {
            jukebox,
            connections,
            admin_token: env::var("VITROLA_ADMIN_TOKEN").ok(),
            port,
            runtime,
        })
    }

    fn run(self) -> Result<(), VitrolaError> {
        let context = self.context();

        self.runtime
            .block_on(run_server(context, self.port))
            .map_err(|e| VitrolaError::Fatal(e.to_string()))
    }

    fn context(&self) -> ServerContext {
        ServerContext::new(
            self.jukebox.clone(),
            self.connections.clone(),
            self.admin_token.clone(),
        )
    }
}

impl VitrolaError {
    fn hint(&self) -> String {
        match self {
            VitrolaError::Config { .. } => "This is a configuration error. Check the VITROLA_* environment variables, then try again.".to_string(),
            VitrolaError::Fatal(_) => "This error is fatal, and should not happen. Make sure the port is not already in use.".to_string(),
        }
    }
}

fn config_from_env() -> Result<Config, VitrolaError> {
    let mut config = Config::default();

    if let Some(free_mode) = env_var("VITROLA_FREE_MODE")? {
        config.free_mode = free_mode;
    }

    if let Some(prevent_duplicates) = env_var("VITROLA_PREVENT_DUPLICATES")? {
        config.prevent_duplicates = prevent_duplicates;
    }

    if let Some(max_queue_size) = env_var::<usize>("VITROLA_MAX_QUEUE_SIZE")? {
        config.max_queue_size = Some(max_queue_size).filter(|x| *x > 0);
    }

    if let Some(load_timeout) = env_var::<f64>("VITROLA_LOAD_TIMEOUT")? {
        let seconds = Config::valid_load_timeout(load_timeout).ok_or(VitrolaError::Config {
            name: "VITROLA_LOAD_TIMEOUT",
            value: load_timeout.to_string(),
        })?;

        config.load_timeout_in_seconds = Some(seconds).filter(|x| *x > 0.);
    }

    Ok(config)
}

fn moderation_from_env() -> Arc<dyn Moderation> {
    match env::var("VITROLA_BLOCKED_WORDS") {
        Ok(list) => {
            let moderation = WordListModeration::parse(&list, BLOCKED_WORD_THRESHOLD);
            info!("Moderating with {} blocked words", moderation.len());

            Arc::new(moderation)
        }
        Err(_) => Arc::new(AllowAll),
    }
}

/// Reads and parses an environment variable, if it is set
fn env_var<T: FromStr>(name: &'static str) -> Result<Option<T>, VitrolaError> {
    let Ok(value) = env::var(name) else {
        return Ok(None);
    };

    let parsed = value.trim().parse();

    match parsed {
        Ok(parsed) => Ok(Some(parsed)),
        Err(_) => Err(VitrolaError::Config { name, value }),
    }
}

fn main() {
    logging::init_logger();

    let result = Vitrola::new().and_then(|vitrola| {
        info!("Initialized successfully.");
        vitrola.run()
    });

    if let Err(error) = result {
        error!("{} Read the error below to troubleshoot the issue. If you think this might be a bug, please report it by making a GitHub issue.", "Vitrola failed to start!".bold().red());
        error!("{}", error);
        error!(
            "{}",
            format!("Hint: {}", error.hint()).dimmed().italic()
        );
    }
}
