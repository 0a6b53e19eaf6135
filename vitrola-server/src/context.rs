use std::sync::Arc;

use axum::extract::FromRef;
use log::warn;
use rand::{
    distributions::{Alphanumeric, DistString},
    thread_rng,
};
use vitrola_core::Jukebox;

use crate::connections::ConnectionManager;

const GENERATED_TOKEN_LENGTH: usize = 32;

#[derive(Clone, FromRef)]
pub struct ServerContext {
    pub jukebox: Arc<Jukebox>,
    pub connections: Arc<ConnectionManager>,
    /// The bearer token admin routes expect
    pub admin_token: Arc<str>,
}

impl ServerContext {
    /// Creates the context. Without a configured token, a random one is generated and logged.
    pub fn new(
        jukebox: Arc<Jukebox>,
        connections: Arc<ConnectionManager>,
        admin_token: Option<String>,
    ) -> Self {
        let admin_token = admin_token.unwrap_or_else(|| {
            let token = Alphanumeric.sample_string(&mut thread_rng(), GENERATED_TOKEN_LENGTH);
            warn!("No admin token configured, generated {}", token);

            token
        });

        Self {
            jukebox,
            connections,
            admin_token: admin_token.into(),
        }
    }
}
