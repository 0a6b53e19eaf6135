use std::{
    panic::{self, AssertUnwindSafe},
    sync::{Arc, Weak},
    thread,
    time::{Duration, Instant},
};

use log::{debug, error, info};

use crate::Jukebox;

const TICK_RATE: Duration = Duration::from_millis(250);
const PRUNE_EVERY: u32 = 240;

/// Spawns the thread skipping items no display managed to load, and forgetting old requests.
/// The thread exits once the jukebox is dropped.
pub fn spawn_watchdog_thread(jukebox: &Arc<Jukebox>) {
    let jukebox: Weak<Jukebox> = Arc::downgrade(jukebox);

    let run = move || {
        let mut ticks = 0u32;

        while let Some(jukebox) = jukebox.upgrade() {
            ticks += 1;
            let prune = ticks >= PRUNE_EVERY;

            if prune {
                ticks = 0;
            }

            guarded(|| tick(&jukebox, prune));

            drop(jukebox);
            thread::sleep(TICK_RATE);
        }

        info!("Jukebox dropped, watchdog exiting");
    };

    thread::Builder::new()
        .name("vitrola-watchdog".to_string())
        .spawn(run)
        .expect("watchdog thread is spawned");
}

fn tick(jukebox: &Jukebox, prune: bool) {
    jukebox.check_load_timeout(Instant::now());

    if prune {
        let pruned = jukebox.prune_history();
        if pruned > 0 {
            debug!("Forgot {} finished requests", pruned);
        }
    }
}

/// Runs a tick, logging a panic instead of letting it end the thread.
/// The jukebox lock does not poison, so the next tick starts from a consistent state.
fn guarded<F: FnOnce()>(f: F) -> bool {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(()) => true,
        Err(_) => {
            error!("Watchdog tick panicked, load timeouts and pruning may be skipped this tick");
            false
        }
    }
}
