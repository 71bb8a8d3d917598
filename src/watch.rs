use std::path::PathBuf;
use std::sync::mpsc::{Receiver, channel};

/// Watches one config file from a background thread. Each change arrives as
/// a `()` on the returned channel; bursts are coalesced by the consumer.
pub fn watch_config(path: PathBuf) -> Receiver<()> {
    let (tx, rx) = channel::<()>();
    let spawned = std::thread::Builder::new()
        .name("terrane-config-watch".into())
        .spawn(move || {
            use notify::{EventKind, RecursiveMode, Watcher};
            let watcher = notify::recommended_watcher(move |res: Result<notify::Event, notify::Error>| {
                match res {
                    Ok(event) => match event.kind {
                        EventKind::Modify(_)
                        | EventKind::Create(_)
                        | EventKind::Remove(_)
                        | EventKind::Any => {
                            let _ = tx.send(());
                        }
                        _ => {}
                    },
                    Err(e) => log::warn!("config watch error: {}", e),
                }
            });
            let mut watcher = match watcher {
                Ok(w) => w,
                Err(e) => {
                    log::warn!("cannot watch {}: {}", path.display(), e);
                    return;
                }
            };
            if let Err(e) = watcher.watch(path.as_path(), RecursiveMode::NonRecursive) {
                log::warn!("cannot watch {}: {}", path.display(), e);
                return;
            }
            log::info!("watching {} for changes", path.display());
            loop {
                std::thread::sleep(std::time::Duration::from_secs(3600));
            }
        });
    if let Err(e) = spawned {
        log::warn!("failed to spawn config watcher: {}", e);
    }
    rx
}

/// True when at least one change was queued; drains the rest.
pub fn changed(rx: &Receiver<()>) -> bool {
    rx.try_iter().count() > 0
}
