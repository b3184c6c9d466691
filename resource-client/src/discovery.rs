//! Lazy discovery results
//!
//! A [`DiscoveryIterator`] yields resources as responders report them. It ends
//! when every responder is done or when no new match arrives within the
//! discovery timeout, and it cannot be restarted; start a new discovery
//! instead. Dropping it early tells the producer to stop.

use resource_model::{ResourceHandle, ResourceId};
use std::collections::HashSet;
use std::sync::mpsc;
use std::time::Duration;

/// Iterator over discovered resources
///
/// # Examples
///
/// ```rust,ignore
/// for handle in client.discover("oic.r.light.brightness") {
///     println!("Found: {}", handle);
/// }
/// ```
pub struct DiscoveryIterator {
    rx: Option<mpsc::Receiver<ResourceHandle>>,
    timeout: Duration,
    seen: HashSet<ResourceId>,
    finished: bool,
}

impl DiscoveryIterator {
    pub(crate) fn new(rx: mpsc::Receiver<ResourceHandle>, timeout: Duration) -> Self {
        Self {
            rx: Some(rx),
            timeout,
            seen: HashSet::new(),
            finished: false,
        }
    }

    /// Create an empty iterator that yields no results
    /// Used as a fallback when discovery cannot start
    pub(crate) fn empty() -> Self {
        Self {
            rx: None,
            timeout: Duration::ZERO,
            seen: HashSet::new(),
            finished: true,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    fn finish(&mut self) {
        self.finished = true;
        self.rx = None;
    }
}

impl Iterator for DiscoveryIterator {
    type Item = ResourceHandle;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.finished {
            let Some(rx) = self.rx.as_ref() else {
                self.finish();
                break;
            };
            match rx.recv_timeout(self.timeout) {
                Ok(handle) => {
                    if self.seen.insert(handle.id.clone()) {
                        return Some(handle);
                    }
                }
                Err(mpsc::RecvTimeoutError::Timeout) => {
                    tracing::debug!("Discovery timed out after {} results", self.seen.len());
                    self.finish();
                }
                Err(mpsc::RecvTimeoutError::Disconnected) => self.finish(),
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle(uri: &str) -> ResourceHandle {
        ResourceHandle {
            id: ResourceId::new("host", uri),
            resource_types: vec!["t".to_string()],
            interfaces: vec![],
            observable: true,
        }
    }

    #[test]
    fn test_duplicates_are_skipped() {
        let (tx, rx) = mpsc::channel();
        tx.send(handle("/a")).unwrap();
        tx.send(handle("/a")).unwrap();
        tx.send(handle("/b")).unwrap();
        drop(tx);

        let uris: Vec<String> = DiscoveryIterator::new(rx, Duration::from_secs(1))
            .map(|h| h.id.uri)
            .collect();
        assert_eq!(uris, vec!["/a", "/b"]);
    }

    #[test]
    fn test_timeout_ends_iteration() {
        let (tx, rx) = mpsc::channel();
        tx.send(handle("/a")).unwrap();

        let mut iter = DiscoveryIterator::new(rx, Duration::from_millis(50));
        assert!(iter.next().is_some());
        assert!(iter.next().is_none());
        assert!(iter.is_finished());

        // Not restartable even if the producer reports more later
        let _ = tx.send(handle("/b"));
        assert!(iter.next().is_none());
    }

    #[test]
    fn test_empty_iterator() {
        let mut iter = DiscoveryIterator::empty();
        assert!(iter.next().is_none());
    }
}
