use parking_lot::Mutex;

/// Holds a value until it is released, at most once.
///
/// Every release path (explicit disposal, a host finalizer, or the last owner
/// going away) funnels through [`Slot::release`]; whichever path gets there
/// first drops the value and the rest observe an empty slot.
#[derive(Debug)]
pub struct Slot<T> {
    value: Mutex<Option<T>>,
}

impl<T> Slot<T> {
    pub fn new(value: T) -> Self {
        Self {
            value: Mutex::new(Some(value)),
        }
    }

    /// Runs `f` on the value, or returns `None` once it has been released.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> Option<R> {
        self.value.lock().as_ref().map(f)
    }

    /// Drops the value. Returns `false` if it was already gone.
    pub fn release(&self) -> bool {
        let taken = self.value.lock().take();
        // Drop outside the lock: releasing a buffer may unpin host memory.
        match taken {
            Some(value) => {
                drop(value);
                true
            }
            None => false,
        }
    }

    pub fn is_released(&self) -> bool {
        self.value.lock().is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountDrops(Arc<AtomicUsize>);

    impl Drop for CountDrops {
        fn drop(&mut self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_release_is_idempotent() {
        let drops = Arc::new(AtomicUsize::new(0));
        let slot = Slot::new(CountDrops(drops.clone()));

        assert!(slot.release());
        assert!(!slot.release());
        assert!(slot.is_released());
        assert_eq!(drops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_with_after_release() {
        let slot = Slot::new(7);
        assert_eq!(slot.with(|v| *v + 1), Some(8));
        slot.release();
        assert_eq!(slot.with(|v| *v + 1), None);
    }

    #[test]
    fn test_drop_without_release_drops_once() {
        let drops = Arc::new(AtomicUsize::new(0));
        drop(Slot::new(CountDrops(drops.clone())));
        assert_eq!(drops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_racing_releases_drop_once() {
        let drops = Arc::new(AtomicUsize::new(0));
        let slot = Arc::new(Slot::new(CountDrops(drops.clone())));

        let winners: usize = (0..8)
            .map(|_| {
                let slot = slot.clone();
                std::thread::spawn(move || slot.release())
            })
            .collect::<Vec<_>>()
            .into_iter()
            .map(|h| h.join().unwrap() as usize)
            .sum();

        assert_eq!(winners, 1);
        assert_eq!(drops.load(Ordering::SeqCst), 1);
    }
}
