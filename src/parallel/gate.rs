use crossbeam::channel::{Receiver, Sender, bounded};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Fixed-capacity admission gate backed by a channel of tokens.
///
/// The channel is pre-filled with `capacity` tokens. Admitting work takes a
/// token (blocking while none are left) and dropping the returned [`Permit`]
/// puts it back, so the number of admitted permits never exceeds capacity.
#[derive(Debug)]
pub struct AdmissionGate {
    capacity: usize,
    slots_tx: Sender<()>,
    slots_rx: Receiver<()>,
    admitted: AtomicUsize,
    peak: AtomicUsize,
}

impl AdmissionGate {
    /// Create a gate with `capacity` slots. A capacity of zero is clamped to
    /// one; configuration validation rejects zero before a gate is built.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (slots_tx, slots_rx) = bounded(capacity);
        for _ in 0..capacity {
            // Cannot fail: the channel has exactly `capacity` free slots and
            // both ends are alive.
            let _ = slots_tx.try_send(());
        }

        Self {
            capacity,
            slots_tx,
            slots_rx,
            admitted: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    /// Block until a slot is free, then admit one unit of work.
    pub fn acquire(&self) -> Permit<'_> {
        // The gate owns a sender, so the channel never disconnects and `recv`
        // only returns once a token is taken.
        let _ = self.slots_rx.recv();

        let now = self.admitted.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        Permit { gate: self }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Currently admitted permits
    pub fn admitted(&self) -> usize {
        self.admitted.load(Ordering::SeqCst)
    }

    /// Highest number of permits that were ever admitted at the same time
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    fn release(&self) {
        // Decrement before handing the token back so `admitted` can never be
        // observed above capacity.
        self.admitted.fetch_sub(1, Ordering::SeqCst);
        let _ = self.slots_tx.send(());
    }
}

/// Proof of admission. The slot is returned when the permit is dropped,
/// including while unwinding from a panic.
#[derive(Debug)]
#[must_use = "dropping a permit immediately releases its slot"]
pub struct Permit<'a> {
    gate: &'a AdmissionGate,
}

impl Drop for Permit<'_> {
    fn drop(&mut self) {
        self.gate.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_gate_tracks_admitted_and_peak() {
        let gate = AdmissionGate::new(2);
        assert_eq!(gate.capacity(), 2);

        let first = gate.acquire();
        let second = gate.acquire();
        assert_eq!(gate.admitted(), 2);
        assert_eq!(gate.peak(), 2);

        drop(first);
        assert_eq!(gate.admitted(), 1);
        drop(second);
        assert_eq!(gate.admitted(), 0);
        assert_eq!(gate.peak(), 2);
    }

    #[test]
    fn test_tokens_survive_many_cycles() {
        let gate = AdmissionGate::new(2);
        for _ in 0..100 {
            let _a = gate.acquire();
            let _b = gate.acquire();
        }
        assert_eq!(gate.admitted(), 0);
        assert_eq!(gate.peak(), 2);
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let gate = AdmissionGate::new(0);
        assert_eq!(gate.capacity(), 1);
        let _permit = gate.acquire();
        assert_eq!(gate.admitted(), 1);
    }

    #[test]
    fn test_acquire_blocks_until_release() {
        let gate = AdmissionGate::new(1);
        let held = gate.acquire();

        crossbeam::thread::scope(|s| {
            let waiter = s.spawn(|_| {
                let _permit = gate.acquire();
                gate.peak()
            });

            std::thread::sleep(Duration::from_millis(50));
            assert_eq!(gate.admitted(), 1, "second acquire must still be blocked");
            drop(held);

            assert_eq!(waiter.join().unwrap(), 1);
        })
        .unwrap();

        assert_eq!(gate.admitted(), 0);
    }

    #[test]
    fn test_permit_released_on_panic() {
        let gate = AdmissionGate::new(1);

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _permit = gate.acquire();
            panic!("boom");
        }));

        assert!(result.is_err());
        assert_eq!(gate.admitted(), 0);
        let _again = gate.acquire();
    }
}
