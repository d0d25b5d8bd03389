//! Secret Oracle
//!
//! A deliberately leaky test fixture. The script guesses a secret, the oracle
//! says whether the guess was right, discloses the old secret in the log and
//! draws a new one. A script that can read the secret through the register
//! machine will win every round; one that cannot will almost never win.
//!
//! # Lifecycle
//! `new (draw) → check (compare, disclose, redraw)*`
//!
//! The oracle is independent of every register file and is not addressable
//! through capabilities. Compartments hold it through a `SharedOracle`.

use alloc::sync::Arc;

use log::info;
use rand::rngs::SmallRng;
use rand::{RngCore, SeedableRng};
use spin::Mutex;

use super::secret::Secret;

/// Oracle handle shared by every compartment of a process.
pub type SharedOracle = Arc<Mutex<SecretOracle>>;

/// The secret and the generator that replaces it.
#[derive(Debug)]
pub struct SecretOracle {
    secret: Secret<i32>,
    rng: SmallRng,
    rounds: u64,
}

impl SecretOracle {
    /// Create an oracle and draw the first secret.
    ///
    /// The host supplies the seed; a fixed seed gives a reproducible sequence.
    pub fn new(seed: u64) -> Self {
        let mut rng = SmallRng::seed_from_u64(seed);
        let secret = Secret::new(rng.next_u32() as i32);
        info!("secret oracle initialised");
        Self {
            secret,
            rng,
            rounds: 0,
        }
    }

    /// Create an oracle behind a shareable lock.
    pub fn shared(seed: u64) -> SharedOracle {
        Arc::new(Mutex::new(Self::new(seed)))
    }

    /// Compare `guess`, disclose the old secret, and draw a new one.
    ///
    /// The new secret does not depend on `guess` or on the outcome.
    pub fn check(&mut self, guess: i32) -> bool {
        let matched = guess == self.secret.expose();
        let fresh = self.rng.next_u32() as i32;
        let previous = self.secret.replace(fresh);
        self.rounds += 1;

        info!("the secret was {}", previous);
        if matched {
            info!("guessed correctly in round {}", self.rounds);
        } else {
            info!("guess {} was wrong in round {}", guess, self.rounds);
        }
        matched
    }

    /// Number of completed `check` calls.
    #[inline]
    pub fn rounds(&self) -> u64 {
        self.rounds
    }

    /// The current secret. Host-side only; scripts never reach this.
    #[inline]
    pub fn reveal(&self) -> i32 {
        self.secret.expose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::{String, ToString};
    use alloc::vec::Vec;
    use core::cell::RefCell;

    std::thread_local! {
        static LINES: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
    }

    /// Records messages per test thread so parallel tests stay apart.
    struct Recorder;

    impl log::Log for Recorder {
        fn enabled(&self, _: &log::Metadata<'_>) -> bool {
            true
        }

        fn log(&self, record: &log::Record<'_>) {
            LINES.with(|lines| lines.borrow_mut().push(record.args().to_string()));
        }

        fn flush(&self) {}
    }

    static RECORDER: Recorder = Recorder;

    fn record() {
        // Only the first test to get here installs it.
        let _ = log::set_logger(&RECORDER);
        log::set_max_level(log::LevelFilter::Trace);
        LINES.with(|lines| lines.borrow_mut().clear());
    }

    fn recorded() -> Vec<String> {
        LINES.with(|lines| lines.borrow().clone())
    }

    #[test]
    fn test_secret_changes_after_every_check() {
        let mut oracle = SecretOracle::new(0x5EC2_E7);
        for _ in 0..64 {
            let before = oracle.reveal();
            oracle.check(0);
            assert_ne!(oracle.reveal(), before);
        }
        assert_eq!(oracle.rounds(), 64);
    }

    #[test]
    fn test_correct_guess_does_not_repeat() {
        let mut oracle = SecretOracle::new(42);
        let guess = oracle.reveal();
        assert!(oracle.check(guess));
        assert!(!oracle.check(guess));
    }

    #[test]
    fn test_wrong_guess_still_rotates() {
        let mut oracle = SecretOracle::new(7);
        let secret = oracle.reveal();
        assert!(!oracle.check(secret.wrapping_add(1)));
        assert_ne!(oracle.reveal(), secret);
    }

    #[test]
    fn test_check_discloses_previous_secret() {
        record();
        let mut oracle = SecretOracle::new(0xD15C_105E);

        let first = oracle.reveal();
        oracle.check(first.wrapping_sub(1));
        let second = oracle.reveal();
        oracle.check(second);

        let lines = recorded();
        let disclosures: Vec<&str> = lines
            .iter()
            .map(String::as_str)
            .filter(|line| line.starts_with("the secret was "))
            .collect();
        assert_eq!(
            disclosures,
            [
                std::format!("the secret was {}", first),
                std::format!("the secret was {}", second),
            ]
        );
        assert!(lines.iter().any(|line| line.contains("guessed correctly")));
    }

    #[test]
    fn test_seeded_sequence_is_reproducible() {
        let mut a = SecretOracle::new(1234);
        let mut b = SecretOracle::new(1234);
        for guess in [0, 1, -1, i32::MAX] {
            assert_eq!(a.reveal(), b.reveal());
            assert_eq!(a.check(guess), b.check(guess));
        }
    }

    #[test]
    fn test_shared_handle() {
        let oracle = SecretOracle::shared(9);
        let other = Arc::clone(&oracle);
        let secret = oracle.lock().reveal();
        assert!(other.lock().check(secret));
        assert_eq!(oracle.lock().rounds(), 1);
    }
}
