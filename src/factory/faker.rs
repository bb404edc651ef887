//! Fake-value source handed to factory definitions.
//!
//! Wraps a seedable RNG behind a cheaply clonable handle and exposes the
//! generators definitions reach for most: names, emails, lorem text,
//! numbers, ids, timestamps. Anything else goes through [`Faker::fake`]
//! with a selector from the `fake` crate.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use fake::Fake;
use fake::faker::boolean::en::Boolean;
use fake::faker::internet::en::{FreeEmail, Username};
use fake::faker::lorem::en::{Sentence, Word};
use fake::faker::name::en::Name;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use uuid::Uuid;

static SEQUENCES: Lazy<Mutex<HashMap<String, u64>>> = Lazy::new(|| Mutex::new(HashMap::new()));

/// Source of fake values for factory definitions.
///
/// Clones share the underlying random stream. For reproducible runs,
/// seed one with [`Faker::seeded`] and install it via
/// [`Builder::with_faker`](crate::factory::builder::Builder::with_faker).
#[derive(Clone)]
pub struct Faker {
	rng: Arc<Mutex<StdRng>>,
}

impl Faker {
	/// Creates a faker seeded from system entropy.
	pub fn new() -> Self {
		Self {
			rng: Arc::new(Mutex::new(StdRng::from_entropy())),
		}
	}

	/// Creates a faker with a fixed seed.
	pub fn seeded(seed: u64) -> Self {
		Self {
			rng: Arc::new(Mutex::new(StdRng::seed_from_u64(seed))),
		}
	}

	/// Draws a value from any `fake` crate selector.
	///
	/// ```ignore
	/// let city: String = faker.fake(fake::faker::address::en::CityName());
	/// ```
	pub fn fake<U, S>(&self, selector: S) -> U
	where
		S: Fake,
		U: fake::Dummy<S>,
	{
		selector.fake_with_rng(&mut *self.rng.lock())
	}

	/// A person's full name.
	pub fn name(&self) -> String {
		self.fake(Name())
	}

	/// A plausible login handle.
	pub fn username(&self) -> String {
		self.fake(Username())
	}

	/// A free-provider email address.
	pub fn email(&self) -> String {
		self.fake(FreeEmail())
	}

	/// A single lorem word.
	pub fn word(&self) -> String {
		self.fake(Word())
	}

	/// A short lorem sentence.
	pub fn sentence(&self) -> String {
		self.fake(Sentence(3..8))
	}

	/// A coin flip.
	pub fn boolean(&self) -> bool {
		self.fake(Boolean(50))
	}

	/// An integer drawn uniformly from `lo..=hi`.
	pub fn number_between(&self, lo: i64, hi: i64) -> i64 {
		self.rng.lock().gen_range(lo..=hi)
	}

	/// A string of `len` random decimal digits.
	pub fn digits(&self, len: usize) -> String {
		let mut rng = self.rng.lock();
		(0..len)
			.map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
			.collect()
	}

	/// A random v4-style UUID drawn from this faker's stream.
	pub fn uuid(&self) -> Uuid {
		let mut rng = self.rng.lock();
		let high = rng.next_u64() as u128;
		let low = rng.next_u64() as u128;
		Uuid::from_u128((high << 64) | low)
	}

	/// A timestamp up to `within_days` days in the past.
	pub fn past_datetime(&self, within_days: i64) -> DateTime<Utc> {
		let mut rng = self.rng.lock();
		let days = rng.gen_range(0..=within_days.max(0));
		let seconds = rng.gen_range(0..86_400);
		Utc::now() - Duration::days(days) - Duration::seconds(seconds)
	}
}

impl Default for Faker {
	fn default() -> Self {
		Self::new()
	}
}

impl fmt::Debug for Faker {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Faker").finish_non_exhaustive()
	}
}

/// Increments and returns the process-wide counter for `key`.
///
/// Counters start at 1 and are shared across all fakers and builders, so
/// values stay unique for the lifetime of the process.
pub fn next_sequence(key: &str) -> u64 {
	let mut sequences = SEQUENCES.lock();
	let counter = sequences.entry(key.to_string()).or_insert(0);
	*counter += 1;
	*counter
}

/// Renders `pattern` with the next counter value for `key`.
///
/// Every `{n}` placeholder is replaced by the same drawn value.
///
/// ```ignore
/// assert_eq!(faker::sequence("sku", "SKU-{n}"), "SKU-1");
/// assert_eq!(faker::sequence("sku", "SKU-{n}"), "SKU-2");
/// ```
pub fn sequence(key: &str, pattern: &str) -> String {
	pattern.replace("{n}", &next_sequence(key).to_string())
}

/// Clears all sequence counters.
///
/// Intended for test isolation; subsequent draws start back at 1.
pub fn reset_sequences() {
	SEQUENCES.lock().clear();
}
