use crate::games::mr_white::generator::{GenerateError, WordGenerator};
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

pub const WORD_PROMPT: &str = "Give one random word naming a place or concept for a social \
deduction game like Spyfall. It must be a common noun most people know. Reply with the word \
only. Examples: Airport, Hospital, Restaurant, Wedding, University, Casino.";

/// Used whenever the generator cannot deliver.
pub const FALLBACK_WORDS: [&str; 32] = [
    "Airport", "Beach", "Casino", "School", "Hospital", "Library",
    "Restaurant", "Zoo", "Bank", "Movie Theater", "Coffee Shop",
    "Gym", "Supermarket", "Museum", "Concert", "Park", "Hotel",
    "Farm", "Office", "Prison", "Wedding", "Circus", "Submarine",
    "Spaceship", "Train Station", "Police Station", "University",
    "Bakery", "Factory", "Nightclub", "Cruise Ship", "Art Gallery",
];

/// A finished game tops the queue up while it holds fewer words than this.
pub const TOP_UP_THRESHOLD: usize = 3;

/// Most words a single `prefetch` or `fallback` may queue.
pub const MAX_BATCH: usize = 50;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const TRAILING_PUNCTUATION: [char; 6] = ['.', ',', '!', '?', ';', ':'];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WordOrigin {
    Queue,
    Generated,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuppliedWord {
    pub word: String,
    pub origin: WordOrigin,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PrefetchReport {
    pub generated: usize,
    pub fallback: usize,
}

impl PrefetchReport {
    pub fn total(&self) -> usize {
        self.generated + self.fallback
    }
}

/// First whitespace-separated token of a generator reply, minus trailing punctuation.
///
/// `None` when nothing usable is left, i.e. the token has no letters at all.
pub fn sanitize(raw: &str) -> Option<String> {
    let token = raw.split_whitespace().next()?;
    let word = token.trim_end_matches(TRAILING_PUNCTUATION);
    if !word.chars().any(char::is_alphabetic) {
        return None;
    }
    Some(word.to_string())
}

/// Everything needed to ask the generator for one word.
///
/// Cheap to clone, so a copy can be moved into a background task while the
/// supplier itself stays with the game.
#[derive(Clone)]
pub struct WordSource {
    generator: Arc<dyn WordGenerator>,
    credential: Option<String>,
    timeout: Duration,
}

impl WordSource {
    pub fn new(generator: Arc<dyn WordGenerator>, credential: Option<String>, timeout: Duration) -> Self {
        Self {
            generator,
            credential: credential.filter(|c| !c.trim().is_empty()),
            timeout,
        }
    }

    pub fn credential(&self) -> Option<&str> {
        self.credential.as_deref()
    }

    /// One generator call, bounded by the timeout, with the reply sanitized.
    pub async fn fetch(&self) -> Result<String, GenerateError> {
        let credential = self.credential.as_deref().ok_or(GenerateError::MissingCredential)?;
        let raw = tokio::time::timeout(self.timeout, self.generator.generate(WORD_PROMPT, credential))
            .await
            .map_err(|_| GenerateError::Timeout(self.timeout))??;
        sanitize(&raw).ok_or(GenerateError::Malformed(raw))
    }
}

/// Hands out secret words: queued ones first, then fresh ones, then the fallback pool.
///
/// Never fails. The queue outlives individual games and is only cleared when the
/// credential changes.
pub struct WordSupplier {
    source: WordSource,
    queue: VecDeque<String>,
    rng: StdRng,
    /// Bumped on every credential change; fetches started before it are stale.
    generation: u64,
}

impl WordSupplier {
    pub fn new(source: WordSource, rng: StdRng) -> Self {
        Self { source, queue: VecDeque::new(), rng, generation: 0 }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn source(&self) -> &WordSource {
        &self.source
    }

    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    pub fn needs_top_up(&self) -> bool {
        self.queue.len() < TOP_UP_THRESHOLD
    }

    /// Swap the credential. A different credential empties the queue.
    pub fn set_credential(&mut self, credential: Option<String>) -> bool {
        let credential = credential.filter(|c| !c.trim().is_empty());
        if credential == self.source.credential {
            return false;
        }
        self.source.credential = credential;
        self.queue.clear();
        self.generation += 1;
        debug!("credential changed, word queue cleared");
        true
    }

    pub async fn supply_word(&mut self) -> SuppliedWord {
        if let Some(word) = self.queue.pop_front() {
            debug!(left = self.queue.len(), "using queued word");
            return SuppliedWord { word, origin: WordOrigin::Queue };
        }
        let fetched = self.source.fetch().await;
        self.resolve(fetched)
    }

    /// Queue `count` more words, at most [`MAX_BATCH`]. Each failed fetch becomes a fallback word.
    pub async fn prefetch(&mut self, count: usize) -> PrefetchReport {
        let mut report = PrefetchReport::default();
        for _ in 0..count.min(MAX_BATCH) {
            let fetched = self.source.fetch().await;
            match self.accept(fetched) {
                WordOrigin::Generated => report.generated += 1,
                _ => report.fallback += 1,
            }
        }
        report
    }

    /// Queue the result of a fetch done elsewhere, e.g. in a background task.
    pub fn accept(&mut self, fetched: Result<String, GenerateError>) -> WordOrigin {
        let supplied = self.resolve(fetched);
        self.queue.push_back(supplied.word);
        supplied.origin
    }

    /// Like [`WordSupplier::accept`], for a fetch started at `generation`.
    ///
    /// Results from before the last credential change are dropped and `None` is returned.
    pub fn accept_from(&mut self, generation: u64, fetched: Result<String, GenerateError>) -> Option<WordOrigin> {
        if generation != self.generation {
            debug!(generation, current = self.generation, "dropping word fetched with an old credential");
            return None;
        }
        Some(self.accept(fetched))
    }

    /// Queue `count` words straight from the fallback pool, at most [`MAX_BATCH`].
    pub fn add_fallback_words(&mut self, count: usize) {
        for _ in 0..count.min(MAX_BATCH) {
            let word = self.fallback_word();
            self.queue.push_back(word);
        }
    }

    pub fn fallback_word(&mut self) -> String {
        FALLBACK_WORDS
            .choose(&mut self.rng)
            .map_or("Restaurant", |w| *w)
            .to_string()
    }

    fn resolve(&mut self, fetched: Result<String, GenerateError>) -> SuppliedWord {
        match fetched {
            Ok(word) => SuppliedWord { word, origin: WordOrigin::Generated },
            Err(e) => {
                warn!(error = %e, "word generation failed, using fallback word");
                SuppliedWord { word: self.fallback_word(), origin: WordOrigin::Fallback }
            }
        }
    }
}
