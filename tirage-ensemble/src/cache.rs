use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::frequency::FrequencyProfile;

/// Cache de profils de fréquence, détenu par l'appelant et partagé entre requêtes.
pub struct FrequencyCache {
    ttl: Duration,
    entries: Mutex<HashMap<(String, usize), (Instant, FrequencyProfile)>>,
}

impl FrequencyCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn get(&self, game_id: &str, window_size: usize) -> Option<FrequencyProfile> {
        let mut entries = self.entries.lock();
        let key = (game_id.to_string(), window_size);
        if let Some((stored, profile)) = entries.get(&key) {
            if stored.elapsed() < self.ttl {
                return Some(profile.clone());
            }
            entries.remove(&key);
        }
        None
    }

    pub fn insert(&self, game_id: &str, window_size: usize, profile: FrequencyProfile) {
        self.entries
            .lock()
            .insert((game_id.to_string(), window_size), (Instant::now(), profile));
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
