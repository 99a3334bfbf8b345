use std::collections::BTreeMap;

/// Per-login counter. A login is present only once its count is positive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CountMap {
    counts: BTreeMap<String, u64>,
}

impl CountMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&mut self, login: &str) {
        self.add(login, 1);
    }

    pub fn add(&mut self, login: &str, count: u64) {
        if count == 0 {
            return;
        }
        *self.counts.entry(login.to_string()).or_insert(0) += count;
    }

    /// Count for `login`, 0 when absent.
    pub fn get(&self, login: &str) -> u64 {
        self.counts.get(login).copied().unwrap_or(0)
    }

    /// Sum of all counts.
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Logins in ascending order.
    pub fn logins(&self) -> impl Iterator<Item = &str> {
        self.counts.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.counts.iter().map(|(login, count)| (login.as_str(), *count))
    }

    /// Add every count of `other` into `self`.
    pub fn merge(&mut self, other: &CountMap) {
        for (login, count) in other.iter() {
            self.add(login, count);
        }
    }

    /// Sum any number of maps into one. Order of the inputs does not matter.
    pub fn reduce<'a>(maps: impl IntoIterator<Item = &'a CountMap>) -> CountMap {
        maps.into_iter().fold(CountMap::new(), |mut acc, map| {
            acc.merge(map);
            acc
        })
    }
}

impl<S: AsRef<str>> FromIterator<S> for CountMap {
    /// One increment per yielded login.
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut map = CountMap::new();
        for login in iter {
            map.increment(login.as_ref());
        }
        map
    }
}
