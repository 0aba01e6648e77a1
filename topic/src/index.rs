//! Subscription index for MQTT topic routing.
//!
//! A trie keyed by topic levels. Each node holds its children (literal levels
//! plus optional `+` and `#` children) and the subscribers registered exactly
//! at that node. A lookup touches at most two children per level plus the `#`
//! leaves met on the way, independent of the number of subscriptions.
//!
//! The index is shared by every connection of a broker: lookups take the read
//! lock, `insert`/`remove` hold the write lock for the whole mutation.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::hash::Hash;
use std::str::Split;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use tracing::{debug, trace};

use crate::error::{InvalidTopic, Result};
use crate::validate::TopicRules;

/// `+` and `#` children are stored in `children` under their own level text.
/// A valid topic name never contains either, so a literal lookup cannot hit
/// them, and every node is created through the same fallible reservation.
const MATCH_ANY: &str = "+";
const MATCH_ALL: &str = "#";

/// One level of the subscription trie.
struct TrieNode<S> {
    children: HashMap<String, TrieNode<S>>,
    subscribers: Vec<S>,
}

impl<S> Default for TrieNode<S> {
    fn default() -> Self {
        Self {
            children: HashMap::new(),
            subscribers: Vec::new(),
        }
    }
}

impl<S: PartialEq> TrieNode<S> {
    /// Attach `subscriber` below the given filter levels.
    ///
    /// Nodes created for a failed insert are pruned before returning, so an
    /// error leaves the tree as it was.
    fn insert(&mut self, mut levels: Split<'_, char>, subscriber: S) -> Result<bool> {
        let Some(level) = levels.next() else {
            if self.subscribers.contains(&subscriber) {
                return Ok(false);
            }
            self.subscribers.try_reserve(1)?;
            self.subscribers.push(subscriber);
            return Ok(true);
        };

        let child = match self.children.get_mut(level) {
            Some(child) => child,
            None => {
                self.children.try_reserve(1)?;
                let mut key = String::new();
                key.try_reserve_exact(level.len())?;
                key.push_str(level);
                self.children.entry(key).or_default()
            }
        };

        let result = child.insert(levels, subscriber);
        if result.is_err() {
            self.prune(level);
        }
        result
    }

    fn remove(&mut self, mut levels: Split<'_, char>, subscriber: &S) -> bool {
        let Some(level) = levels.next() else {
            let before = self.subscribers.len();
            self.subscribers.retain(|s| s != subscriber);
            return self.subscribers.len() < before;
        };

        let removed = self
            .children
            .get_mut(level)
            .is_some_and(|child| child.remove(levels, subscriber));
        if removed {
            self.prune(level);
        }
        removed
    }

    /// Remove `subscriber` from every node, returning how many filters it held.
    fn remove_all(&mut self, subscriber: &S) -> usize {
        let before = self.subscribers.len();
        self.subscribers.retain(|s| s != subscriber);
        let mut removed = before - self.subscribers.len();

        self.children.retain(|_, child| {
            removed += child.remove_all(subscriber);
            !child.is_empty()
        });
        removed
    }
}

impl<S> TrieNode<S> {
    fn is_empty(&self) -> bool {
        self.subscribers.is_empty() && self.children.is_empty()
    }

    fn match_any(&self) -> Option<&TrieNode<S>> {
        self.children.get(MATCH_ANY)
    }

    fn match_all(&self) -> Option<&TrieNode<S>> {
        self.children.get(MATCH_ALL)
    }

    /// Drop the child for `level` if nothing is left below it.
    fn prune(&mut self, level: &str) {
        if self.children.get(level).is_some_and(TrieNode::is_empty) {
            self.children.remove(level);
        }
    }

    /// Visit every subscriber whose filter matches the remaining topic levels.
    ///
    /// `at_root` blocks `+` and `#` for a first level starting with `$`.
    fn collect<'a, F>(&'a self, mut levels: Split<'_, char>, at_root: bool, f: &mut F)
    where
        F: FnMut(&'a S),
    {
        let Some(level) = levels.next() else {
            self.subscribers.iter().for_each(&mut *f);
            // `#` also matches zero levels below its parent.
            if let Some(match_all) = self.match_all() {
                match_all.subscribers.iter().for_each(&mut *f);
            }
            return;
        };

        let wildcards = !(at_root && level.starts_with('$'));

        if wildcards {
            if let Some(match_all) = self.match_all() {
                match_all.subscribers.iter().for_each(&mut *f);
            }
        }
        if let Some(child) = self.children.get(level) {
            child.collect(levels.clone(), false, f);
        }
        if wildcards {
            if let Some(match_any) = self.match_any() {
                match_any.collect(levels, false, f);
            }
        }
    }

    /// Walk all nodes with subscribers: literals in sorted order, then `+`,
    /// then `#`.
    fn walk<F>(&self, path: &mut Vec<String>, f: &mut F)
    where
        F: FnMut(&str, &[S]),
    {
        if !self.subscribers.is_empty() {
            f(&path.join("/"), &self.subscribers);
        }

        let mut keys: Vec<_> = self
            .children
            .keys()
            .filter(|k| *k != MATCH_ANY && *k != MATCH_ALL)
            .collect();
        keys.sort();
        for key in keys {
            path.push(key.clone());
            self.children[key].walk(path, f);
            path.pop();
        }
        for (key, child) in [(MATCH_ANY, self.match_any()), (MATCH_ALL, self.match_all())] {
            if let Some(child) = child {
                path.push(key.to_string());
                child.walk(path, f);
                path.pop();
            }
        }
    }
}

/// Thread-safe subscription index.
///
/// `S` is the broker's subscriber handle (client id, session key, channel
/// handle, ...). Two handles are the same subscriber when they compare equal.
///
/// Registering the same (filter, subscriber) pair twice keeps a single entry,
/// and one [`remove`](Self::remove) drops it completely.
pub struct SubscriptionIndex<S> {
    root: RwLock<TrieNode<S>>,
    rules: TopicRules,
    generation: AtomicU64,
}

impl<S> Default for SubscriptionIndex<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> SubscriptionIndex<S> {
    /// Create an empty index using the default topic rules.
    pub fn new() -> Self {
        Self::with_rules(TopicRules::default())
    }

    /// Create an empty index that validates filters with `rules`.
    pub fn with_rules(rules: TopicRules) -> Self {
        Self {
            root: RwLock::new(TrieNode::default()),
            rules,
            generation: AtomicU64::new(0),
        }
    }

    /// Rules used to validate filters and topics.
    pub fn rules(&self) -> &TopicRules {
        &self.rules
    }

    /// Counter bumped by every insert or remove that changed the index.
    ///
    /// Callers caching `find_matches` results can compare generations to
    /// detect staleness.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Visit every subscriber whose filter matches `topic`.
    ///
    /// A subscriber registered under several matching filters is visited once
    /// per filter. The read lock is held while `f` runs.
    pub fn for_each_match<F>(&self, topic: &str, mut f: F) -> Result<()>
    where
        F: FnMut(&S),
    {
        check_topic(topic)?;
        let guard = self.root.read();
        guard.collect(topic.split('/'), true, &mut f);
        Ok(())
    }

    /// Registered filters in sorted order, one entry per filter.
    pub fn filters(&self) -> Vec<String> {
        let mut filters = Vec::new();
        self.root
            .read()
            .walk(&mut Vec::new(), &mut |filter, _| filters.push(filter.to_string()));
        filters
    }

    /// Number of registered (filter, subscriber) pairs.
    pub fn len(&self) -> usize {
        let mut count = 0;
        self.root
            .read()
            .walk(&mut Vec::new(), &mut |_, subscribers| count += subscribers.len());
        count
    }

    /// Returns true if no subscription is registered.
    pub fn is_empty(&self) -> bool {
        self.root.read().is_empty()
    }

    fn bump(&self) {
        self.generation.fetch_add(1, Ordering::Release);
    }
}

impl<S: PartialEq> SubscriptionIndex<S> {
    /// Register `subscriber` under `filter`.
    ///
    /// Returns `Ok(false)` if the pair was already registered. The filter
    /// must be a plain filter; strip a `$share/{group}/` prefix with
    /// [`parse_shared`] first.
    pub fn insert(&self, filter: &str, subscriber: S) -> Result<bool> {
        self.rules.validate_topic_filter(filter)?;

        let inserted = self.root.write().insert(filter.split('/'), subscriber)?;
        if inserted {
            self.bump();
            debug!("subscription added: {}", filter);
        } else {
            trace!("subscription already present: {}", filter);
        }
        Ok(inserted)
    }

    /// Unregister `subscriber` from `filter`.
    ///
    /// Returns true if the pair was registered. Nodes left without
    /// subscribers or children are dropped.
    pub fn remove(&self, filter: &str, subscriber: &S) -> bool {
        let removed = self.root.write().remove(filter.split('/'), subscriber);
        if removed {
            self.bump();
            debug!("subscription removed: {}", filter);
        }
        removed
    }

    /// Unregister `subscriber` from every filter (session teardown).
    ///
    /// Returns the number of filters it was registered under.
    pub fn remove_subscriber(&self, subscriber: &S) -> usize {
        let removed = self.root.write().remove_all(subscriber);
        if removed > 0 {
            self.bump();
            debug!("subscriber removed from {} filters", removed);
        }
        removed
    }
}

impl<S: Clone + Eq + Hash> SubscriptionIndex<S> {
    /// Subscribers with at least one filter matching `topic`.
    ///
    /// Fails for an empty topic or one containing a wildcard.
    pub fn find_matches(&self, topic: &str) -> Result<HashSet<S>> {
        let mut found = HashSet::new();
        self.for_each_match(topic, |s| {
            found.insert(s.clone());
        })?;
        trace!("topic {} matched {} subscribers", topic, found.len());
        Ok(found)
    }
}

impl<S> fmt::Debug for SubscriptionIndex<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionIndex")
            .field("filters", &self.filters())
            .field("generation", &self.generation())
            .finish()
    }
}

/// Lookups reject what the matcher rejects.
fn check_topic(topic: &str) -> Result<()> {
    if topic.is_empty() {
        return Err(InvalidTopic::Empty.into());
    }
    if let Some(offset) = topic.bytes().position(|b| b == b'+' || b == b'#') {
        return Err(InvalidTopic::WildcardInName { offset }.into());
    }
    Ok(())
}

/// Split a shared subscription `$share/{group}/{filter}` into group and filter.
///
/// Returns `None` for anything else, including an empty group or filter.
pub fn parse_shared(filter: &str) -> Option<(&str, &str)> {
    let rest = filter.strip_prefix("$share/")?;
    let (group, filter) = rest.split_once('/')?;
    if group.is_empty() || filter.is_empty() {
        return None;
    }
    Some((group, filter))
}
