//! Deduplication of matches coming from several sources.
//!
//! Records are keyed by [`MatchId`]. A later insertion replaces the earlier
//! record but keeps its slot in the output order and every tag already
//! attached to that id, so "local first, feed second" means the feed's view
//! of a match wins while the local tags survive.

use std::collections::HashMap;

use super::models::{Match, MatchId, SourceTag};

/// Insertion-ordered set of matches keyed by id.
#[derive(Debug, Default)]
pub struct MatchSet {
    order: Vec<Match>,
    index: HashMap<MatchId, usize>,
}

impl MatchSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace by id (last write wins).
    pub fn insert(&mut self, mut m: Match) {
        match self.index.get(&m.id) {
            Some(&slot) => {
                let previous = &self.order[slot];
                for tag in &previous.tags {
                    m.add_tag(*tag);
                }
                self.order[slot] = m;
            }
            None => {
                self.index.insert(m.id.clone(), self.order.len());
                self.order.push(m);
            }
        }
    }

    /// Insert or replace, then attach `tag`.
    pub fn insert_tagged(&mut self, mut m: Match, tag: SourceTag) {
        m.add_tag(tag);
        self.insert(m);
    }

    pub fn extend<I: IntoIterator<Item = Match>>(&mut self, matches: I) {
        for m in matches {
            self.insert(m);
        }
    }

    pub fn into_vec(self) -> Vec<Match> {
        self.order
    }
}

/// Merge local and feed records; feed records win on duplicate ids.
pub fn merge_sources(local: Vec<Match>, external: Vec<Match>) -> Vec<Match> {
    let mut set = MatchSet::new();
    set.extend(local);
    set.extend(external);
    set.into_vec()
}
