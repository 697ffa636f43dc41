//! Market registry: identifier lookup and replacement chains.
//!
//! Markets live in an arena indexed by [`MarketId`]. Replacement links are
//! ids into the same arena, so a chain is walked by index with a hop limit
//! rather than by pointer.

use std::collections::HashMap;

use tracing::debug;

use crate::error::CalendarError;
use crate::types::{Market, MarketId};

/// Longest replacement chain a snapshot may contain.
pub const MAX_REPLACEMENT_HOPS: usize = 16;

/// Outcome of resolving an identifier.
#[derive(Clone, Copy, Debug)]
pub struct Resolved<'a> {
    /// Market whose calendar should be used.
    pub market: &'a Market,
    /// Market the identifier named before following replacements.
    pub requested: &'a Market,
}

impl Resolved<'_> {
    pub fn was_replaced(&self) -> bool {
        self.market.id != self.requested.id
    }
}

#[derive(Clone, Debug, Default)]
pub struct MarketRegistry {
    markets: Vec<Market>,
    by_fin_id: HashMap<String, MarketId>,
    by_mic: HashMap<String, MarketId>,
}

impl MarketRegistry {
    pub(crate) fn from_parts(
        markets: Vec<Market>,
        by_fin_id: HashMap<String, MarketId>,
        by_mic: HashMap<String, MarketId>,
    ) -> Self {
        Self {
            markets,
            by_fin_id,
            by_mic,
        }
    }

    /// Ids are only minted by the snapshot that owns this registry.
    pub fn get(&self, id: MarketId) -> &Market {
        &self.markets[id.0]
    }

    pub fn len(&self) -> usize {
        self.markets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Market> {
        self.markets.iter()
    }

    /// Exact, case-sensitive match: FinID first, then MIC.
    pub fn lookup(&self, identifier: &str) -> Option<MarketId> {
        self.by_fin_id
            .get(identifier)
            .or_else(|| self.by_mic.get(identifier))
            .copied()
    }

    pub fn resolve(&self, identifier: &str, follow: bool) -> Result<Resolved<'_>, CalendarError> {
        let id = self
            .lookup(identifier)
            .ok_or_else(|| CalendarError::market_not_found(identifier))?;
        let requested = self.get(id);
        let market = if follow {
            self.get(self.chain_end(id)?)
        } else {
            requested
        };
        if market.id != requested.id {
            debug!(
                identifier,
                from = %requested.fin_id,
                to = %market.fin_id,
                "followed replacement chain"
            );
        }
        Ok(Resolved { market, requested })
    }

    /// Last market of the replacement chain starting at `id`.
    pub fn chain_end(&self, id: MarketId) -> Result<MarketId, CalendarError> {
        let mut current = id;
        for _ in 0..=MAX_REPLACEMENT_HOPS {
            match self.get(current).replaced_by {
                Some(next) => current = next,
                None => return Ok(current),
            }
        }
        Err(CalendarError::integrity(format!(
            "replacement chain from {} exceeds {MAX_REPLACEMENT_HOPS} hops",
            self.get(id).fin_id
        )))
    }

    /// Markets whose FinID matches a `*` glob (ASCII case-insensitive),
    /// ordered by FinID. `None` lists everything.
    pub fn list(&self, pattern: Option<&str>) -> Vec<&Market> {
        let pattern = pattern.map(str::to_ascii_uppercase);
        let mut out: Vec<&Market> = self
            .markets
            .iter()
            .filter(|m| match &pattern {
                Some(p) => glob_match(p, &m.fin_id.to_ascii_uppercase()),
                None => true,
            })
            .collect();
        out.sort_by(|a, b| a.fin_id.cmp(&b.fin_id));
        out
    }
}

/// `*` matches any run of characters, including none.
pub(crate) fn glob_match(pattern: &str, text: &str) -> bool {
    let parts: Vec<&str> = pattern.split('*').collect();
    if parts.len() == 1 {
        return pattern == text;
    }
    let (first, rest) = (parts[0], &parts[1..]);
    let Some(mut remaining) = text.strip_prefix(first) else {
        return false;
    };
    let last = rest[rest.len() - 1];
    for mid in &rest[..rest.len() - 1] {
        match remaining.find(mid) {
            Some(pos) => remaining = &remaining[pos + mid.len()..],
            None => return false,
        }
    }
    remaining.len() >= last.len() && remaining.ends_with(last)
}
