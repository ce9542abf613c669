//! Unbounded search for the last `true` index of a monotonic predicate
//! over pages: grow an upper bound by doubling, then bisect the bracket.

use async_trait::async_trait;
use tracing::{debug, warn};

/// Answer for one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Probe {
    Events,
    Empty,
    /// The page could not be fetched.
    Failed,
}

/// A predicate over 1-based page indices, assumed true for a prefix of
/// pages and false afterwards.
#[async_trait]
pub trait PageOracle: Send + Sync {
    async fn probe(&self, page: u32) -> Probe;
}

/// Search state: `last_valid` is the best page known to have events
/// (0 when none is known yet).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bracket {
    pub left: u32,
    pub right: u32,
    pub last_valid: u32,
}

impl Bracket {
    pub fn new(left: u32, right: u32, last_valid: u32) -> Self {
        Self {
            left,
            right,
            last_valid,
        }
    }
}

/// Double `right` while it still has events. A failed probe ends the
/// growth without counting as a valid page.
pub async fn expand_upper_bound<O>(oracle: &O, mut bracket: Bracket) -> Bracket
where
    O: PageOracle + ?Sized,
{
    loop {
        match oracle.probe(bracket.right).await {
            Probe::Events => {
                bracket.last_valid = bracket.right;
                bracket.left = bracket.right;
                if bracket.right == u32::MAX {
                    break;
                }
                bracket.right = bracket.right.saturating_mul(2);
                debug!("Page {} has events, doubling to {}", bracket.left, bracket.right);
            }
            Probe::Empty => break,
            Probe::Failed => {
                warn!("Probe of page {} failed, stopping upper-bound growth", bracket.right);
                break;
            }
        }
    }
    bracket
}

/// Bisect `[left, right]` and return the last page with events. Failed
/// probes count as past the end.
pub async fn bisect<O>(oracle: &O, bracket: Bracket) -> u32
where
    O: PageOracle + ?Sized,
{
    let Bracket {
        mut left,
        mut right,
        mut last_valid,
    } = bracket;

    while left <= right {
        let mid = left + (right - left) / 2;
        match oracle.probe(mid).await {
            Probe::Events => {
                last_valid = mid;
                match mid.checked_add(1) {
                    Some(next) => left = next,
                    None => break,
                }
            }
            Probe::Empty | Probe::Failed => match mid.checked_sub(1) {
                Some(prev) => right = prev,
                None => break,
            },
        }
    }
    last_valid
}

pub async fn last_true_page<O>(oracle: &O, bracket: Bracket) -> u32
where
    O: PageOracle + ?Sized,
{
    let bracket = expand_upper_bound(oracle, bracket).await;
    bisect(oracle, bracket).await
}
