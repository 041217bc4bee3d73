//! Infinite-scroll trigger
//!
//! Watches a sentinel (the last rendered article) and asks a [`LoadMoreHandler`] for
//! the next page when the sentinel scrolls into view. The presentation layer owns
//! the trigger, reports geometry through [`ScrollTrigger::observe`] and rebinds it
//! whenever the rendered list or the loading flag changes.
//!
//! A trigger fires at most once per visibility transition: the sentinel has to
//! leave the (margin-expanded) viewport, or be replaced by a new sentinel, before it
//! can fire again.

use crate::config::ScrollConfig;
use crate::pagination::ControllerState;
use crate::types::LoadMoreHandler;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, trace};

/// Vertical extent of an element or viewport, in pixels
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    /// Distance from the top of the document
    pub top: f64,
    /// Height
    pub height: f64,
}

impl Rect {
    /// Create a rect
    pub fn new(top: f64, height: f64) -> Self {
        Self { top, height }
    }

    /// Bottom edge
    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }
}

/// Fraction of `target` inside `viewport` grown by `root_margin` on both edges
pub fn intersection_ratio(target: Rect, viewport: Rect, root_margin: f64) -> f64 {
    let root_top = viewport.top - root_margin;
    let root_bottom = viewport.bottom() + root_margin;

    if target.height <= 0.0 {
        return if (root_top..=root_bottom).contains(&target.top) {
            1.0
        } else {
            0.0
        };
    }

    let overlap = target.bottom().min(root_bottom) - target.top.max(root_top);
    (overlap.max(0.0) / target.height).min(1.0)
}

/// Identity of the observed sentinel
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SentinelKey(String);

impl SentinelKey {
    /// Key for the item at `index` with `link_url`
    pub fn new(index: usize, link_url: &str) -> Self {
        Self(format!("{index}:{link_url}"))
    }

    /// Key for the last rendered item of `state`, if any
    pub fn last_of(state: &ControllerState) -> Option<Self> {
        let index = state.accumulated_items.len().checked_sub(1)?;
        Some(Self::new(index, &state.accumulated_items[index].link_url))
    }
}

#[derive(Debug)]
struct Binding {
    sentinel: SentinelKey,
    has_more: bool,
    loading: bool,
    visible: bool,
}

/// Sentinel observer that requests the next page
pub struct ScrollTrigger {
    config: ScrollConfig,
    handler: Option<Arc<dyn LoadMoreHandler>>,
    binding: Option<Binding>,
    last_fired: Option<Instant>,
}

impl ScrollTrigger {
    /// Create a trigger; without a handler it observes but never fires
    pub fn new(config: ScrollConfig, handler: Option<Arc<dyn LoadMoreHandler>>) -> Self {
        Self {
            config,
            handler,
            binding: None,
            last_fired: None,
        }
    }

    /// Observe `sentinel` with the given list flags
    ///
    /// The previous sentinel is always unobserved first. Rebinding to the same
    /// sentinel with unchanged flags keeps the current visibility so an already
    /// visible sentinel does not fire twice. Nothing is observed while loading.
    pub fn rebind(&mut self, sentinel: Option<SentinelKey>, has_more: bool, loading: bool) {
        if let (Some(current), Some(next)) = (&self.binding, &sentinel)
            && current.sentinel == *next
            && current.has_more == has_more
            && current.loading == loading
        {
            return;
        }

        self.unobserve();

        let Some(sentinel) = sentinel else {
            return;
        };
        if loading {
            trace!(sentinel = ?sentinel, "loading; sentinel not observed");
            return;
        }

        trace!(sentinel = ?sentinel, has_more, "observing sentinel");
        self.binding = Some(Binding {
            sentinel,
            has_more,
            loading,
            visible: false,
        });
    }

    /// Rebind from a controller snapshot
    pub fn sync(&mut self, state: &ControllerState) {
        self.rebind(SentinelKey::last_of(state), state.has_more, state.is_loading);
    }

    /// Stop observing
    pub fn unobserve(&mut self) {
        if let Some(previous) = self.binding.take() {
            trace!(sentinel = ?previous.sentinel, "sentinel unobserved");
        }
    }

    /// Currently observed sentinel
    pub fn sentinel(&self) -> Option<&SentinelKey> {
        self.binding.as_ref().map(|b| &b.sentinel)
    }

    /// Report the sentinel's position; returns true if the next page was requested
    ///
    /// A transition that lands inside the cooldown stays pending and fires on the
    /// first observation after the cooldown that still sees the sentinel.
    pub fn observe(&mut self, sentinel: Rect, viewport: Rect, now: Instant) -> bool {
        let Some(binding) = self.binding.as_mut() else {
            return false;
        };

        let ratio = intersection_ratio(sentinel, viewport, self.config.root_margin_px);
        let visible = ratio > 0.0 && ratio >= self.config.threshold;
        let was_visible = binding.visible;
        binding.visible = visible;

        if !visible || was_visible || !binding.has_more || binding.loading {
            return false;
        }

        let Some(handler) = self.handler.as_ref() else {
            return false;
        };

        if let Some(last) = self.last_fired
            && now.saturating_duration_since(last) < self.config.cooldown()
        {
            trace!("load more suppressed by cooldown");
            binding.visible = false;
            return false;
        }

        debug!(sentinel = ?binding.sentinel, ratio, "sentinel visible; requesting next page");
        binding.loading = true;
        self.last_fired = Some(now);
        handler.request_next_page();
        true
    }
}
