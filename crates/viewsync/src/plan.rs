use catalog::LayerId;
use foundation::ViewportBounds;

use crate::key::FeatureRequestKey;

/// Tunables for viewport-driven fetching.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FetchPolicy {
    /// Below this zoom no request is issued (the bbox would be enormous).
    pub min_fetch_zoom: f64,
    /// Viewports larger than this many squared degrees are not fetched.
    pub max_area_deg2: f64,
    /// Page size attached to every request; a single bounded page is the
    /// working set, there is no pagination.
    pub page_limit: u32,
    /// Rapid viewport updates inside this window coalesce; only the most
    /// recent one is released when the window elapses.
    pub coalesce_window_ms: u64,
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self {
            min_fetch_zoom: 10.0,
            max_area_deg2: 25.0,
            page_limit: 200,
            coalesce_window_ms: 250,
        }
    }
}

/// Why an offered viewport produced no request.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SkipReason {
    NoLayer,
    NoOrg,
    BelowMinZoom,
    AreaTooLarge,
}

/// Outcome of offering a viewport to the planner.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FetchPlan {
    /// The update was accepted and is held until the coalescing window
    /// closes; call [`RequestPlanner::poll`] at (or after) `ready_at_ms`.
    Hold { ready_at_ms: u64 },
    /// No request will be issued for this viewport.
    Skip(SkipReason),
}

/// Deterministic request planner: guards, keying, and trailing-edge
/// coalescing. Time is supplied by the caller in milliseconds.
#[derive(Debug)]
pub struct RequestPlanner {
    policy: FetchPolicy,
    current: Option<FeatureRequestKey>,
    held: Option<FeatureRequestKey>,
    deadline_ms: Option<u64>,
}

impl RequestPlanner {
    pub fn new(policy: FetchPolicy) -> Self {
        Self {
            policy,
            current: None,
            held: None,
            deadline_ms: None,
        }
    }

    pub fn policy(&self) -> &FetchPolicy {
        &self.policy
    }

    /// The key whose response (if any) the draw surface currently mirrors.
    pub fn current(&self) -> Option<&FeatureRequestKey> {
        self.current.as_ref()
    }

    /// Offers a settled viewport. Updates inside an open window replace the
    /// held key, so of a rapid burst only the last update survives.
    pub fn offer(
        &mut self,
        layer: Option<LayerId>,
        org_id: Option<&str>,
        bounds: &ViewportBounds,
        now_ms: u64,
    ) -> FetchPlan {
        let Some(layer) = layer else {
            self.reset();
            return FetchPlan::Skip(SkipReason::NoLayer);
        };
        let Some(org_id) = org_id else {
            self.reset();
            return FetchPlan::Skip(SkipReason::NoOrg);
        };

        if bounds.zoom < self.policy.min_fetch_zoom {
            self.reset();
            return FetchPlan::Skip(SkipReason::BelowMinZoom);
        }

        let bbox = bounds.bbox();
        if bbox.area_deg2() > self.policy.max_area_deg2 {
            self.reset();
            return FetchPlan::Skip(SkipReason::AreaTooLarge);
        }

        self.held = Some(FeatureRequestKey::new(
            layer,
            org_id,
            &bbox,
            self.policy.page_limit,
        ));
        let ready_at_ms = *self
            .deadline_ms
            .get_or_insert(now_ms + self.policy.coalesce_window_ms);
        FetchPlan::Hold { ready_at_ms }
    }

    /// Releases the held key once the window has closed. Returns `None`
    /// before the deadline, and for keys identical to the current one.
    pub fn poll(&mut self, now_ms: u64) -> Option<FeatureRequestKey> {
        let deadline = self.deadline_ms?;
        if now_ms < deadline {
            return None;
        }
        self.release()
    }

    /// Releases the held key immediately, ignoring any open window. Used for
    /// forced re-fetches after a save.
    pub fn flush(&mut self) -> Option<FeatureRequestKey> {
        self.release()
    }

    /// Forgets the current key so the next identical viewport re-issues
    /// (cache bust after a mutation).
    pub fn invalidate(&mut self) {
        self.current = None;
    }

    fn release(&mut self) -> Option<FeatureRequestKey> {
        self.deadline_ms = None;
        let key = self.held.take()?;
        if self.current.as_ref() == Some(&key) {
            return None;
        }
        self.current = Some(key.clone());
        Some(key)
    }

    fn reset(&mut self) {
        self.current = None;
        self.held = None;
        self.deadline_ms = None;
    }
}
