// src/geopose/tracker.rs
// Session-scoped owner of the localization state machine
// Drives transitions once per frame and performs at-most-once anchor placement
// RELEVANT FILES: src/geopose/state.rs, src/geopose/provider.rs

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use log::{debug, info, warn};

use super::provider::{AnchorPose, AnchorRequest, GeospatialAnchorProvider};
use super::sample::{GeospatialPoseSample, TrackingThresholds};
use super::state::{transition, LocalizationState, TransitionEffect};

const SLOT_EMPTY: u8 = 0;
const SLOT_PENDING: u8 = 1;
const SLOT_PLACED: u8 = 2;

/// Shared handoff between the tracker and the provider's resolution
/// callback. The status word is the single synchronization point; the pose
/// is written before the status flips to placed and read only afterwards.
#[derive(Debug)]
pub struct PlacementSlot {
    status: AtomicU8,
    pose: Mutex<Option<AnchorPose>>,
}

impl PlacementSlot {
    fn new() -> Self {
        Self {
            status: AtomicU8::new(SLOT_EMPTY),
            pose: Mutex::new(None),
        }
    }

    pub fn is_placed(&self) -> bool {
        self.status.load(Ordering::Acquire) == SLOT_PLACED
    }

    /// Claim the slot for one placement attempt. Fails while an attempt is
    /// in flight or after a successful placement.
    fn try_begin(&self) -> bool {
        self.status
            .compare_exchange(
                SLOT_EMPTY,
                SLOT_PENDING,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    fn fulfill(&self, pose: AnchorPose) {
        *self
            .pose
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(pose);
        self.status.store(SLOT_PLACED, Ordering::Release);
    }

    /// Reopen the slot after a failed attempt so a later qualifying sample
    /// may retry.
    fn abandon(&self) {
        let _ = self.status.compare_exchange(
            SLOT_PENDING,
            SLOT_EMPTY,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
    }

    pub fn pose(&self) -> Option<AnchorPose> {
        if !self.is_placed() {
            return None;
        }
        *self.pose.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Owns localization confidence for one AR session.
///
/// Updates are synchronous, once per rendered frame, from the rendering
/// context. The only cross-thread interaction is the anchor-resolution
/// callback, which touches nothing but the shared placement slot.
pub struct GeospatialTracker {
    state: LocalizationState,
    thresholds: TrackingThresholds,
    localizing_started: Option<Instant>,
    slot: Arc<PlacementSlot>,
}

impl GeospatialTracker {
    pub fn new(thresholds: TrackingThresholds) -> Self {
        Self {
            state: LocalizationState::Uninitialized,
            thresholds,
            localizing_started: None,
            slot: Arc::new(PlacementSlot::new()),
        }
    }

    /// Current localization state, polled by the shading/UI layers.
    pub fn state(&self) -> LocalizationState {
        self.state
    }

    /// World pose of the placed anchor, once resolution has succeeded.
    pub fn placed_anchor_pose(&self) -> Option<AnchorPose> {
        self.slot.pose()
    }

    /// Mark geospatial positioning unavailable for this session. Decided by
    /// session configuration before the first sample arrives.
    pub fn mark_unsupported(&mut self) {
        if self.state == LocalizationState::Uninitialized {
            info!("geospatial positioning unsupported for this session");
            self.state = LocalizationState::Unsupported;
        } else {
            warn!(
                "mark_unsupported ignored in state {:?}",
                self.state
            );
        }
    }

    /// Return to the initial state with a fresh placement slot. A resolution
    /// callback still in flight lands in the detached slot and is dropped.
    pub fn reset(&mut self) {
        info!("localization tracker reset");
        self.state = LocalizationState::Uninitialized;
        self.localizing_started = None;
        self.slot = Arc::new(PlacementSlot::new());
    }

    /// Feed one pose sample through the state machine.
    pub fn update(
        &mut self,
        sample: &GeospatialPoseSample,
        now: Instant,
        provider: &mut dyn GeospatialAnchorProvider,
    ) {
        let (next, effects) = transition(
            self.state,
            sample,
            &self.thresholds,
            self.localizing_started,
            now,
        );
        if next != self.state {
            info!("localization state {:?} -> {:?}", self.state, next);
        }
        self.state = next;

        for effect in effects {
            match effect {
                TransitionEffect::RecordLocalizingStart => {
                    self.localizing_started = Some(now);
                }
                TransitionEffect::RequestAnchorPlacement => {
                    self.try_place_anchor(sample, provider);
                }
            }
        }
    }

    /// One bounded placement attempt. If no plane is detected yet the slot
    /// reopens and the next qualifying sample tries again; there is no
    /// same-frame retry loop.
    fn try_place_anchor(
        &mut self,
        sample: &GeospatialPoseSample,
        provider: &mut dyn GeospatialAnchorProvider,
    ) {
        if !self.slot.try_begin() {
            return;
        }

        let plane = match provider.detect_plane_near(sample) {
            Some(plane) => plane,
            None => {
                debug!("no horizontal plane detected; placement deferred");
                self.slot.abandon();
                return;
            }
        };

        let request = AnchorRequest {
            latitude: sample.latitude,
            longitude: sample.longitude,
            altitude: plane.center.y,
            orientation: sample.orientation,
        };
        info!(
            "requesting geodetic anchor at ({:.6}, {:.6}, {:.2})",
            request.latitude, request.longitude, request.altitude
        );

        let slot = Arc::clone(&self.slot);
        provider.resolve_geodetic_anchor(
            request,
            Box::new(move |result| match result {
                Ok(pose) => {
                    info!("geodetic anchor resolved");
                    slot.fulfill(pose);
                }
                Err(err) => {
                    warn!("geodetic anchor resolution failed: {err}");
                    slot.abandon();
                }
            }),
        );
    }
}
