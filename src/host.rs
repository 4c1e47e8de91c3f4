use crate::surface::Viewport;
use std::time::{Duration, Instant};

// Only the newest token is live.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct FrameRequest(u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct ListenerId(u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum EventKind {
    Resize,
    PointerMove,
    PointerLeave,
    Scroll,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum HostEvent {
    Resize(Viewport),
    PointerMove { x: f32, y: f32 },
    PointerLeave,
    Scroll { delta: f32 },
}

impl HostEvent {
    pub(crate) fn kind(&self) -> EventKind {
        match self {
            HostEvent::Resize(_) => EventKind::Resize,
            HostEvent::PointerMove { .. } => EventKind::PointerMove,
            HostEvent::PointerLeave => EventKind::PointerLeave,
            HostEvent::Scroll { .. } => EventKind::Scroll,
        }
    }
}

#[derive(Debug)]
struct FrameClock {
    interval: Duration,
    next_deadline: Instant,
    pending: Option<FrameRequest>,
}

impl FrameClock {
    fn new(fps: u32, now: Instant) -> Self {
        let interval = Duration::from_secs_f64(1.0 / fps.max(1) as f64);
        Self {
            interval,
            next_deadline: now + interval,
            pending: None,
        }
    }
}

#[derive(Debug)]
pub(crate) struct Host {
    viewport: Option<Viewport>,
    device_scale: f32,
    clock: FrameClock,
    listeners: Vec<(ListenerId, EventKind)>,
    next_id: u64,
}

impl Host {
    pub(crate) fn new(viewport: Option<Viewport>, device_scale: f32, fps: u32) -> Self {
        Self {
            viewport,
            device_scale,
            clock: FrameClock::new(fps, Instant::now()),
            listeners: Vec::new(),
            next_id: 1,
        }
    }

    pub(crate) fn viewport(&self) -> Option<Viewport> {
        self.viewport
    }

    pub(crate) fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = Some(viewport);
    }

    pub(crate) fn device_scale(&self) -> f32 {
        self.device_scale
    }

    fn fresh_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub(crate) fn request_frame(&mut self) -> FrameRequest {
        let req = FrameRequest(self.fresh_id());
        self.clock.pending = Some(req);
        req
    }

    pub(crate) fn cancel_frame(&mut self, req: FrameRequest) {
        if self.clock.pending == Some(req) {
            self.clock.pending = None;
        }
    }

    #[cfg(test)]
    pub(crate) fn has_pending_frame(&self) -> bool {
        self.clock.pending.is_some()
    }

    pub(crate) fn time_until_frame(&self, now: Instant) -> Option<Duration> {
        self.clock
            .pending
            .map(|_| self.clock.next_deadline.saturating_duration_since(now))
    }

    pub(crate) fn due(&mut self, now: Instant) -> Option<FrameRequest> {
        if now < self.clock.next_deadline {
            return None;
        }
        let req = self.clock.pending.take()?;
        self.clock.next_deadline += self.clock.interval;
        // Fell behind (suspended, slow terminal): resync instead of bursting.
        if self.clock.next_deadline <= now {
            self.clock.next_deadline = now + self.clock.interval;
        }
        Some(req)
    }

    pub(crate) fn listen(&mut self, kind: EventKind) -> ListenerId {
        let id = ListenerId(self.fresh_id());
        self.listeners.push((id, kind));
        id
    }

    pub(crate) fn unlisten(&mut self, id: ListenerId) {
        self.listeners.retain(|(l, _)| *l != id);
    }

    pub(crate) fn is_listening(&self, kind: EventKind) -> bool {
        self.listeners.iter().any(|(_, k)| *k == kind)
    }

    #[cfg(test)]
    pub(crate) fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}
