//! Drag sensors. A pointer press only becomes a drag after it has been held
//! for the activation delay without wandering past the tolerance; anything
//! shorter is a click. The keyboard sensor offers the same drop through
//! grab / move / drop keys.

use std::time::{Duration, Instant};

use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointerConstraint {
    pub delay: Duration,
    pub tolerance: u16,
}

impl Default for PointerConstraint {
    fn default() -> Self {
        Self {
            delay: Duration::from_millis(200),
            tolerance: 10,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Point {
    pub x: u16,
    pub y: u16,
}

impl Point {
    pub fn new(x: u16, y: u16) -> Self {
        Self { x, y }
    }

    fn beyond(&self, other: Point, tolerance: u16) -> bool {
        let dx = self.x.abs_diff(other.x) as u32;
        let dy = self.y.abs_diff(other.y) as u32;
        let tolerance = tolerance as u32;
        dx * dx + dy * dy > tolerance * tolerance
    }
}

/// A completed drag: `over` is the task under the pointer at release, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragEnd {
    pub active: Uuid,
    pub over: Option<Uuid>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerEvent {
    Click(Uuid),
    DragStart(Uuid),
    DragEnd(DragEnd),
    Cancelled(Uuid),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Pending { id: Uuid, origin: Point, pressed_at: Instant },
    Active { id: Uuid },
    // Moved too far too early; swallow the rest of this press.
    Aborted,
}

#[derive(Debug)]
pub struct PointerSensor {
    constraint: PointerConstraint,
    phase: Phase,
}

impl PointerSensor {
    pub fn new(constraint: PointerConstraint) -> Self {
        Self { constraint, phase: Phase::Idle }
    }

    /// Pointer went down. Presses outside any task are ignored.
    pub fn press(&mut self, id: Option<Uuid>, at: Point, now: Instant) {
        self.phase = match id {
            Some(id) => Phase::Pending { id, origin: at, pressed_at: now },
            None => Phase::Idle,
        };
    }

    pub fn motion(&mut self, at: Point, now: Instant) -> Option<PointerEvent> {
        if let Phase::Pending { id, origin, pressed_at } = self.phase {
            if now.duration_since(pressed_at) >= self.constraint.delay {
                self.phase = Phase::Active { id };
                return Some(PointerEvent::DragStart(id));
            }
            if at.beyond(origin, self.constraint.tolerance) {
                self.phase = Phase::Aborted;
                return Some(PointerEvent::Cancelled(id));
            }
        }
        None
    }

    /// Activates a press that has been held still past the delay.
    pub fn tick(&mut self, now: Instant) -> Option<PointerEvent> {
        if let Phase::Pending { id, pressed_at, .. } = self.phase {
            if now.duration_since(pressed_at) >= self.constraint.delay {
                self.phase = Phase::Active { id };
                return Some(PointerEvent::DragStart(id));
            }
        }
        None
    }

    pub fn release(&mut self, over: Option<Uuid>, now: Instant) -> Option<PointerEvent> {
        let phase = std::mem::replace(&mut self.phase, Phase::Idle);
        match phase {
            Phase::Pending { id, pressed_at, .. } => {
                if now.duration_since(pressed_at) >= self.constraint.delay {
                    Some(PointerEvent::DragEnd(DragEnd { active: id, over }))
                } else {
                    Some(PointerEvent::Click(id))
                }
            }
            Phase::Active { id } => Some(PointerEvent::DragEnd(DragEnd { active: id, over })),
            Phase::Idle | Phase::Aborted => None,
        }
    }

    /// Task currently being dragged.
    pub fn active(&self) -> Option<Uuid> {
        match self.phase {
            Phase::Active { id } => Some(id),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
pub struct KeyboardSensor {
    grabbed: Option<Uuid>,
}

impl KeyboardSensor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn grab(&mut self, id: Uuid) {
        self.grabbed = Some(id);
    }

    pub fn drop_on(&mut self, over: Option<Uuid>) -> Option<DragEnd> {
        self.grabbed.take().map(|active| DragEnd { active, over })
    }

    pub fn cancel(&mut self) -> Option<Uuid> {
        self.grabbed.take()
    }

    pub fn active(&self) -> Option<Uuid> {
        self.grabbed
    }
}
