use crate::config::{ConfigError, ManipulationConfig, RatioCorrection};
use crate::drag::{DragTracker, TrackerSet};
use crate::error::ManipulationResult;
use crate::geometry::{parse_rotation, rotation_transform, Color, Size};
use crate::host::{
    ChangeSource, ElementSpec, Feature, HandleAnchor, HostEditor, HostResult, NodeId,
    PointerEvent, SelectionAnchor,
};
use crate::state::{DragKind, SessionEvent, SessionMachine, SessionState};

use super::wrapper::{self, SESSION_ATTRIBUTE};
use super::ImageManipulationHandler;

pub const HANDLE_SIZE: f64 = 7.0;
pub const HANDLE_MARGIN: f64 = 3.0;
pub const ROTATE_STEM_LENGTH: f64 = 15.0;
pub const ROTATE_GRIP_DIAMETER: f64 = 30.0;
/// Distance of the rotate grip above the top edge, as seen by the angle math.
const ROTATE_REFERENCE_OFFSET: f64 = 25.0;
const DARK_GRIP_BACKGROUND: Color = Color::new(0x33, 0x33, 0x33);
const LIGHT_GRIP_BACKGROUND: Color = Color::new(0xFF, 0xFF, 0xFF);
const SESSION_MARKER: &str = "resize";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XCoordinate {
    Left,
    Center,
    Right,
}

impl XCoordinate {
    pub const ALL: [XCoordinate; 3] = [Self::Left, Self::Center, Self::Right];

    pub const fn resizes_width(self) -> bool {
        !matches!(self, Self::Center)
    }

    /// Dragging the left edge grows the width as the pointer moves left.
    const fn sign(self) -> f64 {
        match self {
            Self::Left => -1.0,
            Self::Center | Self::Right => 1.0,
        }
    }

    const fn anchor(self) -> f64 {
        match self {
            Self::Left => 0.0,
            Self::Center => 0.5,
            Self::Right => 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YCoordinate {
    Top,
    Middle,
    Bottom,
}

impl YCoordinate {
    pub const ALL: [YCoordinate; 3] = [Self::Top, Self::Middle, Self::Bottom];

    pub const fn resizes_height(self) -> bool {
        !matches!(self, Self::Middle)
    }

    const fn sign(self) -> f64 {
        match self {
            Self::Top => -1.0,
            Self::Middle | Self::Bottom => 1.0,
        }
    }

    const fn anchor(self) -> f64 {
        match self {
            Self::Top => 0.0,
            Self::Middle => 0.5,
            Self::Bottom => 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
    NorthWest,
}

impl Direction {
    /// Grid position to compass direction; the grid centre has none.
    pub const fn at(x: XCoordinate, y: YCoordinate) -> Option<Self> {
        use XCoordinate::*;
        use YCoordinate::*;
        match (x, y) {
            (Left, Top) => Some(Self::NorthWest),
            (Left, Middle) => Some(Self::West),
            (Left, Bottom) => Some(Self::SouthWest),
            (Center, Top) => Some(Self::North),
            (Center, Middle) => None,
            (Center, Bottom) => Some(Self::South),
            (Right, Top) => Some(Self::NorthEast),
            (Right, Middle) => Some(Self::East),
            (Right, Bottom) => Some(Self::SouthEast),
        }
    }

    pub const fn cursor(self) -> &'static str {
        match self {
            Self::North => "n-resize",
            Self::NorthEast => "ne-resize",
            Self::East => "e-resize",
            Self::SouthEast => "se-resize",
            Self::South => "s-resize",
            Self::SouthWest => "sw-resize",
            Self::West => "w-resize",
            Self::NorthWest => "nw-resize",
        }
    }
}

/// What a tracked handle controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeHandle {
    Edge { x: XCoordinate, y: YCoordinate },
    Rotate,
}

impl ResizeHandle {
    const fn drag_kind(self) -> DragKind {
        match self {
            Self::Edge { .. } => DragKind::Resize,
            Self::Rotate => DragKind::Rotate,
        }
    }
}

/// Geometry captured when a drag begins.
#[derive(Debug, Clone, Copy, PartialEq)]
struct DragBase {
    size: Size,
    angle_deg: f64,
}

#[derive(Debug)]
struct ResizeSession {
    target: NodeId,
    wrapper: NodeId,
    trackers: TrackerSet<ResizeHandle>,
    base: Option<DragBase>,
}

/// Size produced by dragging the `(x, y)` handle by `(delta_x, delta_y)` from
/// `base`. Each moved dimension is clamped to `min`; with `preserve_ratio` and
/// a corner handle the pair is reconciled to the aspect ratio of `base`.
pub fn resized_size(
    base: Size,
    x: XCoordinate,
    y: YCoordinate,
    delta_x: f64,
    delta_y: f64,
    preserve_ratio: bool,
    min: Size,
) -> Size {
    let width = if x.resizes_width() {
        (base.width + delta_x * x.sign()).max(min.width)
    } else {
        base.width
    };
    let height = if y.resizes_height() {
        (base.height + delta_y * y.sign()).max(min.height)
    } else {
        base.height
    };

    let locks_ratio = preserve_ratio && x.resizes_width() && y.resizes_height();
    match base.aspect_ratio().filter(|_| locks_ratio) {
        Some(ratio) => fit_ratio(width, height, ratio, min),
        None => Size::new(width, height),
    }
}

/// Shrinks whichever side overshoots `ratio`, then grows both back onto the
/// minimum if the fit went under it.
fn fit_ratio(width: f64, height: f64, ratio: f64, min: Size) -> Size {
    let height = height.min(width / ratio);
    let width = width.min(height * ratio);
    let (mut width, mut height) = if width < height * ratio {
        (height * ratio, height)
    } else {
        (width, width / ratio)
    };

    let min_height = min.height.max(min.width / ratio);
    if height < min_height {
        height = min_height;
        width = height * ratio;
    }
    Size::new(width, height)
}

/// Wrapper rotation in degrees for a rotate-grip drag of `(delta_x, delta_y)`
/// starting at `start_deg` on an image `base_height` tall.
pub fn rotation_angle(base_height: f64, start_deg: f64, delta_x: f64, delta_y: f64) -> f64 {
    let reach = base_height / 2.0 + ROTATE_REFERENCE_OFFSET;
    let start = start_deg.to_radians();
    let x = reach * start.sin() + delta_x;
    let y = reach * start.cos() - delta_y;
    x.atan2(y).to_degrees()
}

/// Applies `size`, then re-reads the laid-out size and re-derives one side from
/// `ratio` when layout clamped it differently.
fn apply_size<H: HostEditor>(
    host: &mut H,
    target: NodeId,
    size: Size,
    ratio: Option<f64>,
    correction: RatioCorrection,
) -> HostResult<Size> {
    host.set_display_size(target, size)?;
    let Some(ratio) = ratio else {
        return Ok(size);
    };

    let mut intended = size.floor();
    for pass in 0..correction.max_passes {
        let rendered = host.client_size(target).floor();
        let off_width = (rendered.width - intended.width).abs();
        let off_height = (rendered.height - intended.height).abs();
        if off_width <= correction.tolerance && off_height <= correction.tolerance {
            break;
        }
        intended = if rendered.height < intended.height {
            Size::new(rendered.height * ratio, rendered.height)
        } else {
            Size::new(rendered.width, rendered.width / ratio)
        };
        tracing::debug!(pass, ?rendered, ?intended, "correcting ratio-locked size");
        host.set_display_size(target, intended)?;
    }
    Ok(intended)
}

/// Resize and rotate handles around the selected image.
#[derive(Debug)]
pub struct ResizeRotateHandler {
    min_size: Size,
    handle_color: Color,
    force_preserve_ratio: bool,
    correction: RatioCorrection,
    machine: SessionMachine,
    session: Option<ResizeSession>,
}

impl ResizeRotateHandler {
    pub fn new(config: &ManipulationConfig) -> ManipulationResult<Self> {
        config.validate()?;
        let handle_color = Color::from_hex(&config.handle_color)
            .ok_or_else(|| ConfigError::InvalidHandleColor(config.handle_color.clone()))?;
        Ok(Self {
            min_size: config.min_size(),
            handle_color,
            force_preserve_ratio: config.force_preserve_ratio,
            correction: config.ratio_correction,
            machine: SessionMachine::new(),
            session: None,
        })
    }

    fn start_session<H: HostEditor>(
        &self,
        host: &mut H,
        image: NodeId,
    ) -> ManipulationResult<ResizeSession> {
        let wrapper = wrapper::wrap_image(host, image, SelectionAnchor::After)?;
        host.set_attribute(image, SESSION_ATTRIBUTE, SESSION_MARKER)?;

        let step = if host.is_feature_enabled(Feature::SingleDirectionResize) {
            1
        } else {
            2
        };
        let mut trackers = TrackerSet::default();
        for x in XCoordinate::ALL.into_iter().step_by(step) {
            for y in YCoordinate::ALL.into_iter().step_by(step) {
                let Some(direction) = Direction::at(x, y) else {
                    continue;
                };
                let handle = host.create_element(
                    wrapper,
                    &ElementSpec::ResizeHandle {
                        anchor: HandleAnchor {
                            x: x.anchor(),
                            y: y.anchor(),
                        },
                        cursor: direction.cursor(),
                        color: self.handle_color,
                        size: HANDLE_SIZE,
                        margin: HANDLE_MARGIN,
                    },
                )?;
                trackers.push(DragTracker::attach(handle, ResizeHandle::Edge { x, y }, true));
            }
        }

        let frame = host.create_element(
            wrapper,
            &ElementSpec::SelectionFrame {
                color: self.handle_color,
            },
        )?;
        let background = if host.is_dark_mode() {
            DARK_GRIP_BACKGROUND
        } else {
            LIGHT_GRIP_BACKGROUND
        };
        let grip = host.create_element(
            frame,
            &ElementSpec::RotateGrip {
                color: self.handle_color,
                background,
                stem_length: ROTATE_STEM_LENGTH,
                diameter: ROTATE_GRIP_DIAMETER,
            },
        )?;
        trackers.push(DragTracker::attach(grip, ResizeHandle::Rotate, false));

        tracing::debug!(?image, handles = trackers.len(), "resize session started");
        Ok(ResizeSession {
            target: image,
            wrapper,
            trackers,
            base: None,
        })
    }

    fn end_session<H: HostEditor>(
        &mut self,
        host: &mut H,
        select_after: bool,
    ) -> ManipulationResult<()> {
        let Some(mut session) = self.session.take() else {
            return Ok(());
        };
        session.trackers.dispose_all();
        self.machine.transition(SessionEvent::Deselect)?;

        if !host.contains(session.target) {
            tracing::debug!(target = ?session.target, "image left the document; session dropped");
            return Ok(());
        }
        host.remove_attribute(session.target, SESSION_ATTRIBUTE)?;
        wrapper::remove_wrappers(host, Some(session.wrapper))?;
        if select_after {
            host.select(session.target, None)?;
        }
        tracing::debug!(target = ?session.target, "resize session ended");
        Ok(())
    }
}

impl ImageManipulationHandler for ResizeRotateHandler {
    fn set_current_image<H: HostEditor>(
        &mut self,
        host: &mut H,
        image: Option<NodeId>,
        select_after: bool,
    ) -> ManipulationResult<()> {
        if let Some(current) = self.current_image() {
            if image == Some(current) && host.contains(current) {
                return Ok(());
            }
            self.end_session(host, select_after)?;
        }

        let Some(image) = image.filter(|image| host.contains(*image)) else {
            return Ok(());
        };
        let session = self.start_session(host, image)?;
        self.session = Some(session);
        self.machine.transition(SessionEvent::Select)?;
        Ok(())
    }

    fn current_image(&self) -> Option<NodeId> {
        self.session.as_ref().map(|session| session.target)
    }

    fn session_state(&self) -> SessionState {
        self.machine.state()
    }

    fn release_session<H: HostEditor>(
        &mut self,
        host: &mut H,
        wrapper: NodeId,
    ) -> ManipulationResult<()> {
        if self
            .session
            .as_ref()
            .is_some_and(|session| session.wrapper == wrapper)
        {
            return self.end_session(host, false);
        }
        wrapper::remove_wrappers(host, Some(wrapper))?;
        Ok(())
    }

    fn pointer_down<H: HostEditor>(
        &mut self,
        host: &mut H,
        event: &PointerEvent,
    ) -> ManipulationResult<bool> {
        let Some(session) = self.session.as_mut() else {
            return Ok(false);
        };
        let Some(handle) = session.trackers.begin(event) else {
            return Ok(false);
        };

        host.add_undo_snapshot()?;
        session.base = Some(DragBase {
            size: host.client_size(session.target),
            angle_deg: parse_rotation(&host.transform(session.wrapper)).unwrap_or(0.0),
        });
        self.machine
            .transition(SessionEvent::BeginDrag(handle.drag_kind()))?;
        Ok(true)
    }

    fn pointer_move<H: HostEditor>(
        &mut self,
        host: &mut H,
        event: &PointerEvent,
    ) -> ManipulationResult<bool> {
        let Some(session) = self.session.as_mut() else {
            return Ok(false);
        };
        let Some(drag) = session.trackers.drag_to(event) else {
            return Ok(false);
        };
        let Some(base) = session.base else {
            return Ok(true);
        };

        match drag.context {
            ResizeHandle::Edge { x, y } => {
                let preserve_ratio = self.force_preserve_ratio || drag.event.modifiers.shift;
                let size = resized_size(
                    base.size,
                    x,
                    y,
                    drag.delta_x,
                    drag.delta_y,
                    preserve_ratio,
                    self.min_size,
                );
                let ratio = base
                    .size
                    .aspect_ratio()
                    .filter(|_| preserve_ratio && x.resizes_width() && y.resizes_height());
                apply_size(host, session.target, size, ratio, self.correction)?;
            }
            ResizeHandle::Rotate => {
                let degrees =
                    rotation_angle(base.size.height, base.angle_deg, drag.delta_x, drag.delta_y);
                host.set_transform(session.wrapper, &rotation_transform(degrees))?;
            }
        }
        Ok(true)
    }

    fn pointer_up<H: HostEditor>(
        &mut self,
        host: &mut H,
        _event: &PointerEvent,
    ) -> ManipulationResult<bool> {
        let Some(session) = self.session.as_mut() else {
            return Ok(false);
        };
        let Some(release) = session.trackers.end() else {
            return Ok(false);
        };
        session.base = None;
        self.machine.transition(SessionEvent::EndDrag)?;

        if release.reports_end {
            host.add_undo_snapshot()?;
            host.trigger_content_changed(ChangeSource::ImageResize, Some(session.target))?;
        }
        Ok(true)
    }
}
