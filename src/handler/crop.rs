use crate::config::ManipulationConfig;
use crate::crop_info::{self, CropInfo};
use crate::drag::{DragTracker, TrackerSet};
use crate::error::ManipulationResult;
use crate::geometry::{BoxStyle, Size};
use crate::host::{
    ChangeSource, EditImageEvent, ElementSpec, HandleAnchor, HostEditor, HostResult, NodeId,
    PointerEvent, SelectionAnchor,
};
use crate::raster;
use crate::state::{DragKind, SessionEvent, SessionMachine, SessionState};

use super::wrapper::{self, SESSION_ATTRIBUTE};
use super::ImageManipulationHandler;

pub const CROP_HANDLE_SIZE: f64 = 22.0;
pub const CROP_HANDLE_STROKE: f64 = 7.0;
const SESSION_MARKER: &str = "crop";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CropX {
    West,
    East,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CropY {
    North,
    South,
}

/// A crop handle; each one moves the two edges meeting at its corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropCorner {
    pub x: CropX,
    pub y: CropY,
}

impl CropCorner {
    pub const ALL: [CropCorner; 4] = [
        Self::new(CropX::West, CropY::South),
        Self::new(CropX::West, CropY::North),
        Self::new(CropX::East, CropY::North),
        Self::new(CropX::East, CropY::South),
    ];

    pub const fn new(x: CropX, y: CropY) -> Self {
        Self { x, y }
    }

    /// Rotation applied to the shared L-shaped handle glyph.
    pub const fn rotation_deg(self) -> f64 {
        match (self.x, self.y) {
            (CropX::West, CropY::South) => 0.0,
            (CropX::West, CropY::North) => 90.0,
            (CropX::East, CropY::North) => 180.0,
            (CropX::East, CropY::South) => 270.0,
        }
    }

    pub const fn cursor(self) -> &'static str {
        match (self.x, self.y) {
            (CropX::West, CropY::South) => "sw-resize",
            (CropX::West, CropY::North) => "nw-resize",
            (CropX::East, CropY::North) => "ne-resize",
            (CropX::East, CropY::South) => "se-resize",
        }
    }

    const fn anchor(self) -> HandleAnchor {
        HandleAnchor {
            x: match self.x {
                CropX::West => 0.0,
                CropX::East => 1.0,
            },
            y: match self.y {
                CropY::North => 0.0,
                CropY::South => 1.0,
            },
        }
    }
}

/// Pixels trimmed from each edge of the uncropped base size.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CropRect {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl CropRect {
    fn from_info(info: &CropInfo, base: Size) -> Self {
        Self {
            left: base.width * info.left,
            top: base.height * info.top,
            right: base.width * info.right,
            bottom: base.height * info.bottom,
        }
    }
}

fn clamp_edge(value: f64, max: f64) -> f64 {
    value.min(max).max(0.0)
}

/// Crop rectangle after dragging `corner` by `(delta_x, delta_y)` from
/// `origin`. Edges stay non-negative and always leave `min` visible.
pub fn dragged_crop(
    origin: CropRect,
    corner: CropCorner,
    delta_x: f64,
    delta_y: f64,
    base: Size,
    min: Size,
) -> CropRect {
    let mut crop = origin;
    match corner.x {
        CropX::West => {
            crop.left = clamp_edge(origin.left + delta_x, base.width - origin.right - min.width);
        }
        CropX::East => {
            crop.right = clamp_edge(origin.right - delta_x, base.width - origin.left - min.width);
        }
    }
    match corner.y {
        CropY::North => {
            crop.top = clamp_edge(origin.top + delta_y, base.height - origin.bottom - min.height);
        }
        CropY::South => {
            crop.bottom =
                clamp_edge(origin.bottom - delta_y, base.height - origin.top - min.height);
        }
    }
    crop
}

/// Boxes of the four shading panels covering the trimmed bands.
pub fn overlay_boxes(crop: CropRect) -> [BoxStyle; 4] {
    [
        BoxStyle {
            left: Some(0.0),
            top: Some(0.0),
            right: Some(crop.right),
            height: Some(crop.top),
            ..BoxStyle::default()
        },
        BoxStyle {
            top: Some(0.0),
            right: Some(0.0),
            bottom: Some(crop.bottom),
            width: Some(crop.right),
            ..BoxStyle::default()
        },
        BoxStyle {
            left: Some(crop.left),
            right: Some(0.0),
            bottom: Some(0.0),
            height: Some(crop.bottom),
            ..BoxStyle::default()
        },
        BoxStyle {
            left: Some(0.0),
            top: Some(crop.top),
            bottom: Some(0.0),
            width: Some(crop.left),
            ..BoxStyle::default()
        },
    ]
}

fn fraction(pixels: f64, extent: f64) -> f64 {
    if extent > 0.0 {
        pixels / extent
    } else {
        0.0
    }
}

#[derive(Debug)]
struct CropSession {
    target: NodeId,
    wrapper: NodeId,
    trackers: TrackerSet<CropCorner>,
    container: NodeId,
    overlays: [NodeId; 4],
    base_size: Size,
    crop: CropRect,
    drag_origin: Option<CropRect>,
    /// Source and rendered size the image had before the session swapped in
    /// the uncropped original.
    shown_src: String,
    shown_size: Size,
}

impl CropSession {
    fn render<H: HostEditor>(&self, host: &mut H) -> HostResult<()> {
        let crop = self.crop;
        host.set_box(
            self.container,
            &BoxStyle::insets(crop.left, crop.top, crop.right, crop.bottom),
        )?;
        for (overlay, style) in self.overlays.iter().zip(overlay_boxes(crop)) {
            host.set_box(*overlay, &style)?;
        }
        Ok(())
    }
}

/// Four-corner crop rectangle with shaded overlays around the selected image.
/// The crop is committed into a new rasterized source when the session ends.
#[derive(Debug)]
pub struct CropHandler {
    min_size: Size,
    machine: SessionMachine,
    session: Option<CropSession>,
}

impl CropHandler {
    pub fn new(config: &ManipulationConfig) -> ManipulationResult<Self> {
        config.validate()?;
        Ok(Self {
            min_size: config.min_size(),
            machine: SessionMachine::new(),
            session: None,
        })
    }

    /// Crop rectangle of the active session, in base-size pixels.
    pub fn crop_rect(&self) -> Option<CropRect> {
        self.session.as_ref().map(|session| session.crop)
    }

    fn start_session<H: HostEditor>(
        &self,
        host: &mut H,
        image: NodeId,
    ) -> ManipulationResult<CropSession> {
        let info = crop_info::extract(host, image);
        let rendered = host.client_size(image);
        let base_size = Size::new(
            rendered.width / info.visible_width_fraction(),
            rendered.height / info.visible_height_fraction(),
        );

        let shown_src = host.source(image);
        let wrapper = wrapper::wrap_image(host, image, SelectionAnchor::Before)?;
        host.set_attribute(image, SESSION_ATTRIBUTE, SESSION_MARKER)?;
        host.set_source(image, &info.src)?;
        host.set_display_size(image, base_size)?;

        let container = host.create_element(wrapper, &ElementSpec::CropContainer)?;
        let mut overlay = || host.create_element(wrapper, &ElementSpec::CropOverlay);
        let overlays = [overlay()?, overlay()?, overlay()?, overlay()?];

        let mut trackers = TrackerSet::default();
        for corner in CropCorner::ALL {
            let handle = host.create_element(
                container,
                &ElementSpec::CropHandle {
                    anchor: corner.anchor(),
                    cursor: corner.cursor(),
                    rotation_deg: corner.rotation_deg(),
                    size: CROP_HANDLE_SIZE,
                    stroke: CROP_HANDLE_STROKE,
                },
            )?;
            trackers.push(DragTracker::attach(handle, corner, false));
        }

        let session = CropSession {
            target: image,
            wrapper,
            trackers,
            container,
            overlays,
            base_size,
            crop: CropRect::from_info(&info, base_size),
            drag_origin: None,
            shown_src,
            shown_size: rendered,
        };
        session.render(host)?;
        tracing::debug!(?image, ?base_size, crop = ?session.crop, "crop session started");
        Ok(session)
    }

    /// Detaches the session and unwraps its image. Returns `None` when there
    /// is no session or its image already left the document.
    fn close_session<H: HostEditor>(
        &mut self,
        host: &mut H,
    ) -> ManipulationResult<Option<CropSession>> {
        let Some(mut session) = self.session.take() else {
            return Ok(None);
        };
        session.trackers.dispose_all();
        self.machine.transition(SessionEvent::Deselect)?;

        if !host.contains(session.target) {
            tracing::debug!(target = ?session.target, "image left the document; crop dropped");
            return Ok(None);
        }
        host.remove_attribute(session.target, SESSION_ATTRIBUTE)?;
        wrapper::remove_wrappers(host, Some(session.wrapper))?;
        Ok(Some(session))
    }

    fn end_session<H: HostEditor>(
        &mut self,
        host: &mut H,
        select_after: bool,
    ) -> ManipulationResult<()> {
        let Some(session) = self.close_session(host)? else {
            return Ok(());
        };
        commit_crop(host, session.target, session.crop)?;
        if select_after {
            host.select(session.target, None)?;
        }
        Ok(())
    }
}

/// Bakes `crop` into the image: rasterizes the visible region, lets listeners
/// replace the encoded source, then persists the fractions for later re-crops.
fn commit_crop<H: HostEditor>(
    host: &mut H,
    image: NodeId,
    crop: CropRect,
) -> ManipulationResult<()> {
    if host.is_disposed() {
        tracing::debug!(?image, "editor disposed; crop not committed");
        return Ok(());
    }

    let rendered = host.client_size(image);
    let mut info = crop_info::extract(host, image);
    info.left = fraction(crop.left, rendered.width);
    info.right = fraction(crop.right, rendered.width);
    info.top = fraction(crop.top, rendered.height);
    info.bottom = fraction(crop.bottom, rendered.height);
    if !info.is_valid() {
        tracing::warn!(?image, ?crop, ?rendered, "crop leaves nothing visible; keeping full image");
        info = CropInfo::uncropped(info.src);
    }

    let proposed = if info.is_zero() {
        info.src.clone()
    } else {
        let bitmap = host.natural_bitmap(image)?;
        raster::rasterize_crop(&bitmap, &info)?
    };
    let mut event = EditImageEvent {
        image,
        new_src: proposed,
    };
    host.trigger_edit_image(&mut event)?;

    crop_info::store(host, image, &info)?;
    host.set_source(image, &event.new_src)?;
    host.set_display_size(
        image,
        Size::new(
            rendered.width * info.visible_width_fraction(),
            rendered.height * info.visible_height_fraction(),
        ),
    )?;
    host.add_undo_snapshot()?;
    host.trigger_content_changed(ChangeSource::ImageCrop, Some(image))?;
    tracing::debug!(?image, ?info, "crop committed");
    Ok(())
}

impl ImageManipulationHandler for CropHandler {
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
        let live = self
            .session
            .as_ref()
            .is_some_and(|session| session.wrapper == wrapper);
        if !live {
            wrapper::remove_wrappers(host, Some(wrapper))?;
            return Ok(());
        }

        // The host discarded the session content; put back what was shown.
        let Some(session) = self.close_session(host)? else {
            return Ok(());
        };
        host.set_source(session.target, &session.shown_src)?;
        host.set_display_size(session.target, session.shown_size)?;
        tracing::debug!(target = ?session.target, "crop session released without commit");
        Ok(())
    }

    fn pointer_down<H: HostEditor>(
        &mut self,
        _host: &mut H,
        event: &PointerEvent,
    ) -> ManipulationResult<bool> {
        let Some(session) = self.session.as_mut() else {
            return Ok(false);
        };
        if session.trackers.begin(event).is_none() {
            return Ok(false);
        }
        session.drag_origin = Some(session.crop);
        self.machine
            .transition(SessionEvent::BeginDrag(DragKind::Crop))?;
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
        let Some(origin) = session.drag_origin else {
            return Ok(true);
        };
        session.crop = dragged_crop(
            origin,
            drag.context,
            drag.delta_x,
            drag.delta_y,
            session.base_size,
            self.min_size,
        );
        session.render(host)?;
        Ok(true)
    }

    fn pointer_up<H: HostEditor>(
        &mut self,
        _host: &mut H,
        _event: &PointerEvent,
    ) -> ManipulationResult<bool> {
        let Some(session) = self.session.as_mut() else {
            return Ok(false);
        };
        if session.trackers.end().is_none() {
            return Ok(false);
        }
        session.drag_origin = None;
        self.machine.transition(SessionEvent::EndDrag)?;
        Ok(true)
    }
}
