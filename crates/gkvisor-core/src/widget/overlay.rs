//! Overlay widget lifecycle and event handling.

use super::state::PointerPhase;
use crate::config::{ConfigError, Variant, WidgetConfig, WidgetOptions};
use crate::dock::DockController;
use crate::events::{EventKind, EventSource, GestureEvent, PointerEvent, TouchSample};
use crate::surface::{DrawingSurface, SurfaceError, SurfaceHost, SurfaceSpec};
use crate::trail::{TrailRenderer, TrailState, TrailStyle};
use crate::tutorial::{self, TutorialError, TutorialView};
use kurbo::{Point, Size};
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use thiserror::Error;

/// Corner radius of the surface, in pixels.
const CORNER_RADIUS: f64 = 10.0;

/// Stacking order of the surface.
const Z_INDEX: i32 = 999;

/// Widget construction errors.
#[derive(Debug, Error)]
pub enum WidgetError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Surface(#[from] SurfaceError),
}

/// A floating trail display that can be dragged and docked to a viewport edge.
///
/// The widget is shared between the caller and the event-source handlers
/// through `Rc<RefCell<_>>`. Handlers hold weak references, so dropping every
/// strong handle turns them into no-ops.
pub struct OverlayWidget<H: SurfaceHost> {
    config: WidgetConfig,
    variant: Variant,
    host: H,
    surface: H::Surface,
    events: Rc<dyn EventSource>,
    trail: TrailRenderer,
    dock: DockController,
    pointer: PointerPhase,
    visible: bool,
    tutorial: Option<Box<dyn TutorialView>>,
}

impl<H: SurfaceHost + 'static> OverlayWidget<H> {
    /// Create the widget, its surface, and subscribe it to `events`.
    pub fn new(
        config: WidgetConfig,
        variant: Variant,
        host: H,
        events: Rc<dyn EventSource>,
    ) -> Result<Rc<RefCell<Self>>, WidgetError> {
        let offset = variant.initial_offset();
        let spec = SurfaceSpec {
            size: config.size,
            background: variant.background(),
            idle_image: variant.idle_image().to_string(),
            offset,
            corner_radius: CORNER_RADIUS,
            z_index: Z_INDEX,
            class_name: variant.class_name().map(str::to_string),
            anchor_top_left: variant.anchors_top_left(),
            container: config.container.clone(),
        };
        let mut surface = host.create_surface(&spec)?;
        surface.set_transform(offset);

        log::info!(
            "Created {:?} overlay ({}px, drag: {}, snap: {})",
            variant,
            config.size,
            config.drag,
            config.snap
        );

        let widget = Rc::new(RefCell::new(Self {
            trail: TrailRenderer::new(TrailStyle::for_variant(variant), variant.idle_image()),
            dock: DockController::new(offset, config.snap),
            config,
            variant,
            host,
            surface,
            events,
            pointer: PointerPhase::Idle,
            visible: true,
            tutorial: None,
        }));

        Self::listen(&widget);
        Ok(widget)
    }

    /// Parse a JSON option bag and create the widget.
    pub fn from_options(
        options: &str,
        variant: Variant,
        host: H,
        events: Rc<dyn EventSource>,
    ) -> Result<Rc<RefCell<Self>>, WidgetError> {
        let options = WidgetOptions::from_json(options)?;
        Self::new(WidgetConfig::resolve(options, variant), variant, host, events)
    }

    fn listen(widget: &Rc<RefCell<Self>>) {
        let (events, drag) = {
            let w = widget.borrow();
            (Rc::clone(&w.events), w.config.drag)
        };

        let mut kinds = vec![EventKind::GestureMotion, EventKind::GestureEnd];
        if drag {
            kinds.extend([EventKind::PointerStart, EventKind::PointerMove, EventKind::PointerEnd]);
        }

        for kind in kinds {
            let weak: Weak<RefCell<Self>> = Rc::downgrade(widget);
            events.subscribe(
                kind,
                Box::new(move |event: &mut GestureEvent| {
                    let Some(widget) = weak.upgrade() else {
                        return;
                    };
                    match widget.try_borrow_mut() {
                        Ok(mut widget) => widget.handle_event(event),
                        Err(_) => log::warn!("Overlay busy, dropping {}", event.kind()),
                    };
                }),
            );
        }
    }
}

impl<H: SurfaceHost> OverlayWidget<H> {
    /// Route one event from the source. Pointer events aimed elsewhere are ignored.
    pub fn handle_event(&mut self, event: &mut GestureEvent) {
        match event {
            GestureEvent::GestureMotion { touches } => self.on_gesture_motion(touches),
            GestureEvent::GestureEnd => self.on_gesture_end(),
            GestureEvent::PointerStart(p) if self.is_own(p) => self.on_pointer_start(p),
            GestureEvent::PointerMove(p) if self.is_own(p) => self.on_pointer_move(p),
            GestureEvent::PointerEnd(p) if self.is_own(p) => self.on_pointer_end(),
            _ => {}
        }
    }

    fn is_own(&self, pointer: &PointerEvent) -> bool {
        self.config.drag && pointer.target == self.surface.target()
    }

    fn on_gesture_motion(&mut self, touches: &[TouchSample]) {
        let viewport = self.host.viewport_size();
        self.trail.on_samples(touches, viewport, &mut self.surface);
    }

    fn on_gesture_end(&mut self) {
        if self.trail.state() == TrailState::Drawing {
            self.trail.on_session_end(&mut self.surface);
        }
    }

    fn on_pointer_start(&mut self, pointer: &PointerEvent) {
        self.events.disable();
        if let Some(position) = pointer.primary() {
            self.dock.on_drag_start(position);
        }
        self.pointer = PointerPhase::Pressed;
    }

    fn on_pointer_move(&mut self, pointer: &mut PointerEvent) {
        pointer.prevent_default();
        if let Some(position) = pointer.primary() {
            let offset = self.dock.on_drag_move(position);
            self.surface.set_transform(offset);
            self.pointer = PointerPhase::Dragging;
        }
    }

    fn on_pointer_end(&mut self) {
        let viewport = self.host.viewport_size();
        let widget = self.widget_size();
        if let Some(outcome) = self.dock.on_drag_end(viewport, widget) {
            self.surface.set_transition(Some(outcome.transition));
            self.surface.set_transform(outcome.offset);
            self.surface.schedule_transition_reset(outcome.transition.duration);
        }

        self.events.enable();

        if self.variant.has_tutorial() && self.pointer.is_tap() {
            self.show_tutorial();
        }
        self.pointer = PointerPhase::Idle;
    }

    fn widget_size(&self) -> Size {
        let size = self.surface.size();
        Size::new(size, size)
    }

    pub fn show(&mut self) {
        self.visible = true;
        self.surface.set_visible(true);
    }

    pub fn hide(&mut self) {
        self.visible = false;
        self.surface.set_visible(false);
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Current top-left position in viewport space.
    pub fn offset(&self) -> Point {
        self.dock.offset()
    }

    pub fn config(&self) -> &WidgetConfig {
        &self.config
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn surface(&self) -> &H::Surface {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut H::Surface {
        &mut self.surface
    }

    pub fn trail(&self) -> &TrailRenderer {
        &self.trail
    }

    pub fn pointer_phase(&self) -> PointerPhase {
        self.pointer
    }

    /// Attach the tutorial panel. Ignored on variants without one.
    pub fn attach_tutorial(&mut self, mut view: Box<dyn TutorialView>) {
        if !self.variant.has_tutorial() {
            log::warn!("{:?} has no tutorial panel", self.variant);
            return;
        }
        view.set_title(&self.config.title);
        self.tutorial = Some(view);
    }

    pub fn tutorial(&self) -> Option<&dyn TutorialView> {
        self.tutorial.as_deref()
    }

    /// Open the tutorial panel and pause gesture recognition behind it.
    pub fn show_tutorial(&mut self) {
        if let Some(view) = self.tutorial.as_mut() {
            view.show();
            self.events.disable();
        }
    }

    /// Close the tutorial panel and resume gesture recognition.
    pub fn hide_tutorial(&mut self) {
        if let Some(view) = self.tutorial.as_mut() {
            view.hide();
            self.events.enable();
        }
    }

    /// Fill the tutorial panel from a gesture help response body.
    ///
    /// On error the panel is left untouched. Returns the number of cards added.
    pub fn load_gestures(&mut self, body: &str) -> Result<usize, TutorialError> {
        let gestures = tutorial::parse_gestures(body)
            .inspect_err(|e| log::warn!("Tutorial panel left empty: {}", e))?;
        if let Some(view) = self.tutorial.as_mut() {
            view.append_cards(&tutorial::render_cards(&gestures));
        }
        Ok(gestures.len())
    }
}
