//! WebAssembly entry point and browser bindings.
//!
//! Binds the overlay widget to a `<canvas>` element, the page's gesturekit
//! object, and the tutorial endpoint. Exported to JavaScript as `Visor` and
//! `Helper`.

use gkvisor_core::config::{Container, Variant, WidgetConfig, WidgetOptions};
use gkvisor_core::events::{EventKind, EventSource, GestureEvent, Handler, PointerEvent, TouchSample};
use gkvisor_core::surface::{
    DrawContext, DrawingSurface, StrokeStyle, SurfaceError, SurfaceHost, SurfaceSpec, TargetId, Transition,
};
use gkvisor_core::tutorial::{self, TutorialError, TutorialView};
use gkvisor_core::viewport::ViewportMetrics;
use gkvisor_core::widget::OverlayWidget;
use js_sys::{Array, Function, Reflect};
use kurbo::{Point, Rect, Size};
use peniko::Color;
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use std::time::Duration;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{CanvasRenderingContext2d, Document, Element, HtmlCanvasElement, HtmlElement, Response};

/// Attribute carrying a surface's [`TargetId`] on its canvas.
const TARGET_ATTRIBUTE: &str = "data-gk-surface";

type SharedWidget = Rc<RefCell<OverlayWidget<CanvasHost>>>;

#[wasm_bindgen]
extern "C" {
    /// The page's gesturekit object.
    #[derive(Clone)]
    pub type GestureKit;

    #[wasm_bindgen(method)]
    fn on(this: &GestureKit, event: &str, handler: &Function) -> JsValue;

    #[wasm_bindgen(method)]
    fn enable(this: &GestureKit);

    #[wasm_bindgen(method)]
    fn disable(this: &GestureKit);
}

impl GestureKit {
    /// Session identifier the page initialized gesturekit with.
    fn uid(&self) -> Option<String> {
        let options = Reflect::get(self.as_ref(), &"_options".into()).ok()?;
        Reflect::get(&options, &"uid".into()).ok()?.as_string()
    }
}

/// [`EventSource`] over the JavaScript gesturekit object.
pub struct GestureKitSource {
    gesturekit: GestureKit,
    enabled: Cell<bool>,
    _listeners: RefCell<Vec<Closure<dyn FnMut(JsValue)>>>,
}

impl GestureKitSource {
    pub fn new(gesturekit: GestureKit) -> Self {
        Self {
            gesturekit,
            enabled: Cell::new(true),
            _listeners: RefCell::new(Vec::new()),
        }
    }
}

impl EventSource for GestureKitSource {
    fn subscribe(&self, kind: EventKind, mut handler: Handler) {
        let listener = Closure::wrap(Box::new(move |raw: JsValue| {
            let mut event = read_event(kind, &raw);
            handler(&mut event);
            if event.pointer().is_some_and(PointerEvent::is_default_prevented) {
                prevent_default(&raw);
            }
        }) as Box<dyn FnMut(JsValue)>);

        self.gesturekit.on(kind.name(), listener.as_ref().unchecked_ref());
        self._listeners.borrow_mut().push(listener);
    }

    fn disable(&self) {
        self.enabled.set(false);
        self.gesturekit.disable();
    }

    fn enable(&self) {
        self.enabled.set(true);
        self.gesturekit.enable();
    }

    fn is_enabled(&self) -> bool {
        self.enabled.get()
    }
}

fn read_event(kind: EventKind, raw: &JsValue) -> GestureEvent {
    match kind {
        EventKind::PointerStart => GestureEvent::PointerStart(read_pointer(raw)),
        EventKind::PointerMove => GestureEvent::PointerMove(read_pointer(raw)),
        EventKind::PointerEnd => GestureEvent::PointerEnd(read_pointer(raw)),
        EventKind::GestureMotion => GestureEvent::GestureMotion {
            touches: read_touches(raw),
        },
        EventKind::GestureEnd => GestureEvent::GestureEnd,
    }
}

fn read_pointer(raw: &JsValue) -> PointerEvent {
    let target = Reflect::get(raw, &"target".into())
        .ok()
        .and_then(|t| t.dyn_ref::<Element>().and_then(|el| el.get_attribute(TARGET_ATTRIBUTE)))
        .and_then(|id| id.parse().ok())
        .map_or(TargetId::OTHER, TargetId);
    PointerEvent::new(target, read_touches(raw))
}

fn read_touches(raw: &JsValue) -> Vec<TouchSample> {
    let list = match Reflect::get(raw, &"touches".into()) {
        Ok(list) if !list.is_undefined() && !list.is_null() => list,
        _ => return Vec::new(),
    };

    Array::from(&list)
        .iter()
        .map(|touch| {
            TouchSample::new(
                number(&touch, "identifier") as i64,
                number(&touch, "pageX"),
                number(&touch, "pageY"),
            )
        })
        .collect()
}

fn number(value: &JsValue, key: &str) -> f64 {
    Reflect::get(value, &key.into())
        .ok()
        .and_then(|v| v.as_f64())
        .unwrap_or(0.0)
}

fn prevent_default(raw: &JsValue) {
    let called = Reflect::get(raw, &"preventDefault".into())
        .and_then(|f| f.dyn_into::<Function>())
        .and_then(|f| f.call0(raw));
    if let Err(e) = called {
        log::debug!("preventDefault failed: {:?}", e);
    }
}

fn document() -> Result<Document, SurfaceError> {
    web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| SurfaceError::Other("No document".to_string()))
}

fn resolve_container(document: &Document, container: &Container) -> Result<Element, SurfaceError> {
    let found = match container {
        Container::DocumentElement => document.document_element(),
        Container::Body => document.body().map(Element::from),
        Container::Selector(selector) => document.query_selector(selector).ok().flatten(),
    };
    found.ok_or_else(|| SurfaceError::ContainerNotFound(format!("{:?}", container)))
}

fn css_color(color: Color) -> String {
    let c = color.to_rgba8();
    format!("rgba({}, {}, {}, {})", c.r, c.g, c.b, f64::from(c.a) / 255.0)
}

fn set_style(element: &HtmlElement, property: &str, value: &str) {
    if let Err(e) = element.style().set_property(property, value) {
        log::debug!("Failed to set {}: {:?}", property, e);
    }
}

/// Creates canvases inside the page and measures the viewport element.
pub struct CanvasHost {
    document: Document,
    viewport: Element,
}

impl CanvasHost {
    pub fn new(document: Document, viewport: Element) -> Self {
        Self {
            document,
            viewport,
        }
    }
}

impl ViewportMetrics for CanvasHost {
    fn viewport_size(&self) -> Size {
        Size::new(
            f64::from(self.viewport.client_width()),
            f64::from(self.viewport.client_height()),
        )
    }
}

impl SurfaceHost for CanvasHost {
    type Surface = CanvasSurface;

    fn create_surface(&self, spec: &SurfaceSpec) -> Result<CanvasSurface, SurfaceError> {
        let container = resolve_container(&self.document, &spec.container)?;
        let canvas: HtmlCanvasElement = self
            .document
            .create_element("canvas")
            .map_err(|e| SurfaceError::Other(format!("{:?}", e)))?
            .dyn_into()
            .map_err(|_| SurfaceError::Other("Not a canvas".to_string()))?;

        let side = spec.size.round() as u32;
        canvas.set_width(side);
        canvas.set_height(side);
        if let Some(class_name) = &spec.class_name {
            canvas.set_class_name(class_name);
        }

        let target = TargetId::next();
        canvas
            .set_attribute(TARGET_ATTRIBUTE, &target.0.to_string())
            .map_err(|e| SurfaceError::Other(format!("{:?}", e)))?;

        let ctx: CanvasRenderingContext2d = canvas
            .get_context("2d")
            .ok()
            .flatten()
            .ok_or(SurfaceError::ContextUnavailable)?
            .dyn_into()
            .map_err(|_| SurfaceError::ContextUnavailable)?;

        let element: &HtmlElement = canvas.as_ref();
        set_style(element, "background-color", &css_color(spec.background));
        set_style(element, "background-size", "cover");
        set_style(element, "border-radius", &format!("{}px", spec.corner_radius));
        set_style(element, "position", "fixed");
        if spec.anchor_top_left {
            set_style(element, "top", "0");
            set_style(element, "left", "0");
        }
        set_style(element, "z-index", &spec.z_index.to_string());

        let mut surface = CanvasSurface {
            canvas,
            ctx,
            target,
            size: spec.size,
        };
        surface.set_background_image(Some(&spec.idle_image));
        surface.set_transform(spec.offset);

        container
            .append_child(&surface.canvas)
            .map_err(|e| SurfaceError::Other(format!("{:?}", e)))?;
        log::debug!("Created canvas {:?} in {:?}", target, spec.container);

        Ok(surface)
    }
}

/// A `<canvas>` positioned with a CSS transform.
pub struct CanvasSurface {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    target: TargetId,
    size: f64,
}

impl CanvasSurface {
    fn element(&self) -> &HtmlElement {
        self.canvas.as_ref()
    }
}

impl DrawContext for CanvasSurface {
    fn begin_path(&mut self) {
        self.ctx.begin_path();
    }

    fn move_to(&mut self, point: Point) {
        self.ctx.move_to(point.x, point.y);
    }

    fn line_to(&mut self, point: Point) {
        self.ctx.line_to(point.x, point.y);
    }

    fn arc(&mut self, center: Point, radius: f64, start_angle: f64, end_angle: f64) {
        if let Err(e) = self.ctx.arc(center.x, center.y, radius, start_angle, end_angle) {
            log::warn!("Arc rejected: {:?}", e);
        }
    }

    fn set_stroke_style(&mut self, style: StrokeStyle) {
        self.ctx.set_stroke_style_str(&css_color(style.color));
        self.ctx.set_line_width(style.width);
        self.ctx.set_line_cap(style.cap.as_str());
    }

    fn stroke(&mut self) {
        self.ctx.stroke();
    }

    fn set_fill_color(&mut self, color: Color) {
        self.ctx.set_fill_style_str(&css_color(color));
    }

    fn fill(&mut self) {
        self.ctx.fill();
    }

    fn clear_rect(&mut self, rect: Rect) {
        self.ctx.clear_rect(rect.x0, rect.y0, rect.width(), rect.height());
    }
}

impl DrawingSurface for CanvasSurface {
    fn target(&self) -> TargetId {
        self.target
    }

    fn size(&self) -> f64 {
        self.size
    }

    fn set_background_image(&mut self, url: Option<&str>) {
        let value = url.map_or_else(|| "none".to_string(), |url| format!("url(\"{}\")", url));
        set_style(self.element(), "background-image", &value);
    }

    fn set_transform(&mut self, offset: Point) {
        set_style(
            self.element(),
            "transform",
            &format!("translate({}px, {}px)", offset.x, offset.y),
        );
    }

    fn set_transition(&mut self, transition: Option<Transition>) {
        let value = match transition {
            Some(t) => format!("transform {}ms {}", t.duration.as_millis(), t.easing.as_css()),
            None => "none".to_string(),
        };
        set_style(self.element(), "transition", &value);
    }

    fn schedule_transition_reset(&mut self, after: Duration) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let element: HtmlElement = self.canvas.clone().unchecked_into();
        let reset = Closure::once_into_js(move || set_style(&element, "transition", "none"));
        let delay = i32::try_from(after.as_millis()).unwrap_or(i32::MAX);
        if let Err(e) =
            window.set_timeout_with_callback_and_timeout_and_arguments_0(reset.unchecked_ref(), delay)
        {
            log::warn!("Failed to schedule transition reset: {:?}", e);
        }
    }

    fn set_visible(&mut self, visible: bool) {
        set_style(self.element(), "display", if visible { "block" } else { "none" });
    }
}

/// Tutorial side panel built from plain DOM nodes.
pub struct DomTutorialPanel {
    container: HtmlElement,
    title: Element,
    close: Element,
    open: bool,
}

impl DomTutorialPanel {
    pub fn new(document: &Document) -> Result<Self, SurfaceError> {
        let body: Element = document
            .body()
            .ok_or_else(|| SurfaceError::ContainerNotFound("body".to_string()))?
            .into();

        let container: HtmlElement = create_node(document, "div", "gk-helper-container gk-helper-hide", &body)?
            .dyn_into()
            .map_err(|_| SurfaceError::Other("Not an HTML element".to_string()))?;
        let title = create_node(document, "h2", "gk-helper-title", &container)?;
        let close = create_node(document, "button", "gk-helper-close", &container)?;

        Ok(Self {
            container,
            title,
            close,
            open: false,
        })
    }

    /// Close the panel through `widget` on touch or click of the close button.
    fn bind_close(&self, widget: Weak<RefCell<OverlayWidget<CanvasHost>>>) {
        for event in ["touchend", "click"] {
            let widget = widget.clone();
            let on_close = Closure::wrap(Box::new(move |_event: web_sys::Event| {
                let Some(widget) = widget.upgrade() else {
                    return;
                };
                match widget.try_borrow_mut() {
                    Ok(mut widget) => widget.hide_tutorial(),
                    Err(_) => log::warn!("Overlay busy, ignoring close"),
                };
            }) as Box<dyn FnMut(web_sys::Event)>);

            if let Err(e) = self
                .close
                .add_event_listener_with_callback(event, on_close.as_ref().unchecked_ref())
            {
                log::warn!("Failed to bind {}: {:?}", event, e);
            }
            on_close.forget(); // Lives as long as the button
        }
    }
}

fn create_node(document: &Document, tag: &str, classes: &str, parent: &Element) -> Result<Element, SurfaceError> {
    let node = document
        .create_element(tag)
        .map_err(|e| SurfaceError::Other(format!("{:?}", e)))?;
    node.set_class_name(classes);
    parent
        .append_child(&node)
        .map_err(|e| SurfaceError::Other(format!("{:?}", e)))?;
    Ok(node)
}

impl TutorialView for DomTutorialPanel {
    fn show(&mut self) {
        set_style(&self.container, "display", "block");
        self.open = true;
    }

    fn hide(&mut self) {
        set_style(&self.container, "display", "none");
        self.open = false;
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn set_title(&mut self, title: &str) {
        self.title.set_text_content(Some(title));
    }

    fn append_cards(&mut self, html: &str) {
        if let Err(e) = self.container.insert_adjacent_html("beforeend", html) {
            log::warn!("Failed to append cards: {:?}", e);
        }
    }
}

async fn fetch_text(url: &str) -> Result<String, TutorialError> {
    let window = web_sys::window().ok_or_else(|| TutorialError::Transport("No window".to_string()))?;
    let response: Response = JsFuture::from(window.fetch_with_str(url))
        .await
        .map_err(transport)?
        .dyn_into()
        .map_err(transport)?;

    let status = response.status();
    if !tutorial::is_success_status(status) {
        return Err(TutorialError::Status(status));
    }

    JsFuture::from(response.text().map_err(transport)?)
        .await
        .map_err(transport)?
        .as_string()
        .ok_or_else(|| TutorialError::Transport("Body is not text".to_string()))
}

fn transport(e: JsValue) -> TutorialError {
    TutorialError::Transport(format!("{:?}", e))
}

/// Fetch the gesture help for `uid` and fill the widget's panel.
fn load_tutorial(widget: Weak<RefCell<OverlayWidget<CanvasHost>>>, uid: String) {
    wasm_bindgen_futures::spawn_local(async move {
        let url = tutorial::tutorial_url(&uid);
        let body = match fetch_text(&url).await {
            Ok(body) => body,
            Err(e) => {
                log::warn!("Tutorial fetch from {} failed: {}", url, e);
                return;
            }
        };

        let Some(widget) = widget.upgrade() else {
            return;
        };
        let loaded = match widget.try_borrow_mut() {
            Ok(mut widget) => widget.load_gestures(&body),
            Err(_) => {
                log::warn!("Overlay busy, dropping tutorial response");
                return;
            }
        };
        if let Ok(count) = loaded {
            log::info!("Loaded {} tutorial cards", count);
        }
    });
}

fn to_js(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

fn build(gesturekit: GestureKit, options: JsValue, variant: Variant) -> Result<SharedWidget, JsValue> {
    let options: serde_json::Value = if options.is_undefined() || options.is_null() {
        serde_json::Value::Null
    } else {
        serde_wasm_bindgen::from_value(options)?
    };
    let config = WidgetConfig::resolve(WidgetOptions::from_value(&options).map_err(to_js)?, variant);

    let document = document().map_err(to_js)?;
    let viewport = match variant {
        Variant::Visor => resolve_container(&document, &config.container).map_err(to_js)?,
        Variant::Helper => resolve_container(&document, &Container::DocumentElement).map_err(to_js)?,
    };

    let events: Rc<dyn EventSource> = Rc::new(GestureKitSource::new(gesturekit));
    OverlayWidget::new(config, variant, CanvasHost::new(document, viewport), events).map_err(to_js)
}

/// Initialize the WASM module.
#[wasm_bindgen(start)]
pub fn run_wasm() {
    console_error_panic_hook::set_once();

    if console_log::init_with_level(log::Level::Info).is_err() {
        log::warn!("Logger already initialized");
    }
}

/// Gesture visor: draws the live trail in a small draggable canvas.
#[wasm_bindgen]
pub struct Visor {
    widget: SharedWidget,
}

#[wasm_bindgen]
impl Visor {
    #[wasm_bindgen(constructor)]
    pub fn new(gesturekit: GestureKit, options: JsValue) -> Result<Visor, JsValue> {
        let widget = build(gesturekit, options, Variant::Visor)?;
        Ok(Self { widget })
    }

    pub fn show(&self) {
        self.widget.borrow_mut().show();
    }

    pub fn hide(&self) {
        self.widget.borrow_mut().hide();
    }
}

/// Gesture helper: a visor that opens a tutorial panel when tapped.
#[wasm_bindgen]
pub struct Helper {
    widget: SharedWidget,
    gesturekit: GestureKit,
}

#[wasm_bindgen]
impl Helper {
    #[wasm_bindgen(constructor)]
    pub fn new(gesturekit: GestureKit, options: JsValue) -> Result<Helper, JsValue> {
        let widget = build(gesturekit.clone(), options, Variant::Helper)?;

        let panel = DomTutorialPanel::new(&document().map_err(to_js)?).map_err(to_js)?;
        panel.bind_close(Rc::downgrade(&widget));
        widget.borrow_mut().attach_tutorial(Box::new(panel));

        let helper = Self { widget, gesturekit };
        helper.load_gestures(None);
        Ok(helper)
    }

    pub fn show(&self) {
        self.widget.borrow_mut().show();
    }

    pub fn hide(&self) {
        self.widget.borrow_mut().hide();
    }

    #[wasm_bindgen(js_name = showShowroom)]
    pub fn show_showroom(&self) {
        self.widget.borrow_mut().show_tutorial();
    }

    #[wasm_bindgen(js_name = hideShowroom)]
    pub fn hide_showroom(&self) {
        self.widget.borrow_mut().hide_tutorial();
    }

    /// Fetch tutorial cards for `uid`, or for the page's gesturekit session.
    #[wasm_bindgen(js_name = loadGestures)]
    pub fn load_gestures(&self, uid: Option<String>) {
        match uid.or_else(|| self.gesturekit.uid()) {
            Some(uid) => load_tutorial(Rc::downgrade(&self.widget), uid),
            None => log::warn!("No gesturekit uid, tutorial not loaded"),
        }
    }
}
