//! Interactive widgets: citation popup, footnote tooltip and lightbox.
//!
//! The widgets are plain state machines. A host forwards pointer, focus,
//! keyboard and scroll events to a [`UiSession`] together with its clock,
//! calls [`UiSession::tick`] when [`UiSession::next_deadline`] passes, and
//! mirrors the resulting state into the page. Placement needs the size of
//! the rendered box, so showing and positioning are separate steps.

pub mod geometry;

pub use geometry::{place_popup, place_tooltip, Position, Rect, Size, Viewport, MARGIN};

use crate::ast::{BibEntry, Bibliography, FootnoteMap, RenderedPost};
use crate::html::{escape_attr, escape_html};
use tracing::debug;

/// Host clock in milliseconds.
pub type Millis = u64;

pub const POPUP_HIDE_MS: Millis = 220;
pub const TOOLTIP_HIDE_MS: Millis = 120;

/// Cleans footnote HTML before it is displayed.
pub trait Sanitizer {
    fn sanitize(&self, html: &str) -> String;
}

/// `ammonia` with citation markers kept intact.
#[cfg(feature = "sanitize")]
#[derive(Debug)]
pub struct AmmoniaSanitizer {
    builder: ammonia::Builder<'static>,
}

#[cfg(feature = "sanitize")]
impl AmmoniaSanitizer {
    pub fn new() -> Self {
        let mut builder = ammonia::Builder::default();
        builder.add_tag_attributes("span", &["class", "data-keys", "tabindex"]);
        Self { builder }
    }
}

#[cfg(feature = "sanitize")]
impl Default for AmmoniaSanitizer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "sanitize")]
impl Sanitizer for AmmoniaSanitizer {
    fn sanitize(&self, html: &str) -> String {
        self.builder.clean(html).to_string()
    }
}

/// A single pending hide. Scheduling replaces whatever was pending.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct HideTimer {
    due: Option<Millis>,
}

impl HideTimer {
    fn schedule(&mut self, now: Millis, delay: Millis) {
        self.due = Some(now + delay);
    }

    fn cancel(&mut self) {
        self.due = None;
    }

    fn fire(&mut self, now: Millis) -> bool {
        match self.due {
            Some(due) if due <= now => {
                self.due = None;
                true
            }
            _ => false,
        }
    }
}

/// Split a marker's `data-keys` value.
pub fn parse_keys(data_keys: &str) -> Vec<String> {
    data_keys
        .split(',')
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .map(str::to_string)
        .collect()
}

/// `Authors. Venue Year.` with empty parts left out.
pub fn meta_line(entry: &BibEntry) -> String {
    let mut parts = Vec::new();
    if !entry.short_authors.is_empty() {
        if entry.short_authors.ends_with('.') {
            parts.push(entry.short_authors.clone());
        } else {
            parts.push(format!("{}.", entry.short_authors));
        }
    }
    if !entry.venue.is_empty() {
        parts.push(entry.venue.clone());
    }
    if !entry.year.is_empty() {
        parts.push(format!("{}.", entry.year));
    }
    parts.join(" ")
}

/// Popup body for the cited keys.
pub fn popup_content(keys: &[String], bib: &Bibliography) -> String {
    keys.iter()
        .map(|key| match bib.get(key) {
            Some(entry) => format!(
                r#"<div class="title">{}</div><div class="meta">{}</div>"#,
                escape_html(&entry.title),
                escape_html(&meta_line(entry))
            ),
            None => format!("<div>{} (missing)</div>", escape_html(key)),
        })
        .collect::<Vec<_>>()
        .join(r#"<hr class="sep">"#)
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum PopupState {
    #[default]
    Hidden,
    Visible {
        keys: Vec<String>,
        trigger: Rect,
        position: Option<Position>,
    },
}

/// The shared popup describing the references behind a citation marker.
#[derive(Debug, Default)]
pub struct CitationPopup {
    state: PopupState,
    content: String,
    timer: HideTimer,
}

impl CitationPopup {
    pub fn state(&self) -> &PopupState {
        &self.state
    }

    pub fn is_visible(&self) -> bool {
        matches!(self.state, PopupState::Visible { .. })
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    fn show(&mut self, keys: Vec<String>, trigger: Rect, bib: &Bibliography) {
        self.timer.cancel();
        self.content = popup_content(&keys, bib);
        self.state = PopupState::Visible {
            keys,
            trigger,
            position: None,
        };
    }

    pub fn hide(&mut self) {
        self.timer.cancel();
        self.state = PopupState::Hidden;
        self.content.clear();
    }

    /// Position the visible popup now that its size is known.
    pub fn place(&mut self, size: Size, viewport: Viewport) -> Option<Position> {
        match &mut self.state {
            PopupState::Visible {
                trigger, position, ..
            } => {
                let placed = place_popup(*trigger, size, viewport);
                *position = Some(placed);
                Some(placed)
            }
            PopupState::Hidden => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum TooltipState {
    #[default]
    Hidden,
    Visible {
        id: String,
        trigger: Rect,
        position: Option<Position>,
    },
}

/// The shared tooltip showing a footnote's contents.
#[derive(Debug, Default)]
pub struct FootnoteTooltip {
    state: TooltipState,
    content: String,
    timer: HideTimer,
}

impl FootnoteTooltip {
    pub fn state(&self) -> &TooltipState {
        &self.state
    }

    pub fn is_visible(&self) -> bool {
        matches!(self.state, TooltipState::Visible { .. })
    }

    /// Sanitized footnote HTML.
    pub fn content(&self) -> &str {
        &self.content
    }

    fn show(&mut self, id: String, trigger: Rect, content: String) {
        self.timer.cancel();
        self.content = content;
        self.state = TooltipState::Visible {
            id,
            trigger,
            position: None,
        };
    }

    pub fn hide(&mut self) {
        self.timer.cancel();
        self.state = TooltipState::Hidden;
        self.content.clear();
    }

    pub fn place(&mut self, size: Size, viewport: Viewport) -> Option<Position> {
        match &mut self.state {
            TooltipState::Visible {
                trigger, position, ..
            } => {
                let placed = place_tooltip(*trigger, size, viewport);
                *position = Some(placed);
                Some(placed)
            }
            TooltipState::Hidden => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Pdf,
}

/// What a figure asks the lightbox to show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LightboxMedia {
    pub kind: MediaKind,
    pub src: String,
    pub caption: String,
}

impl LightboxMedia {
    /// From a figure's `data-lightbox`, `data-src` and `data-caption`.
    pub fn from_attributes(kind: &str, src: &str, caption: &str) -> Option<Self> {
        let kind = match kind {
            "image" => MediaKind::Image,
            "pdf" => MediaKind::Pdf,
            _ => return None,
        };
        if src.is_empty() {
            return None;
        }
        Some(Self {
            kind,
            src: src.to_string(),
            caption: caption.to_string(),
        })
    }
}

/// Full-screen viewer for figures.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Lightbox {
    #[default]
    Closed,
    Open(LightboxMedia),
}

impl Lightbox {
    pub fn is_open(&self) -> bool {
        matches!(self, Lightbox::Open(_))
    }

    /// Show `media`, replacing anything already shown.
    pub fn open(&mut self, media: LightboxMedia) {
        debug!(src = %media.src, "opening lightbox");
        *self = Lightbox::Open(media);
    }

    pub fn close(&mut self) {
        *self = Lightbox::Closed;
    }

    /// Markup for the content area of the open lightbox.
    pub fn content_html(&self) -> Option<String> {
        let Lightbox::Open(media) = self else {
            return None;
        };
        let src = escape_attr(&media.src);
        Some(match media.kind {
            MediaKind::Image => format!(
                r#"<img src="{src}" alt="{}" style="max-width:100%;max-height:100%;display:block">"#,
                escape_attr(&media.caption)
            ),
            MediaKind::Pdf => {
                format!(r#"<iframe src="{src}" style="width:95vw;height:80vh;border:0"></iframe>"#)
            }
        })
    }

    pub fn caption(&self) -> &str {
        match self {
            Lightbox::Open(media) => &media.caption,
            Lightbox::Closed => "",
        }
    }
}

/// Where a click landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickTarget {
    Citation,
    Popup,
    Footnote,
    Tooltip,
    Elsewhere,
}

/// Input forwarded by the host.
#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    /// Pointer entered, or focus moved to, a citation marker.
    CitationEnter { keys: String, trigger: Rect },
    /// Pointer left, or focus moved away from, a citation marker.
    CitationLeave,
    PopupEnter,
    PopupLeave,
    FootnoteEnter { id: String, trigger: Rect },
    FootnoteLeave,
    /// Click on a footnote marker. Does not count as a document click.
    FootnoteClick { id: String, trigger: Rect },
    TooltipEnter,
    TooltipLeave,
    Click(ClickTarget),
    Scroll,
    Escape,
    OpenMedia(LightboxMedia),
    LightboxClose,
    LightboxBackdrop,
}

/// Widgets and data for one page. Create once; [`UiSession::rebind`] after
/// each render.
pub struct UiSession {
    bibliography: Bibliography,
    footnotes: FootnoteMap,
    sanitizer: Option<Box<dyn Sanitizer>>,
    popup: CitationPopup,
    tooltip: FootnoteTooltip,
    lightbox: Lightbox,
}

impl std::fmt::Debug for UiSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UiSession")
            .field("entries", &self.bibliography.len())
            .field("footnotes", &self.footnotes.len())
            .field("sanitizer", &self.sanitizer.is_some())
            .field("popup", &self.popup)
            .field("tooltip", &self.tooltip)
            .field("lightbox", &self.lightbox)
            .finish()
    }
}

impl UiSession {
    pub fn new(post: &RenderedPost) -> Self {
        Self {
            bibliography: post.bibliography.clone(),
            footnotes: post.footnotes.clone(),
            sanitizer: None,
            popup: CitationPopup::default(),
            tooltip: FootnoteTooltip::default(),
            lightbox: Lightbox::Closed,
        }
    }

    pub fn with_sanitizer(mut self, sanitizer: Box<dyn Sanitizer>) -> Self {
        self.sanitizer = Some(sanitizer);
        self
    }

    /// Point the existing widgets at a new render. Open widgets are closed
    /// since their triggers are gone.
    pub fn rebind(&mut self, post: &RenderedPost) {
        self.bibliography = post.bibliography.clone();
        self.footnotes = post.footnotes.clone();
        self.popup.hide();
        self.tooltip.hide();
        self.lightbox.close();
    }

    pub fn popup(&self) -> &CitationPopup {
        &self.popup
    }

    pub fn popup_mut(&mut self) -> &mut CitationPopup {
        &mut self.popup
    }

    pub fn tooltip(&self) -> &FootnoteTooltip {
        &self.tooltip
    }

    pub fn tooltip_mut(&mut self) -> &mut FootnoteTooltip {
        &mut self.tooltip
    }

    pub fn lightbox(&self) -> &Lightbox {
        &self.lightbox
    }

    pub fn handle(&mut self, event: UiEvent, now: Millis) {
        match event {
            UiEvent::CitationEnter { keys, trigger } => {
                self.popup.show(parse_keys(&keys), trigger, &self.bibliography);
            }
            UiEvent::CitationLeave | UiEvent::PopupLeave => {
                self.popup.timer.schedule(now, POPUP_HIDE_MS);
            }
            UiEvent::PopupEnter => self.popup.timer.cancel(),

            UiEvent::FootnoteEnter { id, trigger } => self.show_footnote(id, trigger),
            UiEvent::FootnoteLeave | UiEvent::TooltipLeave => {
                self.tooltip.timer.schedule(now, TOOLTIP_HIDE_MS);
            }
            UiEvent::TooltipEnter => self.tooltip.timer.cancel(),
            UiEvent::FootnoteClick { id, trigger } => {
                if self.tooltip.is_visible() {
                    self.tooltip.hide();
                } else {
                    self.show_footnote(id, trigger);
                }
            }

            UiEvent::Click(target) => {
                if matches!(target, ClickTarget::Elsewhere) {
                    self.popup.hide();
                }
                if matches!(target, ClickTarget::Citation | ClickTarget::Popup | ClickTarget::Elsewhere) {
                    self.tooltip.hide();
                }
            }
            UiEvent::Scroll => self.popup.hide(),
            UiEvent::Escape => {
                self.tooltip.hide();
                self.lightbox.close();
            }

            UiEvent::OpenMedia(media) => self.lightbox.open(media),
            UiEvent::LightboxClose | UiEvent::LightboxBackdrop => self.lightbox.close(),
        }
    }

    fn show_footnote(&mut self, id: String, trigger: Rect) {
        let Some(raw) = self.footnotes.get(&id) else {
            return;
        };
        let content = match &self.sanitizer {
            Some(sanitizer) => sanitizer.sanitize(raw),
            None => raw.clone(),
        };
        self.tooltip.show(id, trigger, content);
    }

    /// Fire due hides. Returns whether anything changed.
    pub fn tick(&mut self, now: Millis) -> bool {
        let mut changed = false;
        if self.popup.timer.fire(now) {
            self.popup.hide();
            changed = true;
        }
        if self.tooltip.timer.fire(now) {
            self.tooltip.hide();
            changed = true;
        }
        changed
    }

    /// Earliest pending hide.
    pub fn next_deadline(&self) -> Option<Millis> {
        match (self.popup.timer.due, self.tooltip.timer.due) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }
}
