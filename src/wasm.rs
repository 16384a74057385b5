//! WebAssembly bindings for JavaScript/TypeScript.
//!
//! The host fetches `bib.html`, the markdown and (optionally)
//! `frontmatter.html` itself, renders with [`render_post`], injects the
//! result and forwards DOM events to a [`PostSession`].

#![cfg(feature = "wasm")]

use crate::ast::RenderedPost;
use crate::bibliography::{bibtex_to_html, parse_bibliography_html};
use crate::config::RenderOptions;
use crate::render::PostRenderer;
use crate::ui::{ClickTarget, LightboxMedia, Millis, Rect, Size, UiEvent, UiSession, Viewport};
use wasm_bindgen::prelude::*;

fn js_err(err: impl std::fmt::Display) -> JsError {
    JsError::new(&err.to_string())
}

fn now() -> Millis {
    js_sys::Date::now() as Millis
}

/// A rendered post.
#[wasm_bindgen(js_name = RenderedPost)]
pub struct RenderedPostHandle {
    post: RenderedPost,
}

#[wasm_bindgen(js_class = RenderedPost)]
impl RenderedPostHandle {
    /// Header plus post body, for the container element.
    #[wasm_bindgen(js_name = containerHtml)]
    pub fn container_html(&self) -> String {
        self.post.container.html.clone()
    }

    #[wasm_bindgen(js_name = containerId)]
    pub fn container_id(&self) -> String {
        self.post.container.id.clone()
    }

    /// `<li>` items for `#refs-list`.
    #[wasm_bindgen(js_name = referencesHtml)]
    pub fn references_html(&self) -> String {
        self.post.references_html.clone()
    }

    pub fn title(&self) -> String {
        self.post.title.clone()
    }

    /// Cited keys in first-seen order.
    pub fn seen(&self) -> Vec<String> {
        self.post.seen.clone()
    }

    #[wasm_bindgen(js_name = toJson)]
    pub fn to_json(&self) -> Result<String, JsError> {
        self.post.to_json().map_err(js_err)
    }
}

/// Render a fetched post.
///
/// `options` is a JSON object with the fields of the TOML configuration,
/// e.g. `{"md_path": "posts/a/post.md", "math": {"backend": "mathml"}}`.
#[wasm_bindgen(js_name = renderPost)]
pub fn render_post(
    markdown: &str,
    bib_html: &str,
    frontmatter_html: Option<String>,
    options: &str,
) -> Result<RenderedPostHandle, JsError> {
    let options: RenderOptions = serde_json::from_str(options).map_err(js_err)?;
    options.validate().map_err(js_err)?;

    let bibliography = parse_bibliography_html(bib_html);
    let post = PostRenderer::for_options(&options)
        .render_source(markdown, bibliography, frontmatter_html.as_deref(), &options)
        .map_err(js_err)?;
    Ok(RenderedPostHandle { post })
}

/// Convert BibTeX to a `bib.html` fragment.
#[wasm_bindgen(js_name = bibToHtml)]
pub fn bib_to_html(bibtex: &str) -> String {
    bibtex_to_html(bibtex)
}

/// Popup, tooltip and lightbox state for one page.
#[wasm_bindgen]
pub struct PostSession {
    inner: UiSession,
}

#[wasm_bindgen]
impl PostSession {
    #[wasm_bindgen(constructor)]
    pub fn new(post: &RenderedPostHandle) -> Self {
        let inner = UiSession::new(&post.post);
        #[cfg(feature = "sanitize")]
        let inner = inner.with_sanitizer(Box::new(crate::ui::AmmoniaSanitizer::new()));
        Self { inner }
    }

    /// Reuse this session for a new render.
    pub fn rebind(&mut self, post: &RenderedPostHandle) {
        self.inner.rebind(&post.post);
    }

    #[wasm_bindgen(js_name = citationEnter)]
    pub fn citation_enter(&mut self, keys: &str, left: f64, top: f64, width: f64, height: f64) {
        self.inner.handle(
            UiEvent::CitationEnter {
                keys: keys.to_string(),
                trigger: Rect::new(left, top, width, height),
            },
            now(),
        );
    }

    #[wasm_bindgen(js_name = citationLeave)]
    pub fn citation_leave(&mut self) {
        self.inner.handle(UiEvent::CitationLeave, now());
    }

    #[wasm_bindgen(js_name = popupEnter)]
    pub fn popup_enter(&mut self) {
        self.inner.handle(UiEvent::PopupEnter, now());
    }

    #[wasm_bindgen(js_name = popupLeave)]
    pub fn popup_leave(&mut self) {
        self.inner.handle(UiEvent::PopupLeave, now());
    }

    #[wasm_bindgen(js_name = footnoteEnter)]
    pub fn footnote_enter(&mut self, id: &str, left: f64, top: f64, width: f64, height: f64) {
        self.inner.handle(
            UiEvent::FootnoteEnter {
                id: id.to_string(),
                trigger: Rect::new(left, top, width, height),
            },
            now(),
        );
    }

    #[wasm_bindgen(js_name = footnoteLeave)]
    pub fn footnote_leave(&mut self) {
        self.inner.handle(UiEvent::FootnoteLeave, now());
    }

    #[wasm_bindgen(js_name = footnoteClick)]
    pub fn footnote_click(&mut self, id: &str, left: f64, top: f64, width: f64, height: f64) {
        self.inner.handle(
            UiEvent::FootnoteClick {
                id: id.to_string(),
                trigger: Rect::new(left, top, width, height),
            },
            now(),
        );
    }

    #[wasm_bindgen(js_name = tooltipEnter)]
    pub fn tooltip_enter(&mut self) {
        self.inner.handle(UiEvent::TooltipEnter, now());
    }

    #[wasm_bindgen(js_name = tooltipLeave)]
    pub fn tooltip_leave(&mut self) {
        self.inner.handle(UiEvent::TooltipLeave, now());
    }

    /// Document click; `target` is `cite`, `popup`, `fn`, `tooltip` or
    /// anything else for an outside click.
    pub fn click(&mut self, target: &str) {
        let target = match target {
            "cite" => ClickTarget::Citation,
            "popup" => ClickTarget::Popup,
            "fn" => ClickTarget::Footnote,
            "tooltip" => ClickTarget::Tooltip,
            _ => ClickTarget::Elsewhere,
        };
        self.inner.handle(UiEvent::Click(target), now());
    }

    pub fn scroll(&mut self) {
        self.inner.handle(UiEvent::Scroll, now());
    }

    pub fn escape(&mut self) {
        self.inner.handle(UiEvent::Escape, now());
    }

    /// Open the lightbox from a figure's `data-lightbox`, `data-src` and
    /// `data-caption` attributes. Returns false for unsupported media.
    #[wasm_bindgen(js_name = openMedia)]
    pub fn open_media(&mut self, kind: &str, src: &str, caption: &str) -> bool {
        match LightboxMedia::from_attributes(kind, src, caption) {
            Some(media) => {
                self.inner.handle(UiEvent::OpenMedia(media), now());
                true
            }
            None => false,
        }
    }

    #[wasm_bindgen(js_name = closeLightbox)]
    pub fn close_lightbox(&mut self) {
        self.inner.handle(UiEvent::LightboxClose, now());
    }

    /// Fire due hides; true when the page needs updating.
    pub fn tick(&mut self) -> bool {
        self.inner.tick(now())
    }

    /// Milliseconds until the next pending hide.
    #[wasm_bindgen(js_name = msUntilNextDeadline)]
    pub fn ms_until_next_deadline(&self) -> Option<f64> {
        self.inner
            .next_deadline()
            .map(|due| due.saturating_sub(now()) as f64)
    }

    #[wasm_bindgen(js_name = popupHtml)]
    pub fn popup_html(&self) -> Option<String> {
        let popup = self.inner.popup();
        popup.is_visible().then(|| popup.content().to_string())
    }

    /// `[left, top]` in page coordinates for a popup of the given size.
    #[wasm_bindgen(js_name = placePopup)]
    pub fn place_popup(&mut self, width: f64, height: f64, viewport: &[f64]) -> Option<Vec<f64>> {
        let viewport = viewport_from(viewport)?;
        self.inner
            .popup_mut()
            .place(Size::new(width, height), viewport)
            .map(|pos| vec![pos.left, pos.top])
    }

    #[wasm_bindgen(js_name = tooltipHtml)]
    pub fn tooltip_html(&self) -> Option<String> {
        let tooltip = self.inner.tooltip();
        tooltip.is_visible().then(|| tooltip.content().to_string())
    }

    #[wasm_bindgen(js_name = placeTooltip)]
    pub fn place_tooltip(&mut self, width: f64, height: f64, viewport: &[f64]) -> Option<Vec<f64>> {
        let viewport = viewport_from(viewport)?;
        self.inner
            .tooltip_mut()
            .place(Size::new(width, height), viewport)
            .map(|pos| vec![pos.left, pos.top])
    }

    #[wasm_bindgen(js_name = lightboxHtml)]
    pub fn lightbox_html(&self) -> Option<String> {
        self.inner.lightbox().content_html()
    }

    #[wasm_bindgen(js_name = lightboxCaption)]
    pub fn lightbox_caption(&self) -> String {
        self.inner.lightbox().caption().to_string()
    }
}

/// `[innerWidth, innerHeight, scrollX, scrollY]`.
fn viewport_from(values: &[f64]) -> Option<Viewport> {
    match *values {
        [width, height, scroll_x, scroll_y] => Some(Viewport::new(width, height).scrolled(scroll_x, scroll_y)),
        _ => None,
    }
}

/// Get the library version.
#[wasm_bindgen(js_name = getVersion)]
pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
