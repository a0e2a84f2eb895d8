//! Tutorial panel content for the helper variant.
//!
//! The helper fetches a description of the gesture set from the GestureKit
//! API and shows one card per gesture in a side panel.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Base URL of the gesture help endpoint; the gesture set uid is appended.
pub const TUTORIAL_ENDPOINT: &str = "http://api.gesturekit.com/v1.1/index.php/sdk/getgestures_help/";

/// Tutorial loading errors.
#[derive(Debug, Error)]
pub enum TutorialError {
    #[error("Request failed with status {0}")]
    Status(u16),
    #[error("Request failed: {0}")]
    Transport(String),
    #[error("Malformed gesture set: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Full URL for a gesture set.
pub fn tutorial_url(uid: &str) -> String {
    format!("{}{}", TUTORIAL_ENDPOINT, uid)
}

/// Whether an HTTP status counts as a usable response.
///
/// Status 0 is what file and opaque responses report.
pub fn is_success_status(status: u16) -> bool {
    (200..300).contains(&status) || status == 304 || status == 0
}

/// Top-level shape of the endpoint's response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GestureSetResponse {
    pub gestureset: GestureSet,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GestureSet {
    pub gestures: Vec<GestureHelp>,
}

/// One gesture as described by the endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GestureHelp {
    /// Base64-encoded PNG of the gesture shape.
    pub img: String,
    /// Name of the gesture.
    pub method: String,
    pub img_description: String,
}

impl GestureHelp {
    /// Markup of the info card for this gesture.
    pub fn render_card(&self) -> String {
        format!(
            concat!(
                "<div class=\"gk-helper-gesture\">",
                "<img src=\"data:image/png;base64,{}\" height=\"150\">",
                "<p class=\"gk-helper-label\">{}</p>",
                "<p class=\"gk-helper-label\">{}</p>",
                "</div>"
            ),
            escape_html(&self.img),
            escape_html(&self.method),
            escape_html(&self.img_description),
        )
    }
}

/// Parse an endpoint response body.
pub fn parse_gestures(body: &str) -> Result<Vec<GestureHelp>, TutorialError> {
    let response: GestureSetResponse = serde_json::from_str(body)?;
    Ok(response.gestureset.gestures)
}

/// Concatenated card markup for a list of gestures.
pub fn render_cards(gestures: &[GestureHelp]) -> String {
    gestures.iter().map(GestureHelp::render_card).collect()
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// The side panel showing the tutorial cards.
pub trait TutorialView {
    fn show(&mut self);
    fn hide(&mut self);
    fn is_open(&self) -> bool;
    fn set_title(&mut self, title: &str);
    /// Append card markup at the end of the panel.
    fn append_cards(&mut self, html: &str);
}

/// In-memory panel, for headless hosts and tests.
#[derive(Debug, Clone, Default)]
pub struct RecordingPanel {
    pub open: bool,
    pub title: String,
    pub html: String,
}

impl TutorialView for RecordingPanel {
    fn show(&mut self) {
        self.open = true;
    }

    fn hide(&mut self) {
        self.open = false;
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn set_title(&mut self, title: &str) {
        self.title = title.to_string();
    }

    fn append_cards(&mut self, html: &str) {
        self.html.push_str(html);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &str = r#"{
        "gestureset": {
            "gestures": [
                {"img": "iVBORw0KGgo=", "method": "circle", "img_description": "Draw a circle"},
                {"img": "AAAA", "method": "zeta", "img_description": "Z <shape>"}
            ]
        }
    }"#;

    #[test]
    fn test_parse_gestures() {
        let gestures = parse_gestures(BODY).unwrap();
        assert_eq!(gestures.len(), 2);
        assert_eq!(gestures[0].method, "circle");
        assert_eq!(gestures[1].img_description, "Z <shape>");
    }

    #[test]
    fn test_malformed_body() {
        assert!(matches!(parse_gestures("{}"), Err(TutorialError::Parse(_))));
        assert!(matches!(
            parse_gestures(r#"{"gestureset": {"gestures": [{"img": 1}]}}"#),
            Err(TutorialError::Parse(_))
        ));
    }

    #[test]
    fn test_render_card_escapes_text() {
        let gestures = parse_gestures(BODY).unwrap();
        let card = gestures[1].render_card();
        assert!(card.starts_with("<div class=\"gk-helper-gesture\">"));
        assert!(card.contains("src=\"data:image/png;base64,AAAA\""));
        assert!(card.contains("<p class=\"gk-helper-label\">Z &lt;shape&gt;</p>"));

        let all = render_cards(&gestures);
        assert_eq!(all.matches("gk-helper-gesture").count(), 2);
    }

    #[test]
    fn test_status_and_url() {
        assert!(is_success_status(200));
        assert!(is_success_status(299));
        assert!(is_success_status(304));
        assert!(is_success_status(0));
        assert!(!is_success_status(301));
        assert!(!is_success_status(404));
        assert_eq!(
            tutorial_url("abc"),
            "http://api.gesturekit.com/v1.1/index.php/sdk/getgestures_help/abc"
        );
    }
}
