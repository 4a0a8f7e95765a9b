use tracing::debug;

use crate::error::SessionError;
use crate::filters::Tour;
use crate::session::{Interaction, PageCapture, PageHandle, Wait};

pub const MATCHES: &str = "#matches";
pub const TITLE: &str = "#tablelabel";
const REVERSE_SCORES: &str = "span.revscore.likelink";
const STANDARD_SCORES: &str = "Standard Scores";
const WTA_SERVE_TOGGLE: &str = "span.srclick";
const WTA_TOGGLED: &str = "Show Serve Stats";
// 'statso' is selected on load.
const ATP_TOGGLES: [&str; 2] = ["span.statsr", "span.statsw"];

#[derive(Debug, Clone, Copy)]
pub struct MatchTableInteraction {
    pub tour: Tour,
}

impl MatchTableInteraction {
    pub fn new(tour: Tour) -> Self {
        Self { tour }
    }
}

impl Interaction for MatchTableInteraction {
    fn run(&self, page: &mut dyn PageHandle, wait: &Wait) -> Result<PageCapture, SessionError> {
        wait.until("score order toggle", page, |p| p.is_displayed(REVERSE_SCORES))?;
        page.click(REVERSE_SCORES)?;
        wait.until("standard scores", page, |p| {
            Ok(p.text(REVERSE_SCORES)?
                .is_some_and(|text| text.contains(STANDARD_SCORES)))
        })?;
        wait.until("match table", page, |p| p.is_displayed(MATCHES))?;

        let mut fragments = vec![capture_table(page)?];
        let title = page
            .text(TITLE)?
            .map(|raw| normalize_title(&raw))
            .unwrap_or_default();

        match self.tour {
            Tour::WTA => {
                page.click(WTA_SERVE_TOGGLE)?;
                wait.until("serve stats toggle", page, |p| {
                    Ok(p.text(WTA_SERVE_TOGGLE)?
                        .is_some_and(|text| text.contains(WTA_TOGGLED)))
                })?;
                fragments.push(capture_table(page)?);
            }
            Tour::ATP => {
                for toggle in ATP_TOGGLES {
                    page.click(toggle)?;
                    // The active view loses its 'likelink' class.
                    let active = format!("{toggle}.likelink");
                    wait.until(toggle, page, |p| Ok(!p.is_displayed(&active)?))?;
                    fragments.push(capture_table(page)?);
                }
            }
        }

        debug!(tour = %self.tour, fragments = fragments.len(), "captured match tables");
        Ok(PageCapture { fragments, title })
    }
}

/// A missing table is captured as an empty fragment; the merge step reports it.
fn capture_table(page: &mut dyn PageHandle) -> Result<String, SessionError> {
    Ok(page.outer_html(MATCHES)?.unwrap_or_default())
}

pub fn normalize_title(raw: &str) -> String {
    raw.replace('\u{a0}', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::time::Duration;

    use super::*;

    /// A page whose spans change text and classes when clicked.
    struct FakePage {
        clicks: Vec<String>,
        texts: HashMap<&'static str, String>,
        hidden: Vec<String>,
        view: &'static str,
    }

    impl FakePage {
        fn new() -> Self {
            let mut texts = HashMap::new();
            texts.insert(REVERSE_SCORES, "Reverse Scores".to_string());
            texts.insert(TITLE, "Rafael\u{a0}Nadal  Career".to_string());
            texts.insert(WTA_SERVE_TOGGLE, "Show Return Stats".to_string());
            Self {
                clicks: Vec::new(),
                texts,
                hidden: Vec::new(),
                view: "overview",
            }
        }
    }

    impl PageHandle for FakePage {
        fn is_displayed(&mut self, selector: &str) -> Result<bool, SessionError> {
            Ok(!self.hidden.iter().any(|h| h == selector))
        }

        fn click(&mut self, selector: &str) -> Result<(), SessionError> {
            self.clicks.push(selector.to_string());
            match selector {
                REVERSE_SCORES => {
                    self.texts.insert(REVERSE_SCORES, STANDARD_SCORES.to_string());
                }
                WTA_SERVE_TOGGLE => {
                    self.texts.insert(WTA_SERVE_TOGGLE, WTA_TOGGLED.to_string());
                    self.view = "serve";
                }
                "span.statsr" => {
                    self.hidden.push("span.statsr.likelink".to_string());
                    self.view = "return";
                }
                "span.statsw" => {
                    self.hidden.push("span.statsw.likelink".to_string());
                    self.view = "raw";
                }
                other => return Err(SessionError::MissingElement(other.to_string())),
            }
            Ok(())
        }

        fn text(&mut self, selector: &str) -> Result<Option<String>, SessionError> {
            Ok(self.texts.get(selector).cloned())
        }

        fn outer_html(&mut self, _selector: &str) -> Result<Option<String>, SessionError> {
            Ok(Some(format!("<table id=\"matches\" data-view=\"{}\"></table>", self.view)))
        }
    }

    fn wait() -> Wait {
        Wait::new(Duration::from_millis(20), Duration::from_millis(1))
    }

    #[test]
    fn atp_flow_captures_three_views() {
        let mut page = FakePage::new();
        let capture = MatchTableInteraction::new(Tour::ATP)
            .run(&mut page, &wait())
            .unwrap();
        assert_eq!(page.clicks, vec![REVERSE_SCORES, "span.statsr", "span.statsw"]);
        assert_eq!(capture.fragments.len(), 3);
        assert!(capture.fragments[2].contains("raw"));
        assert_eq!(capture.title, "Rafael Nadal Career");
    }

    #[test]
    fn wta_flow_captures_two_views() {
        let mut page = FakePage::new();
        let capture = MatchTableInteraction::new(Tour::WTA)
            .run(&mut page, &wait())
            .unwrap();
        assert_eq!(page.clicks, vec![REVERSE_SCORES, WTA_SERVE_TOGGLE]);
        assert_eq!(capture.fragments.len(), 2);
        assert!(capture.fragments[1].contains("serve"));
    }

    #[test]
    fn a_toggle_that_never_settles_times_out() {
        // Clicking never flips the label.
        struct Stuck(FakePage);
        impl PageHandle for Stuck {
            fn is_displayed(&mut self, s: &str) -> Result<bool, SessionError> {
                self.0.is_displayed(s)
            }
            fn click(&mut self, _s: &str) -> Result<(), SessionError> {
                Ok(())
            }
            fn text(&mut self, s: &str) -> Result<Option<String>, SessionError> {
                self.0.text(s)
            }
            fn outer_html(&mut self, s: &str) -> Result<Option<String>, SessionError> {
                self.0.outer_html(s)
            }
        }
        let err = MatchTableInteraction::new(Tour::ATP)
            .run(&mut Stuck(FakePage::new()), &wait())
            .unwrap_err();
        assert!(matches!(err, SessionError::Timeout { ref what, .. } if what == "standard scores"));
    }
}
