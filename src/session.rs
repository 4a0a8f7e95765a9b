use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::config::ScrapeConfig;
use crate::error::SessionError;

/// Element-level operations on a loaded page. Selectors are CSS.
pub trait PageHandle {
    fn is_displayed(&mut self, selector: &str) -> Result<bool, SessionError>;

    fn click(&mut self, selector: &str) -> Result<(), SessionError>;

    fn text(&mut self, selector: &str) -> Result<Option<String>, SessionError>;

    fn outer_html(&mut self, selector: &str) -> Result<Option<String>, SessionError>;
}

pub trait PageSession: PageHandle {
    fn open(&mut self) -> Result<(), SessionError>;

    fn navigate(&mut self, url: &str) -> Result<(), SessionError>;

    fn close(&mut self) -> Result<(), SessionError>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageCapture {
    /// Raw table fragments in capture order; never empty on success.
    pub fragments: Vec<String>,
    pub title: String,
}

pub trait Interaction {
    fn run(&self, page: &mut dyn PageHandle, wait: &Wait) -> Result<PageCapture, SessionError>;
}

#[derive(Debug, Clone, Copy)]
pub struct Wait {
    pub timeout: Duration,
    pub poll: Duration,
}

impl Wait {
    pub fn new(timeout: Duration, poll: Duration) -> Self {
        Self { timeout, poll }
    }

    pub fn from_config(config: &ScrapeConfig) -> Self {
        Self::new(config.wait, config.poll)
    }

    /// Polls `check` until it returns true. Running out of time is fatal.
    pub fn until<F>(
        &self,
        what: &str,
        page: &mut dyn PageHandle,
        mut check: F,
    ) -> Result<(), SessionError>
    where
        F: FnMut(&mut dyn PageHandle) -> Result<bool, SessionError>,
    {
        let started = Instant::now();
        loop {
            if check(&mut *page)? {
                debug!(what, elapsed_ms = started.elapsed().as_millis() as u64, "wait satisfied");
                return Ok(());
            }
            let elapsed = started.elapsed();
            if elapsed >= self.timeout {
                return Err(SessionError::Timeout {
                    what: what.to_string(),
                    waited_ms: elapsed.as_millis(),
                });
            }
            thread::sleep(self.poll.min(self.timeout - elapsed));
        }
    }
}

/// Opens `session`, loads `url`, runs `interaction` and closes the session
/// whatever happened in between, a failed open included.
pub fn capture_page<S: PageSession>(
    session: &mut S,
    url: &str,
    interaction: &dyn Interaction,
    wait: &Wait,
) -> Result<PageCapture, SessionError> {
    let outcome = session.open().and_then(|()| {
        session.navigate(url)?;
        interaction.run(&mut *session, wait)
    });
    if let Err(err) = session.close() {
        warn!(error = %err, "failed to close page session");
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Counter {
        polls: u32,
        ready_after: u32,
        refuse_open: bool,
        opened: bool,
        closed: bool,
        navigated: Vec<String>,
    }

    impl PageHandle for Counter {
        fn is_displayed(&mut self, _selector: &str) -> Result<bool, SessionError> {
            self.polls += 1;
            Ok(self.polls > self.ready_after)
        }

        fn click(&mut self, _selector: &str) -> Result<(), SessionError> {
            Ok(())
        }

        fn text(&mut self, _selector: &str) -> Result<Option<String>, SessionError> {
            Ok(None)
        }

        fn outer_html(&mut self, selector: &str) -> Result<Option<String>, SessionError> {
            Err(SessionError::MissingElement(selector.to_string()))
        }
    }

    impl PageSession for Counter {
        fn open(&mut self) -> Result<(), SessionError> {
            self.opened = true;
            if self.refuse_open {
                return Err(SessionError::Protocol {
                    command: "timeouts".to_string(),
                    message: "unsupported".to_string(),
                });
            }
            Ok(())
        }

        fn navigate(&mut self, url: &str) -> Result<(), SessionError> {
            self.navigated.push(url.to_string());
            Ok(())
        }

        fn close(&mut self) -> Result<(), SessionError> {
            self.closed = true;
            Ok(())
        }
    }

    struct GrabMatches;

    impl Interaction for GrabMatches {
        fn run(&self, page: &mut dyn PageHandle, _wait: &Wait) -> Result<PageCapture, SessionError> {
            let html = page.outer_html("#matches")?.unwrap_or_default();
            Ok(PageCapture {
                fragments: vec![html],
                title: String::new(),
            })
        }
    }

    fn quick() -> Wait {
        Wait::new(Duration::from_millis(50), Duration::from_millis(1))
    }

    #[test]
    fn wait_polls_until_the_predicate_holds() {
        let mut page = Counter {
            ready_after: 3,
            ..Counter::default()
        };
        quick()
            .until("ready", &mut page, |p| p.is_displayed("#matches"))
            .unwrap();
        assert_eq!(page.polls, 4);
    }

    #[test]
    fn wait_times_out() {
        let mut page = Counter {
            ready_after: u32::MAX,
            ..Counter::default()
        };
        let err = quick()
            .until("never", &mut page, |p| p.is_displayed("#matches"))
            .unwrap_err();
        assert!(matches!(err, SessionError::Timeout { ref what, .. } if what == "never"));
    }

    #[test]
    fn session_is_closed_even_when_interaction_fails() {
        let mut session = Counter::default();
        let err = capture_page(&mut session, "http://x/p", &GrabMatches, &quick()).unwrap_err();
        assert!(matches!(err, SessionError::MissingElement(_)));
        assert!(session.opened && session.closed);
        assert_eq!(session.navigated, vec!["http://x/p"]);
    }

    #[test]
    fn half_opened_sessions_are_closed_without_navigating() {
        let mut session = Counter {
            refuse_open: true,
            ..Counter::default()
        };
        let err = capture_page(&mut session, "http://x/p", &GrabMatches, &quick()).unwrap_err();
        assert!(matches!(err, SessionError::Protocol { ref command, .. } if command == "timeouts"));
        assert!(session.closed);
        assert!(session.navigated.is_empty());
    }
}
