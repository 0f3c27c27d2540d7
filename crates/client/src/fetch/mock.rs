//! In-process page source for tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use census_core::Error;

use super::PageSource;

/// Serves canned bodies and records every requested URL.
///
/// Routes are matched by URL substring, first registered wins. A route can
/// hold a queue of bodies; the last one repeats once the queue drains.
#[derive(Default)]
pub(crate) struct MockSource {
    routes: Mutex<Vec<(String, VecDeque<Result<String, u16>>)>>,
    requests: Mutex<Vec<String>>,
}

impl MockSource {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Serve `body` for any URL containing `pattern`.
    pub(crate) fn route(self, pattern: &str, body: impl Into<String>) -> Self {
        self.route_seq(pattern, vec![body.into()])
    }

    /// Serve `bodies` in order for URLs containing `pattern`.
    pub(crate) fn route_seq(self, pattern: &str, bodies: Vec<String>) -> Self {
        self.routes
            .lock()
            .unwrap()
            .push((pattern.to_string(), bodies.into_iter().map(Ok).collect()));
        self
    }

    /// Answer URLs containing `pattern` with a non-success status.
    pub(crate) fn fail(self, pattern: &str, status: u16) -> Self {
        self.routes
            .lock()
            .unwrap()
            .push((pattern.to_string(), VecDeque::from([Err(status)])));
        self
    }

    pub(crate) fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub(crate) fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Requests per route pattern.
    pub(crate) fn counts(&self) -> HashMap<String, usize> {
        let routes = self.routes.lock().unwrap();
        let requests = self.requests.lock().unwrap();
        routes
            .iter()
            .map(|(pattern, _)| (pattern.clone(), requests.iter().filter(|u| u.contains(pattern.as_str())).count()))
            .collect()
    }
}

#[async_trait::async_trait]
impl PageSource for MockSource {
    async fn get_page(&self, url: &str) -> Result<String, Error> {
        self.requests.lock().unwrap().push(url.to_string());

        let mut routes = self.routes.lock().unwrap();
        let Some((_, queue)) = routes.iter_mut().find(|(pattern, _)| url.contains(pattern.as_str())) else {
            return Err(Error::FetchFailed { status: 404, url: url.to_string() });
        };
        let next = if queue.len() > 1 { queue.pop_front() } else { queue.front().cloned() };
        match next {
            Some(Ok(body)) => Ok(body),
            Some(Err(status)) => Err(Error::FetchFailed { status, url: url.to_string() }),
            None => Err(Error::FetchFailed { status: 404, url: url.to_string() }),
        }
    }
}
