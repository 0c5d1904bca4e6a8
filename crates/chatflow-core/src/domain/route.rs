//! Navigation Route Value
//!
//! A `Route` is the ordered history of path segments a user has walked
//! through the conversation graph. All operations are pure: they return new
//! values and never mutate the receiver.

use serde::{Deserialize, Serialize};

/// Default separator used when a route arrives as a joined path string.
pub const DEFAULT_SEPARATOR: char = '.';

/// The chatbot navigation history.
///
/// # Example
///
/// ```
/// use chatflow_core::domain::Route;
///
/// let route = Route::parse("start.menu.options", '.');
/// assert_eq!(route.current(), "options");
/// assert_eq!(route.history().len(), 3);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    /// Visited segments in navigation order. Never empty: parsing the empty
    /// string yields a single empty segment.
    history: Vec<String>,
    /// Separator used to join/split the full path form.
    separator: char,
}

impl Route {
    /// Parse a joined path string into a route.
    ///
    /// The path is split on `separator` and each segment is trimmed.
    pub fn parse(full_path: &str, separator: char) -> Self {
        let history = full_path
            .split(separator)
            .map(|segment| segment.trim().to_string())
            .collect();
        Self { history, separator }
    }

    /// Build a route from explicit segments.
    pub fn from_segments(segments: Vec<String>, separator: char) -> Self {
        let history = if segments.is_empty() {
            vec![String::new()]
        } else {
            segments
        };
        Self { history, separator }
    }

    /// Visited segments in navigation order.
    pub fn history(&self) -> &[String] {
        &self.history
    }

    /// Separator character for the joined path form.
    pub fn separator(&self) -> char {
        self.separator
    }

    /// The current route: the last segment of the history.
    ///
    /// Returns the empty string when the history holds no segments.
    pub fn current(&self) -> &str {
        self.history.last().map(String::as_str).unwrap_or("")
    }

    /// How many times the current segment repeats consecutively at the end
    /// of the history.
    ///
    /// # Example
    ///
    /// ```
    /// use chatflow_core::domain::Route;
    ///
    /// let route = Route::parse("start.choice.choice.choice", '.');
    /// assert_eq!(route.current_repeated(), 3);
    /// ```
    pub fn current_repeated(&self) -> usize {
        let current = self.current();
        self.history
            .iter()
            .rev()
            .take_while(|segment| segment.as_str() == current)
            .count()
    }

    /// The history with consecutive duplicates collapsed, preserving order
    /// of first appearance within each run.
    pub fn history_dedup(&self) -> Vec<String> {
        let mut result: Vec<String> = Vec::with_capacity(self.history.len());
        for segment in &self.history {
            if result.last() != Some(segment) {
                result.push(segment.clone());
            }
        }
        result
    }

    /// A new route holding the deduplicated history without its last
    /// segment. Useful for navigating back without re-entering loops.
    pub fn previous(&self) -> Route {
        let mut history = self.history_dedup();
        history.pop();
        Route {
            history,
            separator: self.separator,
        }
    }

    /// A new route with `segment` appended. The receiver is unchanged.
    ///
    /// # Example
    ///
    /// ```
    /// use chatflow_core::domain::Route;
    ///
    /// let route = Route::parse("start", '.');
    /// let next = route.next("menu");
    /// assert_eq!(next.current(), "menu");
    /// assert_eq!(route.current(), "start");
    /// ```
    pub fn next(&self, segment: impl Into<String>) -> Route {
        let mut history = self.history.clone();
        history.push(segment.into());
        Route {
            history,
            separator: self.separator,
        }
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for segment in &self.history {
            if !first {
                write!(f, "{}", self.separator)?;
            }
            write!(f, "{}", segment)?;
            first = false;
        }
        Ok(())
    }
}
