//! Crawler detection from the connection's user-agent.

/// Case-insensitive substring matcher over user-agent strings.
#[derive(Debug, Clone)]
pub struct BotFilter {
    /// Lowercased needles.
    needles: Vec<String>,
}

impl BotFilter {
    /// Build a filter from configured substrings.
    pub fn new<I, S>(needles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            needles: needles
                .into_iter()
                .map(|s| s.as_ref().trim().to_lowercase())
                .filter(|s| !s.is_empty())
                .collect(),
        }
    }

    /// Whether the user-agent belongs to an automated client.
    ///
    /// A missing user-agent is treated as a browser.
    pub fn is_bot(&self, user_agent: Option<&str>) -> bool {
        let Some(user_agent) = user_agent else {
            return false;
        };
        let user_agent = user_agent.to_lowercase();
        self.needles
            .iter()
            .any(|needle| user_agent.contains(needle.as_str()))
    }
}
