use rand::prelude::SliceRandom;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
/// Snapshot of user agent, viewport, and locale characteristics.
pub struct UserAgentProfile {
    pub user_agent: String,
    pub viewport: (u32, u32),
    pub platform: String,
    pub languages: Vec<String>,
    pub timezone: String,
}

#[derive(Debug, Clone)]
/// Small pool of desktop profiles a visitor from Ukraine would plausibly have.
pub struct UserAgentManager {
    desktop_profiles: Vec<UserAgentProfile>,
    current_session_profile: Option<UserAgentProfile>,
}

impl Default for UserAgentManager {
    fn default() -> Self {
        Self::new()
    }
}

fn ukrainian_languages() -> Vec<String> {
    ["uk-UA", "uk", "en-US", "en"]
        .into_iter()
        .map(String::from)
        .collect()
}

impl UserAgentManager {
    pub fn new() -> Self {
        Self {
            desktop_profiles: vec![
                UserAgentProfile {
                    user_agent: radar_common::settings::CHROME_WINDOWS_UA.to_string(),
                    viewport: (1920, 1080),
                    platform: "Win32".to_string(),
                    languages: ukrainian_languages(),
                    timezone: "Europe/Kyiv".to_string(),
                },
                UserAgentProfile {
                    user_agent: radar_common::settings::CHROME_LINUX_UA.to_string(),
                    viewport: (1366, 768),
                    platform: "Linux x86_64".to_string(),
                    languages: ukrainian_languages(),
                    timezone: "Europe/Kyiv".to_string(),
                },
            ],
            current_session_profile: None,
        }
    }

    /// Get (or lazily select) the profile for this browser session.
    pub fn session_profile(&mut self) -> UserAgentProfile {
        if let Some(p) = &self.current_session_profile {
            return p.clone();
        }
        let picked = self
            .desktop_profiles
            .choose(&mut rand::thread_rng())
            .cloned()
            .unwrap_or_else(|| UserAgentProfile {
                user_agent: radar_common::settings::CHROME_LINUX_UA.to_string(),
                viewport: (1366, 768),
                platform: "Linux x86_64".to_string(),
                languages: ukrainian_languages(),
                timezone: "Europe/Kyiv".to_string(),
            });
        self.current_session_profile = Some(picked.clone());
        picked
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_profile_is_sticky() {
        let mut mgr = UserAgentManager::new();
        let first = mgr.session_profile();
        for _ in 0..8 {
            assert_eq!(mgr.session_profile().user_agent, first.user_agent);
        }
        assert_eq!(first.timezone, "Europe/Kyiv");
        assert_eq!(first.languages[0], "uk-UA");
    }
}
