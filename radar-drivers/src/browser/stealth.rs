use radar_common::StealthLevel;

use super::fingerprint::UserAgentProfile;

/// Chrome command‑line arguments for a stealth level and fingerprint.
pub fn build_stealth_arguments(level: StealthLevel, profile: &UserAgentProfile) -> Vec<String> {
    let mut args = vec![
        "--disable-blink-features=AutomationControlled".to_string(),
        "--disable-infobars".to_string(),
        "--disable-dev-shm-usage".to_string(),
        "--no-sandbox".to_string(),
        "--disable-extensions".to_string(),
        "--disable-plugins-discovery".to_string(),
        format!("--user-agent={}", profile.user_agent),
        format!("--window-size={},{}", profile.viewport.0, profile.viewport.1),
        format!("--lang={}", profile.languages.join(",")),
    ];
    if level == StealthLevel::Maximum {
        args.push("--disable-gpu".to_string());
    }
    args
}

/// JavaScript evasions applied after navigation.
pub struct StealthScripts;

impl StealthScripts {
    pub fn core_evasions(profile: &UserAgentProfile) -> String {
        let langs = profile
            .languages
            .iter()
            .map(|l| format!("'{l}'"))
            .collect::<Vec<_>>()
            .join(",");
        format!(
            r#"
            Object.defineProperty(navigator, 'webdriver', {{ get: () => undefined }});
            Object.defineProperty(navigator, 'plugins', {{ get: () => [1,2,3] }});
            Object.defineProperty(navigator, 'languages', {{ get: () => [{langs}] }});
            if (!window.chrome) window.chrome = {{ runtime: {{}} }};
        "#
        )
    }

    pub fn webgl_evasions() -> &'static str {
        r#"
            const getParameter = WebGLRenderingContext.prototype.getParameter;
            WebGLRenderingContext.prototype.getParameter = function(parameter) {
                if (parameter === 37445) return 'Intel Inc.';
                if (parameter === 37446) return 'Intel Iris OpenGL Engine';
                return getParameter.call(this, parameter);
            };
        "#
    }

    pub fn platform_override(profile: &UserAgentProfile) -> String {
        format!(
            "Object.defineProperty(navigator, 'platform', {{ get: () => '{}' }});",
            profile.platform
        )
    }

    /// Scripts to run for a level, in order.
    pub fn for_level(level: StealthLevel, profile: &UserAgentProfile) -> Vec<String> {
        let mut scripts = vec![Self::core_evasions(profile)];
        if level == StealthLevel::Maximum {
            scripts.push(Self::webgl_evasions().to_string());
            scripts.push(Self::platform_override(profile));
        }
        scripts
    }
}
