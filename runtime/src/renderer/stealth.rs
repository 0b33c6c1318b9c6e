// Copyright 2026 Trawl Contributors
// SPDX-License-Identifier: Apache-2.0

//! Browser fingerprint smoothing.
//!
//! Installed on every new document before page scripts run, so commercial
//! listing sites render the same markup they serve to regular visitors.

/// Script evaluated on every new document.
pub const STEALTH_SCRIPT: &str = r#"
(() => {
    const define = (obj, prop, value) => {
        try { Object.defineProperty(obj, prop, { get: () => value, configurable: true }); } catch (e) {}
    };

    define(navigator, 'webdriver', undefined);

    window.chrome = window.chrome || {};
    window.chrome.runtime = window.chrome.runtime || {};

    define(navigator, 'languages', ['en-US', 'en']);
    define(navigator, 'platform', 'Win32');
    define(navigator, 'hardwareConcurrency', 8);
    define(navigator, 'plugins', [
        { name: 'Chrome PDF Plugin', filename: 'internal-pdf-viewer' },
        { name: 'Chrome PDF Viewer', filename: 'mhjfbmdgcfjbbpaeojofohoefgiehjai' },
        { name: 'Native Client', filename: 'internal-nacl-plugin' },
    ]);
    define(navigator, 'connection', { effectiveType: '4g', rtt: 50, downlink: 10, saveData: false });

    define(document, 'hidden', false);
    define(document, 'visibilityState', 'visible');

    const patchWebGl = (proto) => {
        if (!proto) return;
        const original = proto.getParameter;
        proto.getParameter = function (param) {
            if (param === 37445) return 'Intel Inc.';
            if (param === 37446) return 'Intel Iris OpenGL Engine';
            return original.call(this, param);
        };
    };
    patchWebGl(window.WebGLRenderingContext && WebGLRenderingContext.prototype);
    patchWebGl(window.WebGL2RenderingContext && WebGL2RenderingContext.prototype);
})();
"#;

/// Extra Chromium flags applied when stealth is enabled.
pub fn launch_args() -> Vec<&'static str> {
    vec![
        "--disable-blink-features=AutomationControlled",
        "--disable-infobars",
        "--lang=en-US,en",
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_covers_fingerprint_surfaces() {
        for needle in ["webdriver", "chrome.runtime", "languages", "plugins", "37445", "visibilityState"] {
            assert!(STEALTH_SCRIPT.contains(needle), "missing {needle}");
        }
        assert!(launch_args().contains(&"--disable-blink-features=AutomationControlled"));
    }
}
