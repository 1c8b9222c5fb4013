//! User-Agent 문자열.

use sysinfo::System;

/// `metric-publish/<버전> (<OS 이름> <OS 버전>)`
pub fn user_agent() -> String {
    let os_name = System::name().unwrap_or_else(|| std::env::consts::OS.to_string());
    match System::os_version() {
        Some(version) => format!(
            "metric-publish/{} ({os_name} {version})",
            env!("CARGO_PKG_VERSION")
        ),
        None => format!("metric-publish/{} ({os_name})", env!("CARGO_PKG_VERSION")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contains_crate_version() {
        let ua = user_agent();
        assert!(ua.starts_with(&format!("metric-publish/{} (", env!("CARGO_PKG_VERSION"))));
        assert!(ua.ends_with(')'));
    }
}
