/// Immutable snapshot of the HTTP request being served, captured by the
/// host framework and injected per record. All fields are optional; absent
/// fields simply omit the corresponding output entry.
#[derive(Debug, Clone, Default)]
pub struct RequestSnapshot {
    pub method: Option<String>,
    pub uri: Option<String>,
    pub scheme: Option<String>,
    pub host: Option<String>,
    pub referer: Option<String>,
    pub user_agent: Option<String>,
    pub protocol: Option<String>,
    /// Direct client-IP header value, when a front proxy supplies one.
    pub client_ip: Option<String>,
    /// Raw forwarded-for header value: comma-separated IPs or hostnames.
    pub forwarded_for: Option<String>,
    /// Transport-layer remote address of the connection.
    pub remote_addr: Option<String>,
}

impl RequestSnapshot {
    /// Resolve the originating client address.
    ///
    /// Priority order, first non-empty match wins:
    /// 1. the direct client-IP header,
    /// 2. the first entry of the forwarded-for list,
    /// 3. the transport-layer remote address.
    ///
    /// Proxy-supplied headers are trusted over the raw socket address. No
    /// syntax validation and no proxy-chain validation is performed, so the
    /// result must not be used for security decisions.
    pub fn resolve_client_ip(&self) -> Option<String> {
        if let Some(ip) = self.client_ip.as_deref() {
            if !ip.is_empty() {
                return Some(ip.to_string());
            }
        }
        if let Some(raw) = self.forwarded_for.as_deref() {
            let stripped: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
            if let Some(first) = stripped.split(',').next() {
                let first = first.trim();
                if !first.is_empty() {
                    return Some(first.to_string());
                }
            }
        }
        self.remote_addr.clone().filter(|addr| !addr.is_empty())
    }
}

/// Snapshot of a command-line invocation. Supplied only when the process is
/// running as a CLI; its absence means "not a command-line process".
#[derive(Debug, Clone, Default)]
pub struct ProcessSnapshot {
    pub argv: Vec<String>,
    pub script_path: Option<String>,
}

impl ProcessSnapshot {
    /// Capture the current process's argument vector. The first argument,
    /// when present, doubles as the script path.
    pub fn capture() -> Self {
        let argv: Vec<String> = std::env::args().collect();
        let script_path = argv.first().cloned();
        ProcessSnapshot { argv, script_path }
    }

    /// Argument vector joined by single spaces, `None` when empty.
    pub fn command_line(&self) -> Option<String> {
        if self.argv.is_empty() {
            None
        } else {
            Some(self.argv.join(" "))
        }
    }
}
