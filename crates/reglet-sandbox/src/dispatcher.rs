//! The host-function registry: capability-checked primitives exposed to
//! guests. Operates on already-decoded wire types; the plugin
//! runtime (`reglet-runtime`) owns the ptr/len marshaling around these calls.

use std::net::SocketAddr;
use std::time::Duration;

use reglet_capability::CapabilitySet;
use reglet_types::CapabilityKind;
use reglet_wire::{
    ContextWire, DnsRequestWire, DnsResponseWire, ErrorDetail, ExecRequestWire, ExecResponseWire,
    HttpRequestWire, HttpResponseWire, SmtpRequestWire, SmtpResponseWire, TcpRequestWire,
    TcpResponseWire,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::TcpStream;

use crate::ssrf::is_blocked_address;

const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// Dispatches the five guest-callable host functions for one plugin
/// instance, gating every call through that plugin's declared capabilities.
pub struct HostFunctionDispatcher {
    capabilities: CapabilitySet,
    http_client: reqwest::Client,
}

impl HostFunctionDispatcher {
    pub fn new(capabilities: CapabilitySet) -> Self {
        Self { capabilities, http_client: reqwest::Client::new() }
    }

    fn capability_gate(&self, kind: CapabilityKind, concrete: &str) -> Result<(), ErrorDetail> {
        if self.capabilities.is_match(kind, concrete) {
            Ok(())
        } else {
            Err(ErrorDetail::capability_denied(format!("{kind:?} {concrete} not permitted")))
        }
    }

    fn check_cancellation(&self, ctx: &ContextWire) -> Result<Duration, ErrorDetail> {
        if ctx.canceled {
            return Err(ErrorDetail::canceled());
        }
        Ok(ctx.effective_timeout(Some(DEFAULT_CALL_TIMEOUT)).unwrap_or(DEFAULT_CALL_TIMEOUT))
    }

    pub async fn http_request(&self, req: HttpRequestWire) -> HttpResponseWire {
        let url = match url::Url::parse(&req.url) {
            Ok(u) => u,
            Err(e) => return HttpResponseWire::err(ErrorDetail::new("config", "invalid_url", e.to_string())),
        };
        let host = url.host_str().unwrap_or_default();
        let port = url.port_or_known_default().unwrap_or(443);
        if let Err(e) = self.capability_gate(CapabilityKind::Network, &format!("outbound:{port}")) {
            return HttpResponseWire::err(e);
        }
        let timeout = match self.check_cancellation(&req.ctx) {
            Ok(t) => t,
            Err(e) => return HttpResponseWire::err(e),
        };
        if let Err(e) = self.ssrf_check(host).await {
            return HttpResponseWire::err(e);
        }

        let method = req.method.parse::<reqwest::Method>().unwrap_or(reqwest::Method::GET);
        let mut builder = self.http_client.request(method, url).timeout(timeout);
        for (k, v) in &req.headers {
            builder = builder.header(k, v);
        }
        if let Some(body) = &req.body {
            builder = builder.body(body.clone());
        }

        match builder.send().await {
            Ok(resp) => {
                let status = resp.status().as_u16();
                let headers = resp
                    .headers()
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or_default().to_string()))
                    .collect();
                let body = resp.text().await.ok();
                HttpResponseWire { status: Some(status), headers, body, error: None }
            }
            Err(e) => HttpResponseWire::err(classify_reqwest_error(e)),
        }
    }

    pub async fn dns_lookup(&self, req: DnsRequestWire) -> DnsResponseWire {
        if let Err(e) = self.capability_gate(CapabilityKind::Network, "outbound:53") {
            return DnsResponseWire { addresses: vec![], error: Some(e) };
        }
        let timeout = match self.check_cancellation(&req.ctx) {
            Ok(t) => t,
            Err(e) => return DnsResponseWire { addresses: vec![], error: Some(e) },
        };
        let lookup = tokio::net::lookup_host((req.host.as_str(), 0));
        match tokio::time::timeout(timeout, lookup).await {
            Ok(Ok(addrs)) => {
                let addresses = addrs.map(|a| a.ip().to_string()).collect();
                DnsResponseWire { addresses, error: None }
            }
            Ok(Err(e)) => DnsResponseWire {
                addresses: vec![],
                error: Some(ErrorDetail::new("network", "dns_failure", e.to_string())),
            },
            Err(_) => DnsResponseWire {
                addresses: vec![],
                error: Some(ErrorDetail::new("timeout", "dns_timeout", "DNS lookup timed out").timeout()),
            },
        }
    }

    pub async fn tcp_connect(&self, req: TcpRequestWire) -> TcpResponseWire {
        if let Err(e) = self.capability_gate(CapabilityKind::Network, &format!("outbound:{}", req.port)) {
            return TcpResponseWire { connected: false, banner: None, error: Some(e) };
        }
        let timeout = match self.check_cancellation(&req.ctx) {
            Ok(t) => t,
            Err(e) => return TcpResponseWire { connected: false, banner: None, error: Some(e) },
        };
        if let Err(e) = self.ssrf_check(&req.host).await {
            return TcpResponseWire { connected: false, banner: None, error: Some(e) };
        }

        match tokio::time::timeout(timeout, TcpStream::connect((req.host.as_str(), req.port))).await {
            Ok(Ok(_stream)) => TcpResponseWire { connected: true, banner: None, error: None },
            Ok(Err(e)) => TcpResponseWire {
                connected: false,
                banner: None,
                error: Some(classify_io_error(e)),
            },
            Err(_) => TcpResponseWire {
                connected: false,
                banner: None,
                error: Some(ErrorDetail::new("timeout", "connect_timeout", "connect timed out").timeout()),
            },
        }
    }

    pub async fn smtp_probe(&self, req: SmtpRequestWire) -> SmtpResponseWire {
        if let Err(e) = self.capability_gate(CapabilityKind::Network, &format!("outbound:{}", req.port)) {
            return SmtpResponseWire { greeting: None, code: None, error: Some(e) };
        }
        let timeout = match self.check_cancellation(&req.ctx) {
            Ok(t) => t,
            Err(e) => return SmtpResponseWire { greeting: None, code: None, error: Some(e) },
        };
        if let Err(e) = self.ssrf_check(&req.host).await {
            return SmtpResponseWire { greeting: None, code: None, error: Some(e) };
        }

        let probe = async {
            let stream = TcpStream::connect((req.host.as_str(), req.port)).await?;
            let mut reader = BufReader::new(stream);
            let mut line = String::new();
            reader.read_line(&mut line).await?;
            Ok::<String, std::io::Error>(line)
        };

        match tokio::time::timeout(timeout, probe).await {
            Ok(Ok(line)) => {
                let code = line.get(0..3).and_then(|s| s.parse::<u16>().ok());
                SmtpResponseWire { greeting: Some(line.trim_end().to_string()), code, error: None }
            }
            Ok(Err(e)) => SmtpResponseWire { greeting: None, code: None, error: Some(classify_io_error(e)) },
            Err(_) => SmtpResponseWire {
                greeting: None,
                code: None,
                error: Some(ErrorDetail::new("timeout", "smtp_timeout", "SMTP probe timed out").timeout()),
            },
        }
    }

    pub async fn exec_run(&self, req: ExecRequestWire) -> ExecResponseWire {
        if let Err(e) = self.capability_gate(CapabilityKind::Exec, &req.binary) {
            return ExecResponseWire { exit_code: None, stdout: String::new(), stderr: String::new(), error: Some(e) };
        }
        let timeout = match self.check_cancellation(&req.ctx) {
            Ok(t) => t,
            Err(e) => return ExecResponseWire { exit_code: None, stdout: String::new(), stderr: String::new(), error: Some(e) },
        };

        let run = tokio::process::Command::new(&req.binary).args(&req.args).output();
        match tokio::time::timeout(timeout, run).await {
            Ok(Ok(output)) => ExecResponseWire {
                exit_code: output.status.code(),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                error: None,
            },
            Ok(Err(e)) => ExecResponseWire {
                exit_code: None,
                stdout: String::new(),
                stderr: String::new(),
                error: Some(classify_io_error(e)),
            },
            Err(_) => ExecResponseWire {
                exit_code: None,
                stdout: String::new(),
                stderr: String::new(),
                error: Some(ErrorDetail::new("timeout", "exec_timeout", "exec timed out").timeout()),
            },
        }
    }

    /// Resolves `host` and refuses it if any resolved address is blocked.
    /// Runs after DNS resolution, before the socket opens, against every
    /// resolved address.
    async fn ssrf_check(&self, host: &str) -> Result<(), ErrorDetail> {
        if let Ok(ip) = host.parse::<std::net::IpAddr>() {
            return if is_blocked_address(ip) {
                Err(ErrorDetail::new("security", "ssrf_blocked", format!("{host} resolves to a blocked address")))
            } else {
                Ok(())
            };
        }
        let resolved: Vec<SocketAddr> = match tokio::net::lookup_host((host, 0)).await {
            Ok(addrs) => addrs.collect(),
            Err(e) => return Err(ErrorDetail::new("network", "dns_failure", e.to_string())),
        };
        if resolved.iter().any(|addr| is_blocked_address(addr.ip())) {
            return Err(ErrorDetail::new("security", "ssrf_blocked", format!("{host} resolves to a blocked address")));
        }
        Ok(())
    }
}

fn classify_reqwest_error(err: reqwest::Error) -> ErrorDetail {
    if err.is_timeout() {
        ErrorDetail::new("timeout", "http_timeout", err.to_string()).timeout()
    } else {
        ErrorDetail::new("network", "http_failure", err.to_string())
    }
}

fn classify_io_error(err: std::io::Error) -> ErrorDetail {
    let detail = ErrorDetail::new("network", "io_failure", err.to_string());
    if err.kind() == std::io::ErrorKind::NotFound {
        detail.not_found()
    } else {
        detail
    }
}

trait HttpResponseWireExt {
    fn err(detail: ErrorDetail) -> HttpResponseWire;
}

impl HttpResponseWireExt for HttpResponseWire {
    fn err(detail: ErrorDetail) -> HttpResponseWire {
        HttpResponseWire { status: None, headers: Default::default(), body: None, error: Some(detail) }
    }
}
