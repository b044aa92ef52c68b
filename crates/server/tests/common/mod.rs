use anyhow::Context as _;
use serde_json::json;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt as _, AsyncWriteExt as _, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};

/// Minimal MCP client speaking newline-delimited JSON-RPC to the `resdb-mcp` binary.
///
/// This intentionally avoids the production rmcp code paths; it exists only for integration
/// tests.
pub struct StdioSession {
    _child: Child,
    stdin: ChildStdin,
    stdout: Lines<BufReader<ChildStdout>>,
}

impl StdioSession {
    /// Spawn the server against `base_url` and complete the initialize handshake.
    pub async fn connect(base_url: &str) -> anyhow::Result<Self> {
        let bin = env!("CARGO_BIN_EXE_resdb-mcp");
        let mut child = Command::new(bin)
            .arg("--base-url")
            .arg(base_url)
            .arg("--log-level")
            .arg("debug")
            .env_remove("RUST_LOG")
            .env_remove("RESDB_MCP_CONFIG")
            .env_remove("RESDB_INSECURE_SKIP_TLS_VERIFY")
            .env_remove("RESDB_TIMEOUT_SECS")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .context("spawn resdb-mcp")?;

        let stdin = child.stdin.take().context("child stdin")?;
        let stdout = child.stdout.take().context("child stdout")?;

        let mut session = Self {
            _child: child,
            stdin,
            stdout: BufReader::new(stdout).lines(),
        };

        let init = session
            .request(
                0,
                "initialize",
                json!({
                    "protocolVersion": "2024-11-05",
                    "capabilities": {},
                    "clientInfo": { "name": "resdb-mcp-integration-tests", "version": "0" }
                }),
            )
            .await?;
        anyhow::ensure!(
            init.pointer("/result/serverInfo/name") == Some(&json!("resilientdb")),
            "unexpected initialize result: {init}"
        );

        session
            .send(json!({"jsonrpc": "2.0", "method": "notifications/initialized"}))
            .await?;

        Ok(session)
    }

    pub async fn request(
        &mut self,
        id: u64,
        method: &str,
        params: serde_json::Value,
    ) -> anyhow::Result<serde_json::Value> {
        self.send(json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        }))
        .await?;

        tokio::time::timeout(Duration::from_secs(10), self.read_response(id))
            .await
            .context("timeout waiting for JSON-RPC response")?
    }

    async fn send(&mut self, msg: serde_json::Value) -> anyhow::Result<()> {
        let mut line = serde_json::to_string(&msg)?;
        line.push('\n');
        self.stdin.write_all(line.as_bytes()).await?;
        self.stdin.flush().await?;
        Ok(())
    }

    async fn read_response(&mut self, id: u64) -> anyhow::Result<serde_json::Value> {
        while let Some(line) = self.stdout.next_line().await? {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let msg: serde_json::Value =
                serde_json::from_str(line).with_context(|| format!("stdout is not JSON: {line}"))?;
            // Skip server-initiated notifications.
            if msg.get("id") == Some(&json!(id)) {
                return Ok(msg);
            }
        }
        anyhow::bail!("server closed stdout before answering request {id}")
    }
}

/// Extract `result.content[0].text` from a `tools/call` response.
pub fn tool_call_text(msg: &serde_json::Value) -> anyhow::Result<&str> {
    msg.pointer("/result/content/0/text")
        .and_then(serde_json::Value::as_str)
        .with_context(|| format!("tools/call missing result.content[0].text: {msg}"))
}
