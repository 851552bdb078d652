//! Simulated shell for incident drills.
//!
//! Nothing is executed. The tool models one host whose root filesystem is
//! full because `error.log` has grown out of control. Clearing the log frees
//! the disk; `df` reports whichever state the host is in.

use crate::error::{Error, Result};
use crate::registry::Tool;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::sync::atomic::{AtomicBool, Ordering};

const LOG_FILE: &str = "error.log";

const DF_FULL: &str = "Filesystem      Size  Used Avail Use% Mounted on
/dev/sda1        50G   50G    0G 100% /";

const DF_RECOVERED: &str = "Filesystem      Size  Used Avail Use% Mounted on
/dev/sda1        50G    2G   48G   4% /";

#[derive(Debug, Deserialize)]
struct BashArgs {
    #[serde(alias = "command")]
    cmd: String,
}

/// Simulated `bash` tool. Each instance owns its own host state.
#[derive(Debug)]
pub struct SimulatedBash {
    disk_full: AtomicBool,
}

impl Default for SimulatedBash {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedBash {
    /// Host starts with a full disk
    pub fn new() -> Self {
        Self {
            disk_full: AtomicBool::new(true),
        }
    }

    /// Host starts healthy
    pub fn healthy() -> Self {
        Self {
            disk_full: AtomicBool::new(false),
        }
    }

    pub fn is_disk_full(&self) -> bool {
        self.disk_full.load(Ordering::SeqCst)
    }

    /// Evaluate a possibly compound command (`a && b`), clause by clause.
    pub fn run(&self, cmd: &str) -> String {
        cmd.split("&&")
            .map(str::trim)
            .filter(|clause| !clause.is_empty())
            .map(|clause| self.run_clause(clause))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn run_clause(&self, clause: &str) -> String {
        let clears_log = (clause.contains("rm") || clause.contains("truncate") || clause.contains('>'))
            && clause.contains(LOG_FILE);

        if clears_log {
            self.disk_full.store(false, Ordering::SeqCst);
            return format!("Action successful. File '{}' cleared/removed.", LOG_FILE);
        }

        if clause.contains("df") {
            return if self.is_disk_full() { DF_FULL } else { DF_RECOVERED }.to_string();
        }

        if clause.contains("rm") && (clause.contains('/') || clause.contains('*')) {
            return "Permission denied: You cannot delete root or wildcard in simulation.".to_string();
        }

        if clause.starts_with("ls") {
            let size = if self.is_disk_full() { "48G" } else { "0" };
            return format!(
                "-rw-r--r-- 1 app  app  {:>4} {}\n-rw-r--r-- 1 root root  12K syslog",
                size, LOG_FILE
            );
        }

        if clause.starts_with("cat") && clause.contains(LOG_FILE) {
            return if self.is_disk_full() {
                "ERROR [worker-3] retry loop: upstream timeout\n\
                 ERROR [worker-3] retry loop: upstream timeout\n\
                 ... (truncated, 48G)"
                    .to_string()
            } else {
                String::new()
            };
        }

        format!("Command '{}' executed successfully (simulated output).", clause)
    }
}

#[async_trait]
impl Tool for SimulatedBash {
    fn name(&self) -> &str {
        "bash"
    }

    fn description(&self) -> &str {
        "Execute bash commands safely in a simulated environment. Supported commands: df, rm, ls, cat. Chain with &&."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "cmd": {
                    "type": "string",
                    "description": "The bash command to execute (e.g., 'df -h', 'ls -la')"
                }
            },
            "required": ["cmd"]
        })
    }

    async fn execute(&self, arguments: &Map<String, Value>) -> Result<String> {
        let args: BashArgs = serde_json::from_value(Value::Object(arguments.clone())).map_err(|e| {
            Error::invalid_argument(format!("bash expects {{\"cmd\": string}}: {}", e))
                .with_operation("bash::execute")
        })?;

        if args.cmd.trim().is_empty() {
            return Err(Error::invalid_argument("empty command").with_operation("bash::execute"));
        }

        tracing::info!(cmd = %args.cmd, "simulated bash");
        Ok(self.run(&args.cmd))
    }
}
