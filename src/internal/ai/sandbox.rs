//! Sandbox policy for shell commands.
//!
//! The sandbox decides, before a command runs, whether it may run in the
//! restricted context (and so skip per-command approval for sub-agents), or
//! must be refused with a reason the user can override. It is a policy gate
//! over the command text, not OS-level isolation.

/// Outcome of evaluating a command against the sandbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SandboxVerdict {
    /// The command may run inside the sandbox.
    Allowed,
    /// The sandbox refuses the command; running it requires explicit escalation.
    Rejected(String),
    /// No sandbox is configured; every command goes through normal approval.
    Disabled,
}

pub trait Sandbox: Send + Sync {
    fn evaluate(&self, command: &str) -> SandboxVerdict;
}

/// Used with `--no-sandbox`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSandbox;

impl Sandbox for NoSandbox {
    fn evaluate(&self, _command: &str) -> SandboxVerdict {
        SandboxVerdict::Disabled
    }
}

const NETWORK_PROGRAMS: &[&str] = &[
    "curl", "wget", "ssh", "scp", "sftp", "nc", "ncat", "netcat", "telnet", "ftp", "rsync",
    "ping", "dig", "nslookup",
];

const PRIVILEGED_PROGRAMS: &[&str] = &["sudo", "su", "doas", "pkexec"];

/// Rejects commands that reach the network or escalate privileges.
#[derive(Debug, Clone)]
pub struct PolicySandbox {
    network: Vec<String>,
    privileged: Vec<String>,
}

impl Default for PolicySandbox {
    fn default() -> Self {
        Self {
            network: NETWORK_PROGRAMS.iter().map(|p| p.to_string()).collect(),
            privileged: PRIVILEGED_PROGRAMS.iter().map(|p| p.to_string()).collect(),
        }
    }
}

impl Sandbox for PolicySandbox {
    fn evaluate(&self, command: &str) -> SandboxVerdict {
        for program in command_programs(command) {
            if self.privileged.iter().any(|p| *p == program) {
                return SandboxVerdict::Rejected("privilege escalation".to_string());
            }
            if self.network.iter().any(|p| *p == program) {
                return SandboxVerdict::Rejected("network access".to_string());
            }
        }
        SandboxVerdict::Allowed
    }
}

/// Program names at the head of every pipeline segment of `command`.
fn command_programs(command: &str) -> Vec<String> {
    command
        .split(['|', ';', '&', '\n', '(', ')', '`'])
        .filter_map(|segment| {
            let words = shlex::split(segment).unwrap_or_else(|| {
                segment.split_whitespace().map(str::to_string).collect()
            });
            words
                .into_iter()
                .find(|word| !is_env_assignment(word))
                .map(|word| program_name(&word).to_string())
        })
        .collect()
}

fn is_env_assignment(word: &str) -> bool {
    match word.split_once('=') {
        Some((name, _)) => {
            !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    }
}

fn program_name(word: &str) -> &str {
    word.rsplit('/').next().unwrap_or(word)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_commands_allowed() {
        let sandbox = PolicySandbox::default();
        assert_eq!(sandbox.evaluate("ls -la"), SandboxVerdict::Allowed);
        assert_eq!(sandbox.evaluate("grep -r curl src | wc -l"), SandboxVerdict::Allowed);
        assert_eq!(sandbox.evaluate("echo 'wget is a tool'"), SandboxVerdict::Allowed);
    }

    #[test]
    fn test_network_rejected() {
        let sandbox = PolicySandbox::default();
        let verdict = SandboxVerdict::Rejected("network access".to_string());
        assert_eq!(sandbox.evaluate("curl https://example.com"), verdict);
        assert_eq!(sandbox.evaluate("cd /tmp && /usr/bin/wget x"), verdict);
        assert_eq!(sandbox.evaluate("HTTPS_PROXY=p curl x | jq ."), verdict);
        assert_eq!(sandbox.evaluate("echo $(ssh host uptime)"), verdict);
    }

    #[test]
    fn test_privilege_escalation_rejected() {
        let sandbox = PolicySandbox::default();
        assert_eq!(
            sandbox.evaluate("sudo rm -rf /var/cache/x"),
            SandboxVerdict::Rejected("privilege escalation".to_string())
        );
    }

    #[test]
    fn test_no_sandbox_is_disabled() {
        assert_eq!(NoSandbox.evaluate("curl x"), SandboxVerdict::Disabled);
    }
}
