use std::io::IsTerminal;
use std::path::PathBuf;
use std::time::Duration;

use clap::Args;
use serde::{Deserialize, Serialize};

use crate::chat::TelegramTransport;
use crate::config::{self, Config};
use crate::hosting::Hosting;
use crate::hosting::gitlab::GitlabClient;

#[derive(Debug, Args)]
pub struct DoctorArgs {
    /// Path to tagrelease.toml
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Only validate the file, skip API checks
    #[arg(long)]
    pub offline: bool,
    /// Output format
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum OutputFormat {
    Pretty,
    Text,
    Json,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DoctorReport {
    pub config: ConfigStatus,
    pub checks: Vec<CheckStatus>,
    pub issues: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ConfigStatus {
    pub path: String,
    pub host: String,
    pub group: String,
    pub release: String,
    pub admins: usize,
    pub chats: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CheckStatus {
    pub name: String,
    pub ok: bool,
    pub detail: String,
}

impl CheckStatus {
    fn from_result(name: &str, result: anyhow::Result<String>) -> Self {
        match result {
            Ok(detail) => Self {
                name: name.to_string(),
                ok: true,
                detail,
            },
            Err(e) => Self {
                name: name.to_string(),
                ok: false,
                detail: format!("{e:#}"),
            },
        }
    }
}

impl DoctorArgs {
    pub fn execute(&self) -> anyhow::Result<()> {
        let path = config::locate(self.config.as_deref())?;
        let config = Config::load(&path)?;

        let format = self.format.unwrap_or_else(|| {
            if std::io::stdout().is_terminal() {
                OutputFormat::Pretty
            } else {
                OutputFormat::Text
            }
        });

        let mut report = DoctorReport {
            config: ConfigStatus {
                path: path.display().to_string(),
                host: config.provider.host.clone(),
                group: config.provider.group.clone(),
                release: config.provider.release.clone(),
                admins: config.bot.admins.len(),
                chats: config.bot.chats.len(),
            },
            checks: vec![],
            issues: config.issues(),
        };

        if !self.offline {
            report.checks = run_checks(&config);
            for check in report.checks.iter().filter(|c| !c.ok) {
                report.issues.push(format!("{}: {}", check.name, check.detail));
            }
        }

        let issue_count = report.issues.len();

        match format {
            OutputFormat::Pretty => print_pretty(&report),
            OutputFormat::Text => print_text(&report),
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        }

        if issue_count > 0 {
            return Err(crate::error::ExitError::new(
                u8::try_from(issue_count.min(125)).unwrap_or(125),
                format!("{issue_count} issue(s) found"),
            )
            .into());
        }

        Ok(())
    }
}

fn run_checks(config: &Config) -> Vec<CheckStatus> {
    let gitlab = GitlabClient::new(
        &config.provider.host,
        &config.provider.token,
        Duration::from_secs(config.provider.timeout),
    );
    let telegram = TelegramTransport::new(&config.bot.api_base, &config.bot.token, 0);

    vec![
        CheckStatus::from_result(
            "services",
            gitlab
                .group_projects(&config.provider.group, None)
                .map(|projects| format!("{} project(s) in group", projects.len()))
                .map_err(Into::into),
        ),
        CheckStatus::from_result(
            "stands",
            gitlab
                .branches(&config.provider.release)
                .map(|branches| format!("{} branch(es) in release project", branches.len()))
                .map_err(Into::into),
        ),
        CheckStatus::from_result(
            "telegram",
            telegram.whoami().map(|name| format!("authorized as @{name}")),
        ),
    ]
}

fn print_pretty(report: &DoctorReport) {
    println!("=== tagrelease doctor ===\n");
    println!("Config:  {}", report.config.path);
    println!("Host:    {}", report.config.host);
    println!("Group:   {}", report.config.group);
    println!("Release: {}", report.config.release);
    println!(
        "Access:  {} admin(s), {} chat(s)",
        report.config.admins, report.config.chats
    );

    if !report.checks.is_empty() {
        println!("\nChecks:");
        for check in &report.checks {
            let mark = if check.ok { "✓" } else { "✗" };
            println!("  {mark} {}: {}", check.name, check.detail);
        }
    }

    if report.issues.is_empty() {
        println!("\n✓ No issues found");
    } else {
        println!("\nIssues ({}):", report.issues.len());
        for issue in &report.issues {
            println!("  • {issue}");
        }
    }
}

fn print_text(report: &DoctorReport) {
    println!(
        "tagrelease-doctor  config={}  host={}  group={}  release={}",
        report.config.path, report.config.host, report.config.group, report.config.release
    );
    for check in &report.checks {
        let status = if check.ok { "ok" } else { "failed" };
        println!("check  {}  {}  {}", check.name, status, check.detail);
    }
    if !report.issues.is_empty() {
        println!("issues  count={}", report.issues.len());
        for issue in &report.issues {
            println!("issue  {issue}");
        }
    }
}
