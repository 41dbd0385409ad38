//! Service configuration.
//!
//! Resolved from, in increasing precedence: an optional JSON/YAML file,
//! `PORTAINER_*` environment variables, and command-line flags.
//!
//! - `PORTAINER_HOSTS`: JSON array of targets (`name`, `url`, `token` or `username`+`password`)
//! - `PORTAINER_URL`, `PORTAINER_TOKEN`, `PORTAINER_USERNAME`, `PORTAINER_PASSWORD`,
//!   `PORTAINER_NAME`: legacy single target, used when no host list is configured
//! - `PORTAINER_SCHEDULE_TIME`: daily run time, `HH:MM` (default `02:00`)
//! - `PORTAINER_TIMEZONE`: IANA zone for the schedule and backup names (default `UTC`)
//! - `PORTAINER_OUTPUT_DIR`: report directory (default `./docs`)
//! - `PORTAINER_OUTPUT_FORMAT`: `markdown` or `json` (default `markdown`)
//! - `PORTAINER_INCLUDE_*`: per-section switches (default on)
//! - `PORTAINER_HTTP_TIMEOUT_SECS`: per-request timeout (default 30, minimum 1)
//! - `PORTAINER_VERBOSE`: debug logging
//! - `PORTAINER_CONFIG_FILE`: path of the config file

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use clap::Parser;
use documenter_std::env::ReadEnv;
use documenter_std::fs::ReadFile;
use serde::Deserialize;
use tracing::warn;

use crate::{
    document::Sections,
    error::ConfigError,
    schedule::ScheduleSpec,
    targets::{Target, TargetConfig, TargetsSource, load_targets},
};

pub const DEFAULT_SCHEDULE_TIME: &str = "02:00";
pub const DEFAULT_TIMEZONE: &str = "UTC";
pub const DEFAULT_OUTPUT_DIR: &str = "./docs";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
const MIN_HTTP_TIMEOUT_SECS: u64 = 1;

const ENV_HOSTS: &str = "PORTAINER_HOSTS";
const ENV_URL: &str = "PORTAINER_URL";
const ENV_NAME: &str = "PORTAINER_NAME";
const ENV_TOKEN: &str = "PORTAINER_TOKEN";
const ENV_USERNAME: &str = "PORTAINER_USERNAME";
const ENV_PASSWORD: &str = "PORTAINER_PASSWORD";
const ENV_SCHEDULE_TIME: &str = "PORTAINER_SCHEDULE_TIME";
const ENV_TIMEZONE: &str = "PORTAINER_TIMEZONE";
const ENV_OUTPUT_DIR: &str = "PORTAINER_OUTPUT_DIR";
const ENV_OUTPUT_FORMAT: &str = "PORTAINER_OUTPUT_FORMAT";
const ENV_HTTP_TIMEOUT_SECS: &str = "PORTAINER_HTTP_TIMEOUT_SECS";
const ENV_VERBOSE: &str = "PORTAINER_VERBOSE";
const ENV_CONFIG_FILE: &str = "PORTAINER_CONFIG_FILE";
const ENV_INCLUDE_COMPOSE_FILES: &str = "PORTAINER_INCLUDE_COMPOSE_FILES";
const ENV_INCLUDE_TEMPLATES: &str = "PORTAINER_INCLUDE_TEMPLATES";
const ENV_INCLUDE_REGISTRIES: &str = "PORTAINER_INCLUDE_REGISTRIES";
const ENV_INCLUDE_AUTH_SETTINGS: &str = "PORTAINER_INCLUDE_AUTH_SETTINGS";
const ENV_INCLUDE_LICENSE_INFO: &str = "PORTAINER_INCLUDE_LICENSE_INFO";
const ENV_INCLUDE_USERS_TEAMS: &str = "PORTAINER_INCLUDE_USERS_TEAMS";

#[derive(Parser, Debug, Default)]
#[command(name = "portainer-documenter")]
#[command(about = "Scheduled documentation snapshots of Portainer instances", long_about = None)]
pub struct Args {
    /// JSON or YAML configuration file.
    #[arg(long = "config")]
    pub config: Option<PathBuf>,

    /// Run a single pass over all targets and exit.
    #[arg(long)]
    pub once: bool,

    /// Enable debug logging.
    #[arg(long, short)]
    pub verbose: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Markdown,
    Json,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Markdown => "md",
            Self::Json => "json",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "markdown" | "md" => Ok(Self::Markdown),
            "json" => Ok(Self::Json),
            _ => Err(ConfigError::InvalidOutputFormat(s.to_string())),
        }
    }
}

/// Fully validated service configuration.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub targets: Vec<Target>,
    pub schedule: ScheduleSpec,
    pub output_dir: PathBuf,
    pub output_format: OutputFormat,
    pub sections: Sections,
    pub http_timeout: Duration,
    pub verbose: bool,
    pub once: bool,
}

/// `{output_dir}/{name}-docs.{ext}`.
pub fn output_path(output_dir: &Path, target: &Target, format: OutputFormat) -> PathBuf {
    output_dir.join(format!("{}-docs.{}", target.name(), format.extension()))
}

/// Keys accepted in the configuration file.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileConfig {
    hosts: Option<Vec<TargetConfig>>,
    name: Option<String>,
    #[serde(alias = "portainer_url")]
    url: Option<String>,
    token: Option<String>,
    username: Option<String>,
    password: Option<String>,
    #[serde(alias = "portainer_schedule_time")]
    schedule_time: Option<String>,
    #[serde(alias = "portainer_timezone")]
    timezone: Option<String>,
    #[serde(alias = "portainer_output_dir")]
    output_dir: Option<String>,
    output_format: Option<String>,
    include_compose_files: Option<bool>,
    include_templates: Option<bool>,
    include_registries: Option<bool>,
    include_auth_settings: Option<bool>,
    include_license_info: Option<bool>,
    include_users_teams: Option<bool>,
    http_timeout_secs: Option<u64>,
    verbose: Option<bool>,
}

pub fn from_args<E: ReadEnv, F: ReadFile>(
    args: Args,
    env: &E,
    fs: &F,
) -> Result<ServiceConfig, ConfigError> {
    let file = match config_file_path(&args, env) {
        Some(path) => read_file_config(fs, &path)?,
        None => FileConfig::default(),
    };

    let targets = load_targets(targets_source(env, &file)?)?;

    let schedule_time = env
        .non_empty(ENV_SCHEDULE_TIME)
        .or(file.schedule_time.clone())
        .unwrap_or_else(|| DEFAULT_SCHEDULE_TIME.to_string());
    let timezone = env
        .non_empty(ENV_TIMEZONE)
        .or(file.timezone.clone())
        .unwrap_or_else(|| DEFAULT_TIMEZONE.to_string());
    let schedule = ScheduleSpec::parse(&schedule_time, &timezone)?;

    let output_format = match env.non_empty(ENV_OUTPUT_FORMAT).or(file.output_format.clone()) {
        Some(raw) => raw.parse()?,
        None => OutputFormat::default(),
    };

    let output_dir = env
        .non_empty(ENV_OUTPUT_DIR)
        .or(file.output_dir.clone())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR));

    let include = |key: &str, from_file: Option<bool>| env.flag(key).or(from_file).unwrap_or(true);
    let sections = Sections {
        compose_files: include(ENV_INCLUDE_COMPOSE_FILES, file.include_compose_files),
        templates: include(ENV_INCLUDE_TEMPLATES, file.include_templates),
        registries: include(ENV_INCLUDE_REGISTRIES, file.include_registries),
        auth_settings: include(ENV_INCLUDE_AUTH_SETTINGS, file.include_auth_settings),
        license_info: include(ENV_INCLUDE_LICENSE_INFO, file.include_license_info),
        users_teams: include(ENV_INCLUDE_USERS_TEAMS, file.include_users_teams),
    };

    Ok(ServiceConfig {
        targets,
        schedule,
        output_dir,
        output_format,
        sections,
        http_timeout: http_timeout(env, file.http_timeout_secs),
        verbose: args.verbose || env.flag(ENV_VERBOSE).or(file.verbose).unwrap_or(false),
        once: args.once,
    })
}

/// Whether debug logging was requested, readable before the full config so
/// logging can be initialized first.
///
/// Follows the same precedence as [`from_args`]. A config file that cannot be
/// read or parsed contributes nothing here; [`from_args`] reports it.
pub fn verbose_requested<E: ReadEnv, F: ReadFile>(args: &Args, env: &E, fs: &F) -> bool {
    if args.verbose {
        return true;
    }
    let from_file = config_file_path(args, env)
        .and_then(|path| read_file_config(fs, &path).ok())
        .and_then(|file| file.verbose);
    env.flag(ENV_VERBOSE).or(from_file).unwrap_or(false)
}

fn config_file_path<E: ReadEnv>(args: &Args, env: &E) -> Option<PathBuf> {
    args.config
        .clone()
        .or_else(|| env.non_empty(ENV_CONFIG_FILE).map(PathBuf::from))
}

fn targets_source<E: ReadEnv>(env: &E, file: &FileConfig) -> Result<TargetsSource, ConfigError> {
    if let Some(raw) = env.non_empty(ENV_HOSTS) {
        return TargetsSource::from_json(&raw);
    }
    if let Some(hosts) = &file.hosts {
        return Ok(TargetsSource::Many(hosts.clone()));
    }

    let legacy = TargetConfig {
        name: env.non_empty(ENV_NAME).or(file.name.clone()),
        url: env.non_empty(ENV_URL).or(file.url.clone()),
        token: env.raw_non_empty(ENV_TOKEN).or(file.token.clone()),
        username: env.raw_non_empty(ENV_USERNAME).or(file.username.clone()),
        password: env.raw_non_empty(ENV_PASSWORD).or(file.password.clone()),
    };
    let has_any = legacy.url.is_some()
        || legacy.token.is_some()
        || legacy.username.is_some()
        || legacy.password.is_some();
    if !has_any {
        return Err(ConfigError::NoTargets);
    }
    Ok(TargetsSource::Legacy(legacy))
}

fn read_file_config<F: ReadFile>(fs: &F, path: &Path) -> Result<FileConfig, ConfigError> {
    let raw = fs
        .read_to_string(path)
        .map_err(|source| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
    let parse_error = |reason: String| ConfigError::ParseFile {
        path: path.to_path_buf(),
        reason,
    };

    let is_yaml = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("yml") || e.eq_ignore_ascii_case("yaml"));
    if is_yaml {
        serde_yaml::from_str(&raw).map_err(|e| parse_error(e.to_string()))
    } else {
        serde_json::from_str(&raw).map_err(|e| parse_error(e.to_string()))
    }
}

fn http_timeout<E: ReadEnv>(env: &E, from_file: Option<u64>) -> Duration {
    let default = Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS);
    let secs = match env.non_empty(ENV_HTTP_TIMEOUT_SECS) {
        Some(raw) => match raw.parse::<u64>() {
            Ok(secs) => secs,
            Err(_) => {
                warn!("{ENV_HTTP_TIMEOUT_SECS}={raw:?} is not a valid integer, using default");
                return default;
            }
        },
        None => match from_file {
            Some(secs) => secs,
            None => return default,
        },
    };

    if secs < MIN_HTTP_TIMEOUT_SECS {
        warn!("HTTP timeout of {secs}s is below minimum ({MIN_HTTP_TIMEOUT_SECS}), using default");
        return default;
    }
    Duration::from_secs(secs)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveTime;
    use documenter_std::env::InMemoryEnv;
    use documenter_std::fs::MemFs;

    use super::*;
    use crate::targets::Auth;

    fn legacy_env() -> InMemoryEnv {
        InMemoryEnv::from_pairs([
            (ENV_URL, "https://portainer.example.com"),
            (ENV_TOKEN, "ptr_token"),
        ])
    }

    fn load(env: &InMemoryEnv) -> Result<ServiceConfig, ConfigError> {
        from_args(Args::default(), env, &MemFs::new())
    }

    #[test]
    fn defaults_with_legacy_target() {
        let config = load(&legacy_env()).unwrap();

        assert_eq!(config.targets.len(), 1);
        assert_eq!(config.targets[0].name(), "default");
        assert_eq!(config.schedule.time_of_day(), NaiveTime::from_hms_opt(2, 0, 0).unwrap());
        assert_eq!(config.schedule.timezone(), chrono_tz::UTC);
        assert_eq!(config.output_dir, PathBuf::from(DEFAULT_OUTPUT_DIR));
        assert_eq!(config.output_format, OutputFormat::Markdown);
        assert_eq!(config.sections, Sections::default());
        assert_eq!(config.http_timeout, Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS));
        assert!(!config.verbose);
        assert!(!config.once);
    }

    #[test]
    fn reads_all_env_vars() {
        let env = legacy_env();
        env.set(ENV_SCHEDULE_TIME, "23:15");
        env.set(ENV_TIMEZONE, "Europe/Berlin");
        env.set(ENV_OUTPUT_DIR, "/srv/docs");
        env.set(ENV_OUTPUT_FORMAT, "JSON");
        env.set(ENV_INCLUDE_COMPOSE_FILES, "false");
        env.set(ENV_INCLUDE_USERS_TEAMS, "0");
        env.set(ENV_HTTP_TIMEOUT_SECS, "5");
        env.set(ENV_VERBOSE, "yes");

        let config = load(&env).unwrap();

        assert_eq!(config.schedule.to_string(), "daily at 23:15 Europe/Berlin");
        assert_eq!(config.output_dir, PathBuf::from("/srv/docs"));
        assert_eq!(config.output_format, OutputFormat::Json);
        assert!(!config.sections.compose_files);
        assert!(!config.sections.users_teams);
        assert!(config.sections.templates);
        assert_eq!(config.http_timeout, Duration::from_secs(5));
        assert!(config.verbose);
    }

    #[test]
    fn host_list_wins_over_legacy_fields() {
        let env = legacy_env();
        env.set(
            ENV_HOSTS,
            r#"[{"name":"a","url":"https://a.example.com","token":"t1"},
                {"name":"b","url":"https://b.example.com","username":"u","password":"p"}]"#,
        );

        let config = load(&env).unwrap();

        let names: Vec<_> = config.targets.iter().map(Target::name).collect();
        assert_eq!(names, ["a", "b"]);
        assert!(matches!(config.targets[1].auth(), Auth::Basic { .. }));
    }

    #[test]
    fn no_targets_is_an_error() {
        let err = load(&InMemoryEnv::new()).unwrap_err();
        assert!(matches!(err, ConfigError::NoTargets));
    }

    #[test]
    fn invalid_schedule_fails_fast() {
        let env = legacy_env();
        env.set(ENV_SCHEDULE_TIME, "25:00");
        assert!(matches!(load(&env), Err(ConfigError::InvalidScheduleTime { .. })));

        env.set(ENV_SCHEDULE_TIME, "02:00");
        env.set(ENV_TIMEZONE, "Nowhere/Special");
        assert!(matches!(load(&env), Err(ConfigError::UnknownTimezone(_))));
    }

    #[test]
    fn invalid_output_format_fails_fast() {
        let env = legacy_env();
        env.set(ENV_OUTPUT_FORMAT, "pdf");
        assert!(matches!(load(&env), Err(ConfigError::InvalidOutputFormat(_))));
    }

    #[test]
    fn invalid_timeouts_fall_back_to_default() {
        let env = legacy_env();
        env.set(ENV_HTTP_TIMEOUT_SECS, "0");
        assert_eq!(load(&env).unwrap().http_timeout, Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS));

        env.set(ENV_HTTP_TIMEOUT_SECS, "soon");
        assert_eq!(load(&env).unwrap().http_timeout, Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS));
    }

    #[test]
    fn yaml_file_is_layered_under_env() {
        let fs = MemFs::new();
        fs.insert(
            "/etc/documenter.yaml",
            "hosts:\n  - name: lab\n    url: http://lab:9000\n    token: ptr_lab\n\
             schedule_time: \"04:30\"\noutput_format: json\ninclude_registries: false\n",
        );
        let env = InMemoryEnv::from_pairs([(ENV_SCHEDULE_TIME, "05:45")]);
        let args = Args {
            config: Some(PathBuf::from("/etc/documenter.yaml")),
            ..Default::default()
        };

        let config = from_args(args, &env, &fs).unwrap();

        assert_eq!(config.targets[0].name(), "lab");
        assert_eq!(config.schedule.time_of_day(), NaiveTime::from_hms_opt(5, 45, 0).unwrap());
        assert_eq!(config.output_format, OutputFormat::Json);
        assert!(!config.sections.registries);
    }

    #[test]
    fn json_file_accepts_legacy_keys() {
        let fs = MemFs::new();
        fs.insert(
            "config.json",
            r#"{"portainer_url": "https://p.example.com", "username": "admin", "password": "pw"}"#,
        );
        let env = InMemoryEnv::from_pairs([(ENV_CONFIG_FILE, "config.json")]);

        let config = from_args(Args::default(), &env, &fs).unwrap();

        assert_eq!(config.targets[0].api_root(), "https://p.example.com");
    }

    #[test]
    fn missing_config_file_is_an_error() {
        let args = Args {
            config: Some(PathBuf::from("missing.json")),
            ..Default::default()
        };
        let err = from_args(args, &legacy_env(), &MemFs::new()).unwrap_err();
        assert!(matches!(err, ConfigError::ReadFile { .. }));
    }

    #[test]
    fn output_path_uses_name_and_extension() {
        let config = load(&legacy_env()).unwrap();
        let target = &config.targets[0];
        assert_eq!(
            output_path(Path::new("/srv/docs"), target, OutputFormat::Markdown),
            PathBuf::from("/srv/docs/default-docs.md")
        );
        assert_eq!(
            output_path(Path::new("/srv/docs"), target, OutputFormat::Json),
            PathBuf::from("/srv/docs/default-docs.json")
        );
    }

    #[test]
    fn verbose_can_be_requested_before_full_load() {
        let env = InMemoryEnv::from_pairs([(ENV_VERBOSE, "on")]);
        assert!(verbose_requested(&Args::default(), &env, &MemFs::new()));
        assert!(!verbose_requested(&Args::default(), &InMemoryEnv::new(), &MemFs::new()));
    }

    #[test]
    fn early_verbose_check_reads_config_file() {
        let fs = MemFs::new();
        fs.insert(
            "/etc/documenter.json",
            r#"{"url": "https://p.example.com", "token": "t", "verbose": true}"#,
        );
        let env = InMemoryEnv::from_pairs([(ENV_CONFIG_FILE, "/etc/documenter.json")]);

        assert!(verbose_requested(&Args::default(), &env, &fs));
        assert!(from_args(Args::default(), &env, &fs).unwrap().verbose);

        env.set(ENV_VERBOSE, "off");
        assert!(!verbose_requested(&Args::default(), &env, &fs));
        assert!(!from_args(Args::default(), &env, &fs).unwrap().verbose);
    }

    #[test]
    fn early_verbose_check_ignores_unreadable_file() {
        let env = InMemoryEnv::from_pairs([(ENV_CONFIG_FILE, "/missing.yaml")]);
        assert!(!verbose_requested(&Args::default(), &env, &MemFs::new()));
    }

    #[test]
    fn legacy_env_credentials_keep_whitespace() {
        let env = InMemoryEnv::from_pairs([
            (ENV_URL, "https://portainer.example.com"),
            (ENV_USERNAME, "admin"),
            (ENV_PASSWORD, " pass with edges "),
        ]);

        let config = load(&env).unwrap();

        assert_eq!(config.targets[0].auth(), &Auth::Basic {
            username: "admin".to_string(),
            password: " pass with edges ".to_string(),
        });
    }
}
