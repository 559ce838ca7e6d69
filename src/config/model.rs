// src/config/model.rs

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Deserialize;

use crate::types::StepKind;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [site]
/// output = "_site"
///
/// [bundle]
/// include = ["js/**/*.js"]
/// exclude = ["js/**/*.min.js"]
/// output = "js/main.min.js"
///
/// [generate]
/// cmd = "bundle exec jekyll build"
///
/// [task.generate]
/// kind = "generate"
/// after = ["bundle"]
/// ```
///
/// All sections are optional and have defaults matching a Jekyll blog layout.
/// If no `[task.<name>]` section is present the built-in task graph from
/// [`default_tasks`] is used.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub site: SiteSection,

    #[serde(default)]
    pub clean: CleanSection,

    #[serde(default)]
    pub bundle: BundleSection,

    #[serde(default)]
    pub generate: GenerateSection,

    #[serde(default)]
    pub serve: ServeSection,

    #[serde(default)]
    pub watch: WatchSection,

    /// All tasks from `[task.<name>]`, keyed by task name.
    #[serde(default)]
    pub task: BTreeMap<String, TaskConfig>,
}

/// Validated configuration.
///
/// Only constructible through `TryFrom<RawConfigFile>` (see `validate.rs`),
/// so holders can rely on the task graph being acyclic and complete.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    site: SiteSection,
    clean: CleanSection,
    bundle: BundleSection,
    generate: GenerateSection,
    serve: ServeSection,
    watch: WatchSection,
    task: BTreeMap<String, TaskConfig>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(raw: RawConfigFile) -> Self {
        Self {
            site: raw.site,
            clean: raw.clean,
            bundle: raw.bundle,
            generate: raw.generate,
            serve: raw.serve,
            watch: raw.watch,
            task: raw.task,
        }
    }

    pub fn site(&self) -> &SiteSection {
        &self.site
    }

    pub fn clean(&self) -> &CleanSection {
        &self.clean
    }

    pub fn bundle(&self) -> &BundleSection {
        &self.bundle
    }

    pub fn generate(&self) -> &GenerateSection {
        &self.generate
    }

    pub fn serve(&self) -> &ServeSection {
        &self.serve
    }

    pub fn watch(&self) -> &WatchSection {
        &self.watch
    }

    pub fn tasks(&self) -> &BTreeMap<String, TaskConfig> {
        &self.task
    }
}

/// `[site]` section: where the project lives and where the generator writes.
#[derive(Debug, Clone, Deserialize)]
pub struct SiteSection {
    /// Project root, relative to the directory holding the config file.
    #[serde(default = "default_root")]
    pub root: PathBuf,

    /// Generated site directory (served by `serve`).
    #[serde(default = "default_output")]
    pub output: PathBuf,

    /// Cache directory the generator leaves behind.
    #[serde(default = "default_cache")]
    pub cache: PathBuf,
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_output() -> PathBuf {
    PathBuf::from("_site")
}

fn default_cache() -> PathBuf {
    PathBuf::from(".sass-cache")
}

impl Default for SiteSection {
    fn default() -> Self {
        Self {
            root: default_root(),
            output: default_output(),
            cache: default_cache(),
        }
    }
}

/// `[clean]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct CleanSection {
    /// Literal paths or globs, relative to the project root.
    #[serde(default = "default_clean_paths")]
    pub paths: Vec<String>,
}

fn default_clean_paths() -> Vec<String> {
    vec![
        "_site".to_string(),
        ".sass-cache".to_string(),
        "js/main.min.js".to_string(),
        "js/**/*.min.js".to_string(),
    ]
}

impl Default for CleanSection {
    fn default() -> Self {
        Self {
            paths: default_clean_paths(),
        }
    }
}

/// `[bundle]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct BundleSection {
    /// Ordered include globs. Resolution order follows this list.
    #[serde(default = "default_bundle_include")]
    pub include: Vec<String>,

    /// Exclude globs applied after `include`.
    #[serde(default = "default_bundle_exclude")]
    pub exclude: Vec<String>,

    /// Bundle file, relative to the project root. Never part of its own input.
    #[serde(default = "default_bundle_output")]
    pub output: PathBuf,

    /// When false the concatenated text is written unchanged.
    #[serde(default = "default_true")]
    pub minify: bool,
}

fn default_bundle_include() -> Vec<String> {
    vec!["js/**/*.js".to_string()]
}

fn default_bundle_exclude() -> Vec<String> {
    vec!["js/**/*.min.js".to_string()]
}

fn default_bundle_output() -> PathBuf {
    PathBuf::from("js/main.min.js")
}

fn default_true() -> bool {
    true
}

impl Default for BundleSection {
    fn default() -> Self {
        Self {
            include: default_bundle_include(),
            exclude: default_bundle_exclude(),
            output: default_bundle_output(),
            minify: true,
        }
    }
}

/// `[generate]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateSection {
    /// Shell command that builds the site.
    #[serde(default = "default_generate_cmd")]
    pub cmd: String,

    /// Working directory for the command, relative to the project root.
    #[serde(default)]
    pub cwd: Option<PathBuf>,
}

fn default_generate_cmd() -> String {
    "jekyll build".to_string()
}

impl Default for GenerateSection {
    fn default() -> Self {
        Self {
            cmd: default_generate_cmd(),
            cwd: None,
        }
    }
}

/// `[serve]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ServeSection {
    #[serde(default = "default_host")]
    pub host: String,

    /// First port to try. `0` asks the OS for an ephemeral port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// How many successive ports to try when `port` is taken.
    #[serde(default = "default_port_retries")]
    pub port_retries: u16,

    /// Inject the live-reload client into served HTML pages.
    #[serde(default = "default_true")]
    pub inject_reload_script: bool,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_port_retries() -> u16 {
    10
}

impl Default for ServeSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            port_retries: default_port_retries(),
            inject_reload_script: true,
        }
    }
}

/// `[watch]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct WatchSection {
    /// Source globs, relative to the project root.
    #[serde(default = "default_watch_paths")]
    pub paths: Vec<String>,

    /// Globs that never trigger a rebuild. The bundle output, site output and
    /// cache directory are always excluded on top of these.
    #[serde(default)]
    pub exclude: Vec<String>,

    /// Quiet period before a rebuild starts, in milliseconds.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Task run (with its predecessors) for every batch of changes.
    #[serde(default = "default_watch_run")]
    pub run: String,
}

fn default_watch_paths() -> Vec<String> {
    [
        "js/**/*.js",
        "_posts/**",
        "_layouts/**",
        "_includes/**",
        "_sass/**",
        "_data/**",
        "css/**",
        "*.html",
        "*.md",
        "_config.yml",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_debounce_ms() -> u64 {
    150
}

fn default_watch_run() -> String {
    "reload".to_string()
}

impl Default for WatchSection {
    fn default() -> Self {
        Self {
            paths: default_watch_paths(),
            exclude: Vec::new(),
            debounce_ms: default_debounce_ms(),
            run: default_watch_run(),
        }
    }
}

/// `[task.<name>]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskConfig {
    /// Which step this task runs.
    pub kind: StepKind,

    /// Predecessors, run left to right before this task.
    #[serde(default)]
    pub after: Vec<String>,

    /// Shell command for `kind = "command"`.
    #[serde(default)]
    pub cmd: Option<String>,
}

impl TaskConfig {
    pub fn new(kind: StepKind) -> Self {
        Self {
            kind,
            after: Vec::new(),
            cmd: None,
        }
    }

    pub fn after<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.after.extend(deps.into_iter().map(Into::into));
        self
    }
}

/// Built-in task graph used when the config defines no tasks.
///
/// ```text
/// default = clean, generate(bundle), serve, watch
/// reload  = generate(bundle), reload   (what the watcher runs)
/// ```
pub fn default_tasks() -> BTreeMap<String, TaskConfig> {
    let mut tasks = BTreeMap::new();
    tasks.insert("clean".to_string(), TaskConfig::new(StepKind::Clean));
    tasks.insert("bundle".to_string(), TaskConfig::new(StepKind::Bundle));
    tasks.insert(
        "generate".to_string(),
        TaskConfig::new(StepKind::Generate).after(["bundle"]),
    );
    tasks.insert(
        "reload".to_string(),
        TaskConfig::new(StepKind::Reload).after(["generate"]),
    );
    tasks.insert("serve".to_string(), TaskConfig::new(StepKind::Serve));
    tasks.insert("watch".to_string(), TaskConfig::new(StepKind::Watch));
    tasks.insert(
        "default".to_string(),
        TaskConfig::new(StepKind::Group).after(["clean", "generate", "serve", "watch"]),
    );
    tasks
}
