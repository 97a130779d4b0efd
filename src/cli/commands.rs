//! Command dispatch for the clearsel binary.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::str::FromStr;

use clap::CommandFactory;
use clap_complete::generate;
use itertools::Itertools;
use tracing::{debug, instrument};

use crate::application::{ActionPanel, HeaderControl, LevelView, SelectionStore, TreeNodeConvert};
use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::output;
use crate::cli::{CliError, CliResult};
use crate::config::{global_config_path, local_config_path, Settings};
use crate::domain::{CascadeReport, NodeId};
use crate::infrastructure::{InfraError, ServiceContainer};

/// One replayed selection gesture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Gesture {
    /// Click a row; the value follows from its indicator
    Click(NodeId),
    Set(NodeId, bool),
    /// Click the header
    ClickAll,
    SetAll(bool),
}

fn parse_switch(value: &str, gesture: &str) -> CliResult<bool> {
    match value.to_ascii_lowercase().as_str() {
        "on" | "true" | "1" => Ok(true),
        "off" | "false" | "0" => Ok(false),
        _ => Err(CliError::InvalidArgs(format!(
            "gesture '{gesture}': expected on or off after '='"
        ))),
    }
}

impl FromStr for Gesture {
    type Err = CliError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (target, value) = match s.split_once('=') {
            Some((target, value)) => (target.trim(), Some(parse_switch(value.trim(), s)?)),
            None => (s.trim(), None),
        };
        if target.is_empty() {
            return Err(CliError::InvalidArgs(format!("gesture '{s}': missing node id")));
        }
        Ok(match (target, value) {
            ("*", None) => Gesture::ClickAll,
            ("*", Some(v)) => Gesture::SetAll(v),
            (id, None) => Gesture::Click(NodeId::from(id)),
            (id, Some(v)) => Gesture::Set(NodeId::from(id), v),
        })
    }
}

impl fmt::Display for Gesture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let switch = |v: bool| if v { "on" } else { "off" };
        match self {
            Gesture::Click(id) => write!(f, "{id}"),
            Gesture::Set(id, v) => write!(f, "{id}={}", switch(*v)),
            Gesture::ClickAll => f.write_str("*"),
            Gesture::SetAll(v) => write!(f, "*={}", switch(*v)),
        }
    }
}

/// The widgets a workstation session keeps alive.
struct Session {
    store: Rc<SelectionStore>,
    funds: Rc<LevelView>,
    header: Rc<HeaderControl>,
    panel: Rc<ActionPanel>,
}

impl Session {
    fn open(container: &ServiceContainer, file: Option<&Path>) -> CliResult<Self> {
        let store = container.open_store(file)?;
        let funds = LevelView::open(&store, None)?;
        let header = HeaderControl::attach(&store);
        let panel = ActionPanel::attach(&store, container.settings.actions.clone());
        Ok(Self {
            store,
            funds,
            header,
            panel,
        })
    }

    fn apply(&self, gesture: &Gesture) -> CliResult<CascadeReport> {
        let report = match gesture {
            Gesture::Click(id) => self.funds.reveal(id)?.click(id)?,
            Gesture::Set(id, value) => self.funds.reveal(id)?.set(id, *value)?,
            Gesture::ClickAll => self.header.click()?,
            Gesture::SetAll(value) => self.store.toggle_all(self.header.view_id(), *value)?,
        };
        Ok(report)
    }
}

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    let project_dir = match &cli.project_dir {
        Some(dir) => dir.clone(),
        None => std::env::current_dir().map_err(|e| InfraError::io("resolve current directory", e))?,
    };
    let project_dir = Some(project_dir.as_path());

    match &cli.command {
        Some(Commands::Completion { shell }) => {
            let mut cmd = Cli::command();
            generate(*shell, &mut cmd, "clearsel", &mut io::stdout());
            Ok(())
        }
        Some(Commands::Config { command }) => {
            let settings = Settings::load(project_dir)?;
            cmd_config(command, &settings, project_dir)
        }
        Some(Commands::Show { file }) => {
            let container = container(project_dir)?;
            cmd_show(&container, file.as_deref())
        }
        Some(Commands::Toggle { file, gestures }) => {
            let container = container(project_dir)?;
            cmd_toggle(&container, file.as_deref(), gestures)
        }
        Some(Commands::Stats { file }) => {
            let container = container(project_dir)?;
            cmd_stats(&container, file.as_deref())
        }
        None => Err(CliError::Usage(
            "no command given, run `clearsel --help`".into(),
        )),
    }
}

fn container(project_dir: Option<&Path>) -> CliResult<ServiceContainer> {
    let settings = Settings::load(project_dir)?;
    Ok(ServiceContainer::new(settings))
}

#[instrument(level = "debug", skip(container))]
fn cmd_show(container: &ServiceContainer, file: Option<&Path>) -> CliResult<()> {
    let store = container.open_store(file)?;
    let tree = store.read(|forest| forest.to_tree_string(&container.settings.display));
    output::info(&tree);
    Ok(())
}

#[instrument(level = "debug", skip(container))]
fn cmd_toggle(container: &ServiceContainer, file: Option<&Path>, gestures: &[String]) -> CliResult<()> {
    let gestures: Vec<Gesture> = gestures
        .iter()
        .map(|g| g.parse())
        .collect::<CliResult<_>>()?;
    let session = Session::open(container, file)?;

    for gesture in &gestures {
        let report = session.apply(gesture)?;
        debug!(%gesture, visited = report.visited, "gesture applied");
        if report.is_noop() {
            output::detail(&format!("{gesture}: no change"));
        } else {
            output::action(
                &gesture.to_string(),
                &format!("{} changed ({})", report.changed.len(), report.changed.iter().join(", ")),
            );
        }
    }

    print_session(container, &session);
    Ok(())
}

#[instrument(level = "debug", skip(container))]
fn cmd_stats(container: &ServiceContainer, file: Option<&Path>) -> CliResult<()> {
    let session = Session::open(container, file)?;
    output::header(&format!(
        "header: {} ({})",
        session.header.state(),
        session.header.title()
    ));
    output::info(&session.panel.summary_line());
    print_actions(&session.panel);
    Ok(())
}

fn print_session(container: &ServiceContainer, session: &Session) {
    let tree = session
        .store
        .read(|forest| forest.to_tree_string(&container.settings.display));
    output::info(&tree);
    output::header(&format!(
        "header: {} ({})",
        session.header.state(),
        session.header.title()
    ));
    output::info(&session.panel.summary_line());
}

fn print_actions(panel: &ActionPanel) {
    for action in panel.actions() {
        let line = format!("{} [{}]", action.spec.label, action.spec.key);
        if action.enabled {
            output::success_detail(&line);
        } else {
            output::failure(&line);
        }
    }
}

fn cmd_config(command: &ConfigCommands, settings: &Settings, project_dir: Option<&Path>) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            output::info(&settings.to_toml()?);
        }
        ConfigCommands::Template => {
            output::info(&Settings::template());
        }
        ConfigCommands::Path => {
            print_config_path("global", global_config_path());
            print_config_path("local", project_dir.map(local_config_path));
        }
    }
    Ok(())
}

fn print_config_path(scope: &str, path: Option<PathBuf>) {
    match path {
        Some(path) if path.exists() => output::action(scope, &path.display()),
        Some(path) => output::action(scope, &format!("{} (not found)", path.display())),
        None => output::warning(&format!("no {scope} config location")),
    }
}
