//! Namespace handlers and the registration table that discovers them
//!
//! A namespace is the part of a command string before the colon. Each one
//! is backed by a `Handler` built fresh from the raw argument list; the
//! dispatcher only sees namespaces through `NamespaceSource`.

use tracing::debug;

use crate::cli::output;
use crate::error::{CommandError, CommandResult};

/// Per-namespace command implementation.
pub trait Handler {
    /// Names of the actions this handler responds to.
    fn actions(&self) -> &'static [&'static str];

    fn responds_to(&self, action: &str) -> bool {
        self.actions().iter().any(|name| *name == action)
    }

    /// Run a named action. Arguments were captured at construction.
    fn invoke(&mut self, action: &str) -> CommandResult<()>;
}

/// Builds a handler from the raw argument list.
pub type HandlerFactory = fn(Vec<String>) -> Box<dyn Handler>;

/// Source of namespace definitions, one per namespace identifier.
pub trait NamespaceSource: Send + Sync {
    /// Identifiers of all installed namespaces.
    fn list(&self) -> Vec<String>;

    /// Definition for `namespace`, `None` when it is not installed.
    fn load(&self, namespace: &str) -> Option<HandlerFactory>;
}

/// Explicit registration table mapping namespace identifiers to factories.
#[derive(Default, Clone)]
pub struct NamespaceRegistry {
    entries: Vec<(String, HandlerFactory)>,
}

impl NamespaceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the namespaces that need no remote service.
    pub fn builtin() -> Self {
        Self::new()
            .register("help", HelpHandler::build)
            .register("version", VersionHandler::build)
    }

    /// Add a namespace; registering an existing name replaces its factory.
    pub fn register(mut self, namespace: impl Into<String>, factory: HandlerFactory) -> Self {
        let namespace = namespace.into();
        match self.entries.iter_mut().find(|(name, _)| *name == namespace) {
            Some(entry) => entry.1 = factory,
            None => self.entries.push((namespace, factory)),
        }
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl NamespaceSource for NamespaceRegistry {
    fn list(&self) -> Vec<String> {
        self.entries.iter().map(|(name, _)| name.clone()).collect()
    }

    fn load(&self, namespace: &str) -> Option<HandlerFactory> {
        self.entries
            .iter()
            .find(|(name, _)| name == namespace)
            .map(|(_, factory)| *factory)
    }
}

const USAGE: &str = "\
Usage: heroku COMMAND[:ACTION] [ARGS...]

  heroku help                 show this usage text
  heroku version              show the client version
  heroku NAMESPACE            run the namespace's default action
  heroku NAMESPACE:ACTION     run an action within a namespace
  heroku ACTION               run an action on the app namespace";

/// `help` namespace.
pub struct HelpHandler {
    args: Vec<String>,
}

impl HelpHandler {
    fn build(args: Vec<String>) -> Box<dyn Handler> {
        Box::new(Self { args })
    }
}

impl Handler for HelpHandler {
    fn actions(&self) -> &'static [&'static str] {
        &["index"]
    }

    fn invoke(&mut self, action: &str) -> CommandResult<()> {
        match action {
            "index" => {
                debug!("help args: {:?}", self.args);
                output::info(USAGE);
                Ok(())
            }
            _ => Err(CommandError::InvalidCommand),
        }
    }
}

/// `version` namespace.
pub struct VersionHandler;

impl VersionHandler {
    fn build(_args: Vec<String>) -> Box<dyn Handler> {
        Box::new(Self)
    }

    pub fn version_line() -> String {
        format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
    }
}

impl Handler for VersionHandler {
    fn actions(&self) -> &'static [&'static str] {
        &["index"]
    }

    fn invoke(&mut self, action: &str) -> CommandResult<()> {
        match action {
            "index" => {
                output::info(&Self::version_line());
                Ok(())
            }
            _ => Err(CommandError::InvalidCommand),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Noop;

    impl Handler for Noop {
        fn actions(&self) -> &'static [&'static str] {
            &["index", "list"]
        }

        fn invoke(&mut self, _action: &str) -> CommandResult<()> {
            Ok(())
        }
    }

    fn noop(_args: Vec<String>) -> Box<dyn Handler> {
        Box::new(Noop)
    }

    fn version_only(_args: Vec<String>) -> Box<dyn Handler> {
        Box::new(VersionHandler)
    }

    #[test]
    fn given_builtin_registry_then_lists_help_and_version() {
        let registry = NamespaceRegistry::builtin();
        assert_eq!(registry.list(), vec!["help".to_string(), "version".to_string()]);
        assert!(registry.load("help").is_some());
        assert!(registry.load("app").is_none());
    }

    #[test]
    fn given_registered_name_when_registering_again_then_replaces_factory() {
        let registry = NamespaceRegistry::new()
            .register("app", noop)
            .register("app", version_only);

        assert_eq!(registry.len(), 1);
        let handler = (registry.load("app").unwrap())(vec![]);
        assert_eq!(handler.actions(), &["index"]);
    }

    #[test]
    fn given_handler_when_checking_actions_then_responds_only_to_declared() {
        let handler = noop(vec![]);
        assert!(handler.responds_to("list"));
        assert!(!handler.responds_to("destroy"));
    }

    #[test]
    fn given_version_handler_then_line_has_crate_version() {
        assert!(VersionHandler::version_line().ends_with(env!("CARGO_PKG_VERSION")));
        let mut handler = VersionHandler;
        assert!(matches!(
            handler.invoke("bogus"),
            Err(CommandError::InvalidCommand)
        ));
    }
}
