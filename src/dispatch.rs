//! Command dispatcher: parse, resolve, invoke, report
//!
//! A command string is either `name` or `namespace:action`. A bare name
//! that is a known namespace runs that namespace's default action; any
//! other bare name is an action on the default namespace.
//!
//! Every classified failure ends up as exactly one line on the output.
//! Failures outside the taxonomy are handed back to the caller.

use std::collections::BTreeSet;
use std::io::{self, Write};
use std::sync::{Arc, OnceLock};

use tracing::{debug, info, instrument};

use crate::cli::output;
use crate::config::Settings;
use crate::error::{CommandError, CommandResult};
use crate::namespace::NamespaceSource;

/// A resolved command string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRoute {
    pub namespace: String,
    pub action: String,
}

impl CommandRoute {
    pub fn new(namespace: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            action: action.into(),
        }
    }
}

pub struct Dispatcher {
    source: Arc<dyn NamespaceSource>,
    settings: Settings,
    namespaces: OnceLock<BTreeSet<String>>,
}

impl Dispatcher {
    pub fn new(source: Arc<dyn NamespaceSource>, settings: Settings) -> Self {
        Self {
            source,
            settings,
            namespaces: OnceLock::new(),
        }
    }

    /// Known namespace identifiers, listed from the source on first use only.
    pub fn namespaces(&self) -> &BTreeSet<String> {
        self.namespaces.get_or_init(|| {
            let found: BTreeSet<String> = self.source.list().into_iter().collect();
            debug!("discovered namespaces: {:?}", found);
            found
        })
    }

    fn is_namespace(&self, name: &str) -> bool {
        self.namespaces().contains(name)
    }

    /// Run a command, reporting classified failures on stdout.
    pub fn run(&self, command: &str, args: &[String]) -> CommandResult<()> {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        self.run_with(command, args, &mut out)
    }

    /// Run a command, reporting classified failures on `out`.
    ///
    /// Returns `Ok` whenever the failure was reported; only errors without
    /// a display message are returned.
    #[instrument(skip(self, out))]
    pub fn run_with(
        &self,
        command: &str,
        args: &[String],
        out: &mut impl Write,
    ) -> CommandResult<()> {
        let err = match self.parse_and_invoke(command, args) {
            Ok(()) => return Ok(()),
            Err(e) => e,
        };
        match err.display_message() {
            Some(msg) => {
                info!("command {:?} failed: {:?}", command, err);
                output::line(out, &msg).map_err(CommandError::Output)
            }
            None => Err(err),
        }
    }

    /// Resolve `command`, build its handler from `args` and run the action.
    #[instrument(skip(self))]
    pub fn parse_and_invoke(&self, command: &str, args: &[String]) -> CommandResult<()> {
        let route = self.parse(command)?;

        let factory = self.source.load(&route.namespace).ok_or_else(|| {
            debug!("no definition for namespace {:?}", route.namespace);
            CommandError::InvalidCommand
        })?;
        let mut handler = factory(args.to_vec());

        if !handler.responds_to(&route.action) {
            debug!(
                "namespace {:?} has no action {:?}",
                route.namespace, route.action
            );
            return Err(CommandError::InvalidCommand);
        }

        info!("invoking {}:{}", route.namespace, route.action);
        handler.invoke(&route.action)
    }

    /// Split a command string into namespace and action.
    pub fn parse(&self, command: &str) -> CommandResult<CommandRoute> {
        let mut parts: Vec<&str> = command.split(':').collect();
        while parts.last() == Some(&"") {
            parts.pop();
        }

        let route = match parts.as_slice() {
            [_] if self.is_namespace(command) => {
                CommandRoute::new(command, &self.settings.default_action)
            }
            [_] => CommandRoute::new(&self.settings.default_namespace, command),
            [namespace, action] => {
                if !self.is_namespace(namespace) {
                    return Err(CommandError::InvalidCommand);
                }
                CommandRoute::new(*namespace, *action)
            }
            _ => return Err(CommandError::InvalidCommand),
        };
        debug!("parsed {:?} -> {:?}", command, route);
        Ok(route)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::namespace::{Handler, NamespaceRegistry};

    struct Plain;

    impl Handler for Plain {
        fn actions(&self) -> &'static [&'static str] {
            &["index"]
        }

        fn invoke(&mut self, _action: &str) -> CommandResult<()> {
            Ok(())
        }
    }

    fn plain(_args: Vec<String>) -> Box<dyn Handler> {
        Box::new(Plain)
    }

    fn dispatcher() -> Dispatcher {
        let registry = NamespaceRegistry::new()
            .register("app", plain)
            .register("config", plain);
        Dispatcher::new(Arc::new(registry), Settings::default())
    }

    #[test]
    fn given_trailing_colon_when_parsing_then_treated_as_single_part() {
        let d = dispatcher();
        assert_eq!(
            d.parse("config:").unwrap(),
            CommandRoute::new("app", "config:")
        );
    }

    #[test]
    fn given_only_colons_when_parsing_then_invalid() {
        let d = dispatcher();
        assert!(matches!(d.parse(""), Err(CommandError::InvalidCommand)));
        assert!(matches!(d.parse(":"), Err(CommandError::InvalidCommand)));
        assert!(matches!(d.parse("::"), Err(CommandError::InvalidCommand)));
    }

    #[test]
    fn given_custom_defaults_when_parsing_then_uses_settings() {
        let registry = NamespaceRegistry::new().register("apps", plain);
        let settings = Settings {
            default_namespace: "apps".into(),
            default_action: "list".into(),
        };
        let d = Dispatcher::new(Arc::new(registry), settings);
        assert_eq!(d.parse("apps").unwrap(), CommandRoute::new("apps", "list"));
        assert_eq!(d.parse("info").unwrap(), CommandRoute::new("apps", "info"));
    }

    #[test]
    fn given_trailing_colon_on_namespace_when_running_then_unknown_action() {
        let d = dispatcher();
        let mut out = Vec::new();
        d.run_with("app:", &[], &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            format!("{}\n", crate::error::INVALID_COMMAND_MESSAGE)
        );
    }
}
