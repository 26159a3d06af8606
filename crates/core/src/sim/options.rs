//! Option Registry.
//!
//! This module declares the options an instance recognizes and the handlers that apply
//! them. It provides:
//! 1. **Table:** Common options plus those the coordination capability contributes.
//! 2. **Argument grammar:** `--name=value`, `--name value`, `-e<value>`, `--`, and the
//!    program path with its arguments.
//! 3. **Live commands:** The same handlers run from `SimulatorInstance::do_command`.
//!
//! A handler failure is fatal to bootstrap; there is no partially applied option set.

use std::fmt;
use std::path::PathBuf;

use tracing::{debug, info};

use crate::common::num::parse_unsigned;
use crate::common::{SimError, SimResult};
use crate::core::CoreHandle;
use crate::mesh::CoreId;

use super::coordination::{Coordination, Meshed};
use super::instance::SimulatorInstance;

/// Where an option invocation came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionSource {
    /// Parsed from the startup argument vector.
    Startup,
    /// Issued as a live command on an open instance.
    Command,
}

/// Whether an option takes an argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgKind {
    /// Only `--name=value` or `-xvalue` supply one.
    Optional,
    /// Taken from `=value` or from the next word.
    Required,
}

/// Option effect function.
///
/// Receives the instance, an optional per-core target, the raw argument, and the
/// invocation source.
pub type OptionHandler<M> = fn(
    &mut SimulatorInstance<M>,
    Option<CoreHandle>,
    Option<&str>,
    OptionSource,
) -> SimResult<()>;

/// A registered option.
pub struct SimOption<M: Coordination> {
    /// Long name, without leading dashes.
    pub name: &'static str,
    /// Single-character short form.
    pub short: Option<char>,
    /// Argument requirement.
    pub arg: ArgKind,
    /// Placeholder shown in usage text.
    pub arg_name: &'static str,
    /// One-line description.
    pub doc: &'static str,
    /// Effect function.
    pub handler: OptionHandler<M>,
}

impl<M: Coordination> Clone for SimOption<M> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<M: Coordination> Copy for SimOption<M> {}

impl<M: Coordination> fmt::Debug for SimOption<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimOption")
            .field("name", &self.name)
            .field("short", &self.short)
            .field("arg", &self.arg)
            .finish_non_exhaustive()
    }
}

/// Program path and arguments left after option parsing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Invocation {
    /// Program image to analyze, if one was named.
    pub program: Option<PathBuf>,
    /// Arguments passed through to the program.
    pub args: Vec<String>,
}

/// Options recognized by instances of capability `M`.
pub fn table<M: Coordination>() -> Vec<SimOption<M>> {
    let mut options = vec![
        SimOption {
            name: "external-memory",
            short: Some('e'),
            arg: ArgKind::Optional,
            arg_name: "off|on",
            doc: "Turn off/on the external memory region",
            handler: set_external_memory::<M>,
        },
        SimOption {
            name: "memory-region",
            short: None,
            arg: ArgKind::Required,
            arg_name: "ADDR,SIZE",
            doc: "Add a memory region before defaults are provisioned",
            handler: add_memory_region::<M>,
        },
    ];
    options.extend(M::extra_options());
    options
}

/// The `coreid` option of mesh instances.
pub(crate) fn coreid_option() -> SimOption<Meshed> {
    SimOption {
        name: "coreid",
        short: None,
        arg: ArgKind::Required,
        arg_name: "COREID",
        doc: "Set coreid to COREID, valid range is [1-4095] ([0x001-0xFFF])",
        handler: set_coreid,
    }
}

fn lookup_long<M: Coordination>(options: &[SimOption<M>], name: &str) -> SimResult<SimOption<M>> {
    options
        .iter()
        .find(|o| o.name == name)
        .copied()
        .ok_or_else(|| SimError::UnknownOption(name.to_owned()))
}

fn lookup_short<M: Coordination>(options: &[SimOption<M>], short: char) -> SimResult<SimOption<M>> {
    options
        .iter()
        .find(|o| o.short == Some(short))
        .copied()
        .ok_or_else(|| SimError::UnknownOption(format!("-{short}")))
}

/// Applies every option in `argv` to `sim` and returns the program invocation.
///
/// `argv` excludes the simulator's own name.
pub fn parse_args<M, S>(sim: &mut SimulatorInstance<M>, argv: &[S]) -> SimResult<Invocation>
where
    M: Coordination,
    S: AsRef<str>,
{
    let options = table::<M>();
    let mut words = argv.iter().map(S::as_ref);
    let mut rest: Vec<&str> = Vec::new();

    while let Some(word) = words.next() {
        if word == "--" {
            rest.extend(words.by_ref());
            break;
        }

        if let Some(long) = word.strip_prefix("--") {
            let (name, inline) = match long.split_once('=') {
                Some((name, value)) => (name, Some(value)),
                None => (long, None),
            };
            let option = lookup_long(&options, name)?;
            let value = match (inline, option.arg) {
                (Some(v), _) => Some(v),
                (None, ArgKind::Required) => {
                    Some(words.next().ok_or(SimError::MissingArgument(option.name))?)
                }
                (None, ArgKind::Optional) => None,
            };
            (option.handler)(sim, None, value, OptionSource::Startup)?;
            continue;
        }

        if let Some(short) = word.strip_prefix('-').filter(|s| !s.is_empty()) {
            let mut chars = short.chars();
            let letter = chars.next().ok_or_else(|| SimError::UnknownOption(word.to_owned()))?;
            let option = lookup_short(&options, letter)?;
            let attached = chars.as_str();
            let value = match (attached.is_empty(), option.arg) {
                (false, _) => Some(attached),
                (true, ArgKind::Required) => {
                    Some(words.next().ok_or(SimError::MissingArgument(option.name))?)
                }
                (true, ArgKind::Optional) => None,
            };
            (option.handler)(sim, None, value, OptionSource::Startup)?;
            continue;
        }

        rest.push(word);
        rest.extend(words.by_ref());
        break;
    }

    let mut rest = rest.into_iter();
    Ok(Invocation {
        program: rest.next().map(PathBuf::from),
        args: rest.map(str::to_owned).collect(),
    })
}

/// Runs `command` (`"<option> [argument]"`) against an open instance.
pub fn run_command<M: Coordination>(sim: &mut SimulatorInstance<M>, command: &str) -> SimResult<()> {
    let command = command.trim();
    let (name, arg) = match command.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, Some(arg.trim()).filter(|a| !a.is_empty())),
        None => (command, None),
    };
    let option = lookup_long(&table::<M>(), name)?;
    if arg.is_none() && option.arg == ArgKind::Required {
        return Err(SimError::MissingArgument(option.name));
    }
    debug!(option = option.name, ?arg, "live command");
    (option.handler)(sim, None, arg, OptionSource::Command)
}

/// Usage text for instances of capability `M`.
pub fn usage<M: Coordination>() -> String {
    let mut text = String::new();
    for option in table::<M>() {
        let mut form = match option.arg {
            ArgKind::Optional => format!("--{}[={}]", option.name, option.arg_name),
            ArgKind::Required => format!("--{} {}", option.name, option.arg_name),
        };
        if let Some(short) = option.short {
            form.push_str(&format!(", -{short}"));
        }
        text.push_str(&format!("  {form:<32} {}\n", option.doc));
    }
    text
}

fn set_external_memory<M: Coordination>(
    sim: &mut SimulatorInstance<M>,
    _cpu: Option<CoreHandle>,
    arg: Option<&str>,
    _source: OptionSource,
) -> SimResult<()> {
    match arg {
        Some("off") => sim.config_mut().memory.external_memory = false,
        Some("on") => sim.config_mut().memory.external_memory = true,
        other => debug!(arg = ?other, "external-memory argument ignored"),
    }
    Ok(())
}

fn add_memory_region<M: Coordination>(
    sim: &mut SimulatorInstance<M>,
    _cpu: Option<CoreHandle>,
    arg: Option<&str>,
    _source: OptionSource,
) -> SimResult<()> {
    const RANGE: &str = "expected ADDR,SIZE with a non-zero size";
    let text = arg.ok_or(SimError::MissingArgument("memory-region"))?;
    let invalid = || SimError::InvalidArgument {
        option: "memory-region",
        value: text.to_owned(),
        reason: RANGE,
    };
    let (base, len) = text.split_once(',').ok_or_else(invalid)?;
    let base = parse_unsigned(base.trim()).ok_or_else(invalid)?;
    let len = parse_unsigned(len.trim())
        .filter(|len| *len != 0)
        .ok_or_else(invalid)?;
    sim.memory_mut().attach_region(base, len)?;
    info!("user memory region {base:#x},{len:#x}");
    Ok(())
}

fn set_coreid(
    sim: &mut SimulatorInstance<Meshed>,
    _cpu: Option<CoreHandle>,
    arg: Option<&str>,
    source: OptionSource,
) -> SimResult<()> {
    let text = arg.ok_or(SimError::MissingArgument("coreid"))?;
    let coreid = CoreId::parse(text).map_err(|reason| SimError::InvalidArgument {
        option: "coreid",
        value: text.to_owned(),
        reason,
    })?;

    let mesh = sim.coordination_mut().coordinator_mut();
    if !mesh.is_member(coreid) {
        return Err(SimError::NotInTopology {
            coreid: coreid.get(),
        });
    }
    if mesh.coreid() == Some(coreid) {
        return Ok(());
    }
    mesh.reserve(coreid)?;

    sim.relocate_core()
        .map_err(|e| SimError::RelocationFailed(Box::new(e)))?;
    debug!(%coreid, ?source, "coreid applied");
    Ok(())
}
