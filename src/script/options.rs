use chrono::Duration;
use std::fmt;
use std::str::FromStr;
use super::time;

/// Partitions accepted by the Ares cluster.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Partition {
    Plgrid,
    PlgridTesting,
    PlgridNow,
    PlgridLong,
    PlgridBigmem,
    PlgridGpuV100,
}

impl Partition {
    /// Get the name of this partition, as known by the scheduler.
    pub fn get_name(&self) -> &'static str {
        match self {
            Partition::Plgrid => "plgrid",
            Partition::PlgridTesting => "plgrid-testing",
            Partition::PlgridNow => "plgrid-now",
            Partition::PlgridLong => "plgrid-long",
            Partition::PlgridBigmem => "plgrid-bigmem",
            Partition::PlgridGpuV100 => "plgrid-gpu-v100",
        }
    }
}

impl FromStr for Partition {
    type Err = OptionError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "plgrid" => Ok(Partition::Plgrid),
            "plgrid-testing" => Ok(Partition::PlgridTesting),
            "plgrid-now" => Ok(Partition::PlgridNow),
            "plgrid-long" => Ok(Partition::PlgridLong),
            "plgrid-bigmem" => Ok(Partition::PlgridBigmem),
            "plgrid-gpu-v100" => Ok(Partition::PlgridGpuV100),
            _ => Err(OptionError::InvalidValue { key: OptionKey::Partition, value: name.to_string() }),
        }
    }
}

/// The recognized job options. Each option has a field name (used by callers) and a wire name
/// (used in `#SBATCH` directives), which may differ.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum OptionKey {
    Partition,
    Time,
    Nodes,
    Ntasks,
    Error,
    Account,
    Output,
    Memory,
    Gpus,
    Input,
    JobName,
    CpusPerTask,
}

/// Field name and wire name of every option.
static NAMES: [(OptionKey, &str, &str); 12] = [
    (OptionKey::Partition, "partition", "partition"),
    (OptionKey::Time, "time", "time"),
    (OptionKey::Nodes, "nodes", "nodes"),
    (OptionKey::Ntasks, "ntasks", "ntasks"),
    (OptionKey::Error, "error", "error"),
    (OptionKey::Account, "account", "account"),
    (OptionKey::Output, "output", "output"),
    (OptionKey::Memory, "memory", "mem"),
    (OptionKey::Gpus, "gpus", "gpus"),
    (OptionKey::Input, "input", "input"),
    (OptionKey::JobName, "job_name", "job-name"),
    (OptionKey::CpusPerTask, "cpus_per_task", "cpus-per-task"),
];

impl OptionKey {
    /// Get the field name of this option (for example `job_name`).
    pub fn get_field_name(&self) -> &'static str {
        self.names().1
    }

    /// Get the name used in `#SBATCH` directives (for example `job-name`).
    pub fn get_wire_name(&self) -> &'static str {
        self.names().2
    }

    fn names(&self) -> &'static (OptionKey, &'static str, &'static str) {
        // The table holds every variant, in declaration order.
        &NAMES[*self as usize]
    }
}

impl FromStr for OptionKey {
    type Err = OptionError;

    /// Find an option by its field name or by its wire name.
    fn from_str(name: &str) -> Result<Self, Self::Err> {
        NAMES
            .iter()
            .find(|(_, field_name, wire_name)| *field_name == name || *wire_name == name)
            .map(|(key, _, _)| *key)
            .ok_or_else(|| OptionError::UnknownKey(name.to_string()))
    }
}

impl fmt::Display for OptionKey {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str(self.get_field_name())
    }
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum OptionError {
    #[error("unknown job option '{0}'")]
    UnknownKey(String),
    #[error("invalid value '{value}' for job option '{key}'")]
    InvalidValue { key: OptionKey, value: String },
    #[error("expected KEY=VALUE, got '{0}'")]
    Malformed(String),
}

/// The value of a job option. Whatever its type, a value is always rendered as a string in the
/// final directive.
#[derive(Clone, Debug, PartialEq)]
pub enum OptionValue {
    Text(String),
    Count(u64),
    Duration(Duration),
    Partition(Partition),
}

impl OptionValue {
    /// Render the value the way the scheduler expects it.
    pub fn render(&self) -> String {
        match self {
            OptionValue::Text(text) => text.clone(),
            OptionValue::Count(count) => count.to_string(),
            OptionValue::Duration(duration) => time::format(duration),
            OptionValue::Partition(partition) => partition.get_name().to_string(),
        }
    }
}

/// A set of job options, in the order given by the caller. Options that are never set are never
/// rendered, there are no default values.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct JobOptions {
    entries: Vec<(OptionKey, OptionValue)>,
}

impl JobOptions {
    /// Create a new empty set of options.
    pub fn new() -> JobOptions {
        JobOptions {
            entries: Vec::new(),
        }
    }

    /// Set the given option. Setting an option twice replaces its value but keeps its original
    /// position.
    pub fn set(&mut self, key: OptionKey, value: OptionValue) -> &mut Self {
        match self.entries.iter_mut().find(|(existing, _)| *existing == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        };

        self
    }

    /// Parse a `KEY=VALUE` pair and set the corresponding option. Counts must be integers, the
    /// time must be a valid Slurm time and the partition must be known.
    pub fn set_from_pair(&mut self, pair: &str) -> Result<&mut Self, OptionError> {
        let (name, raw) = match pair.split_once('=') {
            Some((name, raw)) => (name.trim(), raw.trim()),
            None => return Err(OptionError::Malformed(pair.to_string())),
        };
        let key = name.parse::<OptionKey>()?;
        let invalid = || OptionError::InvalidValue { key, value: raw.to_string() };
        let value = match key {
            OptionKey::Partition => OptionValue::Partition(raw.parse()?),
            OptionKey::Time => OptionValue::Duration(time::parse(raw).map_err(|_| invalid())?),
            OptionKey::Nodes | OptionKey::Ntasks | OptionKey::Gpus => {
                OptionValue::Count(raw.parse().map_err(|_| invalid())?)
            },
            _ => OptionValue::Text(raw.to_string()),
        };

        Ok(self.set(key, value))
    }

    pub fn partition(&mut self, partition: Partition) -> &mut Self {
        self.set(OptionKey::Partition, OptionValue::Partition(partition))
    }

    pub fn time(&mut self, time: Duration) -> &mut Self {
        self.set(OptionKey::Time, OptionValue::Duration(time))
    }

    pub fn nodes(&mut self, nodes: u64) -> &mut Self {
        self.set(OptionKey::Nodes, OptionValue::Count(nodes))
    }

    pub fn ntasks(&mut self, ntasks: u64) -> &mut Self {
        self.set(OptionKey::Ntasks, OptionValue::Count(ntasks))
    }

    pub fn error(&mut self, path: &str) -> &mut Self {
        self.set(OptionKey::Error, OptionValue::Text(path.to_string()))
    }

    pub fn output(&mut self, path: &str) -> &mut Self {
        self.set(OptionKey::Output, OptionValue::Text(path.to_string()))
    }

    pub fn input(&mut self, path: &str) -> &mut Self {
        self.set(OptionKey::Input, OptionValue::Text(path.to_string()))
    }

    pub fn account(&mut self, account: &str) -> &mut Self {
        self.set(OptionKey::Account, OptionValue::Text(account.to_string()))
    }

    /// Set the memory with a unit (for example `"4G"`).
    pub fn memory(&mut self, memory: &str) -> &mut Self {
        self.set(OptionKey::Memory, OptionValue::Text(memory.to_string()))
    }

    /// Set the memory as a plain number of megabytes.
    pub fn memory_megabytes(&mut self, megabytes: u64) -> &mut Self {
        self.set(OptionKey::Memory, OptionValue::Count(megabytes))
    }

    pub fn gpus(&mut self, gpus: u64) -> &mut Self {
        self.set(OptionKey::Gpus, OptionValue::Count(gpus))
    }

    pub fn job_name(&mut self, name: &str) -> &mut Self {
        self.set(OptionKey::JobName, OptionValue::Text(name.to_string()))
    }

    pub fn cpus_per_task(&mut self, cpus: &str) -> &mut Self {
        self.set(OptionKey::CpusPerTask, OptionValue::Text(cpus.to_string()))
    }

    /// Get the value of the given option, if set.
    pub fn get(&self, key: OptionKey) -> Option<&OptionValue> {
        self.entries.iter().find(|(existing, _)| *existing == key).map(|(_, value)| value)
    }

    /// Render one `#SBATCH --<wire-name>="<value>"` directive per option, in insertion order.
    pub fn to_directives(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|(key, value)| format!("#SBATCH --{}=\"{}\"", key.get_wire_name(), value.render()))
            .collect()
    }
}
