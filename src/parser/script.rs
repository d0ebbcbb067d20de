//! Dynamic script sources.
//!
//! A dynamic source is an executable invoked with `--list` that emits a
//! JSON object on stdout: `_meta.hostvars` maps host names to variable
//! mappings, and every other top-level key is a group holding
//! `{hosts: [names], vars: {...}, children: [names]}`. The groups `all`
//! and `ungrouped` are recognized conventions — `all` contributes the
//! inventory defaults, `ungrouped` is an ordinary group.
//!
//! Fetching is a side effect and lives behind [`DynamicFetch`], so the
//! resolver core stays a pure function over already-fetched data and unit
//! tests never execute a process.

use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::Receiver;

use crate::error::{InventoryError, InventoryResult, StructuralError};
use crate::parser::{parse_tree, IntermediateInventory, ROOT_GROUP};
use crate::value::{Value, Vars};

/// Default bound on how long a script may run.
pub const DEFAULT_SCRIPT_TIMEOUT: Duration = Duration::from_secs(30);

/// How often the fetcher polls a running child for exit.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Grace period for the reader threads to hand over buffered output after
/// the child exits.
const OUTPUT_GRACE: Duration = Duration::from_secs(5);

/// Fetches raw dynamic-inventory JSON for a script path.
pub trait DynamicFetch {
    /// Produces the raw JSON the script emitted for a "list" request.
    ///
    /// # Errors
    ///
    /// Returns a structural error when the script cannot be invoked, exits
    /// non-zero, times out, or emits something other than JSON.
    fn fetch(&self, path: &Path) -> InventoryResult<serde_json::Value>;
}

/// Parses the dynamic-inventory protocol into an intermediate
/// representation.
///
/// # Errors
///
/// Returns a structural error for protocol violations, and the
/// no-valid-inventory error if the output declares zero hosts and zero
/// groups.
pub fn parse_script_output(
    source: &str,
    raw: &serde_json::Value,
) -> InventoryResult<IntermediateInventory> {
    let document = normalize(source, raw)?;
    let ir = parse_tree(source, &document)?;
    if ir.is_empty() {
        return Err(InventoryError::no_valid_inventory(vec![source.to_string()]));
    }
    tracing::debug!(
        source,
        hosts = ir.hosts.len(),
        groups = ir.groups.len(),
        "parsed dynamic inventory source"
    );
    Ok(ir)
}

fn invalid_shape(source: &str, reason: impl Into<String>) -> InventoryError {
    StructuralError::InvalidShape {
        source: source.to_string(),
        reason: reason.into(),
    }
    .into()
}

/// Rewrites the flat script protocol into the nested group-tree shape the
/// shared walk understands: group vars and host lists become group bodies,
/// `children` name lists become nested entries carrying the parent link,
/// and `all`'s vars become the root vars.
fn normalize(source: &str, raw: &serde_json::Value) -> InventoryResult<Value> {
    let Some(top) = raw.as_object() else {
        return Err(invalid_shape(
            source,
            format!("dynamic inventory output must be a JSON object, got {raw}"),
        ));
    };

    let hostvars = match top.get("_meta") {
        None => serde_json::Map::new(),
        Some(meta) => {
            let meta = meta
                .as_object()
                .ok_or_else(|| invalid_shape(source, "'_meta' must be an object"))?;
            match meta.get("hostvars") {
                None => serde_json::Map::new(),
                Some(hv) => hv
                    .as_object()
                    .ok_or_else(|| invalid_shape(source, "'_meta.hostvars' must be an object"))?
                    .clone(),
            }
        }
    };

    let mut root_body = Vars::new();
    let mut children = Vars::new();

    for (name, entry) in top {
        if name == "_meta" {
            continue;
        }
        let entry = match entry {
            serde_json::Value::Null => continue,
            serde_json::Value::Object(obj) => obj,
            other => {
                return Err(invalid_shape(
                    source,
                    format!("group '{name}' entry must be an object, got {other}"),
                ))
            }
        };

        let vars = read_group_vars(source, name, entry)?;
        let hosts = read_group_hosts(source, name, entry, &hostvars)?;
        let child_links = read_group_children(source, name, entry)?;

        if name == ROOT_GROUP {
            if let Some(vars) = vars {
                root_body.insert("vars".to_string(), Value::Mapping(vars));
            }
            if let Some(hosts) = hosts {
                root_body.insert("hosts".to_string(), Value::Mapping(hosts));
            }
            // Top-level groups; a name with no entry of its own still exists.
            for child in child_links.unwrap_or_default() {
                children.entry(child).or_insert(Value::Null);
            }
            continue;
        }

        let mut body = Vars::new();
        if let Some(vars) = vars {
            body.insert("vars".to_string(), Value::Mapping(vars));
        }
        if let Some(hosts) = hosts {
            body.insert("hosts".to_string(), Value::Mapping(hosts));
        }
        if let Some(links) = child_links {
            let nested: Vars = links.into_iter().map(|c| (c, Value::Null)).collect();
            body.insert("children".to_string(), Value::Mapping(nested));
        }

        let slot = children.entry(name.clone()).or_insert(Value::Null);
        if !body.is_empty() {
            *slot = Value::Mapping(body);
        }
    }

    if !children.is_empty() {
        root_body.insert("children".to_string(), Value::Mapping(children));
    }

    let mut document = Vars::new();
    document.insert(ROOT_GROUP.to_string(), Value::Mapping(root_body));
    Ok(Value::Mapping(document))
}

fn read_group_vars(
    source: &str,
    group: &str,
    entry: &serde_json::Map<String, serde_json::Value>,
) -> InventoryResult<Option<Vars>> {
    match entry.get("vars") {
        None => Ok(None),
        Some(serde_json::Value::Object(obj)) => Ok(Some(
            obj.iter()
                .map(|(k, v)| (k.clone(), Value::from(v.clone())))
                .collect(),
        )),
        Some(other) => Err(invalid_shape(
            source,
            format!("group '{group}' vars must be an object, got {other}"),
        )),
    }
}

fn read_group_hosts(
    source: &str,
    group: &str,
    entry: &serde_json::Map<String, serde_json::Value>,
    hostvars: &serde_json::Map<String, serde_json::Value>,
) -> InventoryResult<Option<Vars>> {
    let Some(hosts) = entry.get("hosts") else {
        return Ok(None);
    };
    let Some(hosts) = hosts.as_array() else {
        return Err(invalid_shape(
            source,
            format!("group '{group}' hosts must be a list of names"),
        ));
    };

    let mut mapping = Vars::new();
    for item in hosts {
        let Some(name) = item.as_str() else {
            return Err(invalid_shape(
                source,
                format!("group '{group}' hosts must be strings, got {item}"),
            ));
        };
        let vars = match hostvars.get(name) {
            None => Value::Null,
            Some(serde_json::Value::Object(obj)) => {
                Value::from(serde_json::Value::Object(obj.clone()))
            }
            Some(other) => {
                return Err(invalid_shape(
                    source,
                    format!("hostvars entry for '{name}' must be an object, got {other}"),
                ))
            }
        };
        mapping.insert(name.to_string(), vars);
    }
    Ok(Some(mapping))
}

fn read_group_children(
    source: &str,
    group: &str,
    entry: &serde_json::Map<String, serde_json::Value>,
) -> InventoryResult<Option<Vec<String>>> {
    let Some(children) = entry.get("children") else {
        return Ok(None);
    };
    let Some(children) = children.as_array() else {
        return Err(invalid_shape(
            source,
            format!("group '{group}' children must be a list of names"),
        ));
    };
    children
        .iter()
        .map(|c| {
            c.as_str().map(ToString::to_string).ok_or_else(|| {
                invalid_shape(
                    source,
                    format!("group '{group}' children must be strings, got {c}"),
                )
            })
        })
        .collect::<InventoryResult<Vec<_>>>()
        .map(Some)
}

/// Runs dynamic-inventory executables with a bounded timeout.
#[derive(Debug, Clone, Copy)]
pub struct CommandFetcher {
    timeout: Duration,
}

impl CommandFetcher {
    /// Creates a fetcher with the default timeout.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            timeout: DEFAULT_SCRIPT_TIMEOUT,
        }
    }

    /// Creates a fetcher with a custom timeout.
    #[must_use]
    pub const fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for CommandFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl DynamicFetch for CommandFetcher {
    fn fetch(&self, path: &Path) -> InventoryResult<serde_json::Value> {
        let source = path.display().to_string();
        verify_script(&source, path)?;
        tracing::debug!(script = %source, "invoking dynamic inventory script");

        let mut child = Command::new(path)
            .arg("--list")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| StructuralError::ScriptLaunch {
                source: source.clone(),
                reason: e.to_string(),
            })?;

        // Drain both pipes off-thread so a chatty script cannot fill a pipe
        // and deadlock against the exit poll.
        let stdout_rx = drain(child.stdout.take());
        let stderr_rx = drain(child.stderr.take());

        let deadline = Instant::now() + self.timeout;
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) => {
                    if Instant::now() >= deadline {
                        let _ = child.kill();
                        let _ = child.wait();
                        return Err(StructuralError::ScriptTimeout {
                            source,
                            timeout_ms: u64::try_from(self.timeout.as_millis())
                                .unwrap_or(u64::MAX),
                        }
                        .into());
                    }
                    thread::sleep(POLL_INTERVAL);
                }
                Err(e) => {
                    return Err(StructuralError::ScriptLaunch {
                        source,
                        reason: e.to_string(),
                    }
                    .into())
                }
            }
        };

        if !status.success() {
            let stderr = String::from_utf8_lossy(&recv_output(&stderr_rx))
                .trim()
                .to_string();
            return Err(StructuralError::ScriptExit {
                source,
                code: status.code(),
                stderr,
            }
            .into());
        }

        let stdout = recv_output(&stdout_rx);
        serde_json::from_slice(&stdout).map_err(|e| {
            StructuralError::MalformedJson {
                source,
                reason: e.to_string(),
            }
            .into()
        })
    }
}

/// Preflight: the script must carry an executable bit or a shebang.
fn verify_script(source: &str, path: &Path) -> InventoryResult<()> {
    if !path.exists() {
        return Err(StructuralError::ScriptLaunch {
            source: source.to_string(),
            reason: "no such file".to_string(),
        }
        .into());
    }

    let mut prefix = [0u8; 2];
    let has_shebang = std::fs::File::open(path)
        .and_then(|mut f| f.read_exact(&mut prefix))
        .map(|()| &prefix == b"#!")
        .unwrap_or(false);

    #[cfg(unix)]
    let executable = {
        use std::os::unix::fs::PermissionsExt;
        std::fs::metadata(path)
            .map(|m| m.permissions().mode() & 0o111 != 0)
            .unwrap_or(false)
    };
    #[cfg(not(unix))]
    let executable = true;

    if !executable && !has_shebang {
        return Err(StructuralError::ScriptLaunch {
            source: source.to_string(),
            reason: "script is not executable and has no shebang".to_string(),
        }
        .into());
    }
    Ok(())
}

fn drain(stream: Option<impl Read + Send + 'static>) -> Receiver<Vec<u8>> {
    let (tx, rx) = crossbeam_channel::bounded(1);
    if let Some(mut stream) = stream {
        thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = stream.read_to_end(&mut buf);
            let _ = tx.send(buf);
        });
    }
    rx
}

fn recv_output(rx: &Receiver<Vec<u8>>) -> Vec<u8> {
    rx.recv_timeout(OUTPUT_GRACE).unwrap_or_default()
}
