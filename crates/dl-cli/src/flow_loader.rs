use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use walkdir::WalkDir;

use crate::{
    map_cli_flows_path, map_cli_flows_read, map_cli_flows_scan, CliError, LoadedFlows,
    FLOW_FILE_SUFFIX,
};

/// `--flows-dir` names either a directory scanned for `*.dialog.json` files
/// or a single flow file.
pub(crate) fn load_flows_from_dir(flows_dir: &str) -> Result<LoadedFlows, CliError> {
    let path = Path::new(flows_dir);
    let root = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map_err(map_cli_flows_path)?
            .join(path)
    };

    let metadata = fs::metadata(&root).map_err(|error| match error.kind() {
        ErrorKind::NotFound => CliError::new(
            "CLI_FLOWS_NOT_FOUND",
            format!("flows-dir does not exist: {}", root.display()),
        ),
        _ => map_cli_flows_path(error),
    })?;

    let flows_json = if metadata.is_dir() {
        read_flows_from_dir(&root)?
    } else if is_flow_file(&root) {
        read_single_flow(&root)?
    } else {
        return Err(CliError::new(
            "CLI_FLOWS_NOT_FLOW",
            format!(
                "flows-dir is neither a directory nor a {} file: {}",
                FLOW_FILE_SUFFIX,
                root.display()
            ),
        ));
    };
    Ok(LoadedFlows { root, flows_json })
}

fn is_flow_file(path: &Path) -> bool {
    path.file_name()
        .is_some_and(|name| name.to_string_lossy().ends_with(FLOW_FILE_SUFFIX))
}

fn read_single_flow(path: &Path) -> Result<BTreeMap<String, String>, CliError> {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default();
    let content = fs::read_to_string(path).map_err(map_cli_flows_read)?;
    Ok(BTreeMap::from([(name, content)]))
}

pub(crate) fn read_flows_from_dir(flows_dir: &Path) -> Result<BTreeMap<String, String>, CliError> {
    let mut flows = BTreeMap::new();

    for entry in WalkDir::new(flows_dir).follow_links(true).sort_by_file_name() {
        let entry = entry.map_err(map_cli_flows_scan)?;
        if !entry.file_type().is_file() || !is_flow_file(entry.path()) {
            continue;
        }

        let key = entry
            .path()
            .strip_prefix(flows_dir)
            .map_err(map_cli_flows_scan)?
            .to_string_lossy()
            .replace('\\', "/");
        let content = fs::read_to_string(entry.path()).map_err(map_cli_flows_read)?;
        flows.insert(key, content);
    }

    if flows.is_empty() {
        return Err(CliError::new(
            "CLI_FLOWS_EMPTY",
            format!("No {} files under {}", FLOW_FILE_SUFFIX, flows_dir.display()),
        ));
    }

    Ok(flows)
}
