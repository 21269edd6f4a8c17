//! The build entry point.

use std::collections::BTreeMap;
use std::path::Path;

use tokio::fs;
use tracing::{debug, info, warn};

use super::cmd::run_build_command;
use super::lock::BuildLock;
use super::store::build_dir_in;
use super::{BuildArtifact, BuildError, BuildInputs, BuildMarker, BuildRequest, ToolInput};
use crate::consts::{BUILD_COMPLETE_MARKER, LOADER_PATH_VAR};
use crate::env::PathSet;
use crate::platform::paths::store_dir;
use crate::resolve::{ResolvedPackage, Resolver};
use crate::util::hash::{ContentHash, Hashable, hash_directory};

/// Source tree entries that never influence a build.
const SOURCE_HASH_EXCLUSIONS: &[&str] = &["target", ".git", "result"];

/// Output entries excluded from the recorded output hash.
const OUTPUT_HASH_EXCLUSIONS: &[&str] = &[BUILD_COMPLETE_MARKER, "tmp"];

const MARKER_VERSION: u32 = 1;

/// Build the default package of `request.source_tree` into the store.
///
/// See [`build_in_store`].
pub async fn build(request: &BuildRequest<'_>, resolver: &dyn Resolver) -> Result<BuildArtifact, BuildError> {
  build_in_store(&store_dir(), request, resolver).await
}

/// Build into an explicit store root.
///
/// Fails with `CompilationFailure` when the source tree lacks the toolchain's
/// manifest or the build command exits non-zero, and with `ResolutionFailure`
/// when a build tool cannot be resolved. Never retries.
///
/// Concurrent calls with identical inputs are serialized on a per-output
/// lock; the later one returns the earlier one's output as a cache hit.
pub async fn build_in_store(
  store: &Path,
  request: &BuildRequest<'_>,
  resolver: &dyn Resolver,
) -> Result<BuildArtifact, BuildError> {
  let manifest_path = request.source_tree.join(&request.toolchain.manifest);
  if !manifest_path.is_file() {
    return Err(BuildError::CompilationFailure {
      code: None,
      message: format!(
        "error: could not find `{}` in `{}`\n",
        request.toolchain.manifest,
        request.source_tree.display()
      ),
    });
  }

  let tools = resolve_build_tools(request, resolver)?;
  let inputs = collect_inputs(request, &tools)?;
  let hash = inputs.compute_hash()?;
  let store_path = build_dir_in(store, &hash);

  info!(name = %request.name, platform = %request.platform, hash = %hash, "building package");

  let _lock = BuildLock::acquire(store, &hash, request.name).await?;

  if store_path.exists() {
    match read_build_marker(&store_path) {
      Ok(Some(marker)) => {
        if let Some(output_hash) = verify_output(&store_path, &marker) {
          debug!(path = ?store_path, "build already in store (cache hit)");
          return Ok(BuildArtifact {
            hash,
            store_path,
            output_hash,
            cached: true,
          });
        }
        debug!(path = ?store_path, "removing corrupted build");
      }
      Ok(None) => debug!(path = ?store_path, "removing incomplete build"),
      Err(e) => debug!(path = ?store_path, error = %e, "removing build with unreadable marker"),
    }
    fs::remove_dir_all(&store_path).await?;
  }

  fs::create_dir_all(&store_path).await?;

  let vars = command_vars(request, &tools)?;
  if let Err(e) = run_build_command(&request.toolchain.command, &vars, request.source_tree, &store_path).await {
    if let Err(cleanup) = fs::remove_dir_all(&store_path).await {
      warn!(path = ?store_path, error = %cleanup, "failed to remove partial build output");
    }
    return Err(e);
  }

  let tmp_dir = store_path.join("tmp");
  if tmp_dir.exists() {
    fs::remove_dir_all(&tmp_dir).await?;
  }

  let output_hash = write_build_marker(&store_path).await?;

  info!(name = %request.name, path = ?store_path, "build complete");

  Ok(BuildArtifact {
    hash,
    store_path,
    output_hash,
    cached: false,
  })
}

fn resolve_build_tools(request: &BuildRequest<'_>, resolver: &dyn Resolver) -> Result<Vec<ResolvedPackage>, BuildError> {
  request
    .toolchain
    .build_tools()
    .map(|tool| resolver.resolve(&tool.name, request.platform).map_err(BuildError::from))
    .collect()
}

fn path_strings(paths: &PathSet) -> Vec<String> {
  paths.iter().map(|p| p.to_string_lossy().into_owned()).collect()
}

fn collect_inputs(request: &BuildRequest<'_>, tools: &[ResolvedPackage]) -> Result<BuildInputs, BuildError> {
  let source_hash = hash_directory(request.source_tree, SOURCE_HASH_EXCLUSIONS)?;

  let (include_paths, link_paths, loader_paths) = match request.environment {
    Some(env) => (
      path_strings(&env.include_paths),
      path_strings(&env.link_paths),
      path_strings(&env.loader_paths),
    ),
    None => (Vec::new(), Vec::new(), Vec::new()),
  };

  Ok(BuildInputs {
    name: request.name.to_string(),
    platform: request.platform,
    source_hash: source_hash.0,
    toolchain: tools
      .iter()
      .map(|t| ToolInput {
        name: t.name.clone(),
        store_path: t.store_path.to_string_lossy().into_owned(),
      })
      .collect(),
    command: request.toolchain.command.clone(),
    env: request.toolchain.env.clone(),
    include_paths,
    link_paths,
    loader_paths,
  })
}

/// Variables layered over the isolated base environment.
fn command_vars(request: &BuildRequest<'_>, tools: &[ResolvedPackage]) -> Result<BTreeMap<String, String>, BuildError> {
  let separator = request.platform.path_list_separator();
  let mut vars = BTreeMap::new();

  let bin_dirs: PathSet = tools
    .iter()
    .map(|t| t.bin_dir.clone().unwrap_or_else(|| t.store_path.join("bin")))
    .collect();
  if !bin_dirs.is_empty() {
    vars.insert("PATH".to_string(), bin_dirs.join(separator)?);
  }

  if let Some(env) = request.environment {
    vars.insert("CPATH".to_string(), env.include_paths.join(separator)?);
    vars.insert("LIBRARY_PATH".to_string(), env.link_paths.join(separator)?);
    vars.insert(LOADER_PATH_VAR.to_string(), env.loader_paths.join(separator)?);
  }

  vars.extend(request.toolchain.env.iter().map(|(k, v)| (k.clone(), v.clone())));
  Ok(vars)
}

/// Read the completion marker, `None` if the build never finished.
pub fn read_build_marker(store_path: &Path) -> Result<Option<BuildMarker>, BuildError> {
  let marker_path = store_path.join(BUILD_COMPLETE_MARKER);
  if !marker_path.exists() {
    return Ok(None);
  }

  let content = std::fs::read_to_string(&marker_path)?;
  let marker = serde_json::from_str(&content).map_err(|e| BuildError::Marker { message: e.to_string() })?;
  Ok(Some(marker))
}

async fn write_build_marker(store_path: &Path) -> Result<ContentHash, BuildError> {
  let output_hash = hash_directory(store_path, OUTPUT_HASH_EXCLUSIONS)?;
  let marker = BuildMarker {
    version: MARKER_VERSION,
    status: "complete".to_string(),
    output_hash: output_hash.0.clone(),
  };
  let content = serde_json::to_string(&marker)?;
  fs::write(store_path.join(BUILD_COMPLETE_MARKER), format!("{}\n", content)).await?;
  Ok(output_hash)
}

/// Returns the output hash if the stored build still matches its marker.
fn verify_output(store_path: &Path, marker: &BuildMarker) -> Option<ContentHash> {
  match hash_directory(store_path, OUTPUT_HASH_EXCLUSIONS) {
    Ok(current) if current.0 == marker.output_hash => Some(current),
    Ok(current) => {
      warn!(
        path = ?store_path,
        expected = %marker.output_hash,
        actual = %current.0,
        "build output corrupted, will rebuild"
      );
      None
    }
    Err(e) => {
      warn!(path = ?store_path, error = %e, "failed to hash build output, will rebuild");
      None
    }
  }
}
